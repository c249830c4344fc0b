//! Transfer Aggregate
//!
//! A transfer request and its lifecycle status. The status is a one-way
//! state machine: CREATED moves exactly once to one of four terminal states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{AccountId, Amount, TransferRequestId};

use super::Aggregate;

/// Transfer lifecycle status
///
/// ```text
/// CREATED --debit ok, credit ok--------> COMPLETED
/// CREATED --debit: insufficient funds--> INSUFFICIENT_FUNDS
/// CREATED --debit: any other failure---> FAILED_TO_DEBIT_SOURCE
/// CREATED --debit ok, credit fails-----> FAILED_TO_CREDIT_BENEFICIARY (+ compensation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Created,
    Completed,
    InsufficientFunds,
    FailedToDebitSource,
    FailedToCreditBeneficiary,
}

impl TransferStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Created)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Created => "CREATED",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferStatus::FailedToDebitSource => "FAILED_TO_DEBIT_SOURCE",
            TransferStatus::FailedToCreditBeneficiary => "FAILED_TO_CREDIT_BENEFICIARY",
        }
    }
}

impl Default for TransferStatus {
    fn default() -> Self {
        Self::Created
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot move transfer {id} from {from} to {to}")]
pub struct TransitionError {
    pub id: TransferRequestId,
    pub from: TransferStatus,
    pub to: TransferStatus,
}

/// Transfer Aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    id: TransferRequestId,
    source: AccountId,
    beneficiary: AccountId,
    amount: Amount,
    status: TransferStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransferRecord {
    /// Create a new record in CREATED state
    pub fn new(
        id: TransferRequestId,
        source: AccountId,
        beneficiary: AccountId,
        amount: Amount,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            source,
            beneficiary,
            amount,
            status: TransferStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a terminal status. Only valid from CREATED.
    pub fn transition_to(&mut self, next: TransferStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() || !next.is_terminal() {
            return Err(TransitionError {
                id: self.id,
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.transition_to(TransferStatus::Completed)
    }

    pub fn fail_due_to_insufficient_funds(&mut self) -> Result<(), TransitionError> {
        self.transition_to(TransferStatus::InsufficientFunds)
    }

    pub fn fail_while_debiting_source(&mut self) -> Result<(), TransitionError> {
        self.transition_to(TransferStatus::FailedToDebitSource)
    }

    pub fn fail_while_crediting_beneficiary(&mut self) -> Result<(), TransitionError> {
        self.transition_to(TransferStatus::FailedToCreditBeneficiary)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn source(&self) -> AccountId {
        self.source
    }

    pub fn beneficiary(&self) -> AccountId {
        self.beneficiary
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Aggregate for TransferRecord {
    type Id = TransferRequestId;

    fn aggregate_type() -> &'static str {
        "Transfer"
    }

    fn id(&self) -> TransferRequestId {
        self.id
    }
}
