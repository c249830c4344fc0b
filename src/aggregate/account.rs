//! Account Aggregate
//!
//! Mutable balance holder. Debit and credit operate on a detached copy
//! read from the ledger; nothing is visible to other callers until the copy
//! is committed back through `AccountLedger::save`.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, Amount, DomainError};

use super::Aggregate;

/// Account Aggregate
///
/// # Invariants
/// - `balance >= 0` after every committed operation
/// - `version` advances by exactly one per committed change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,

    balance: Amount,

    /// Optimistic-concurrency token, owned by the ledger
    version: u64,

    /// Set by debit/credit, cleared on commit
    #[serde(skip)]
    modified: bool,
}

impl Account {
    /// Create a fresh account at version 0
    pub fn new(id: AccountId, initial_balance: Amount) -> Self {
        Self {
            id,
            balance: initial_balance,
            version: 0,
            modified: false,
        }
    }

    /// Credit (deposit) money to the account.
    ///
    /// The amount is assumed to be validated upstream.
    pub fn credit(&mut self, amount: &Amount) {
        self.balance = self.balance.add(amount);
        self.modified = true;
    }

    /// Debit (withdraw) money from the account.
    ///
    /// Rejected without touching the balance when funds are insufficient.
    pub fn debit(&mut self, amount: &Amount) -> Result<(), DomainError> {
        if self.balance.is_less_than(amount) {
            return Err(DomainError::insufficient_funds(amount));
        }

        self.balance = self.balance.subtract(amount);
        self.modified = true;
        Ok(())
    }

    pub fn balance(&self) -> &Amount {
        &self.balance
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// True when a debit or credit happened since this copy was read
    pub fn has_pending_change(&self) -> bool {
        self.modified
    }

    /// Stored form of this account after a successful commit
    pub(crate) fn committed(&self, version: u64) -> Self {
        Self {
            version,
            modified: false,
            ..self.clone()
        }
    }
}

impl Aggregate for Account {
    type Id = AccountId;

    fn aggregate_type() -> &'static str {
        "Account"
    }

    fn id(&self) -> AccountId {
        self.id
    }
}
