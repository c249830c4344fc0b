//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::{AccountId, Amount, TransferRequestId};

/// Domain-specific errors
///
/// These errors represent business rule violations surfaced by the account
/// and transfer services. Optimistic-concurrency conflicts are deliberately
/// absent: they are resolved inside `AccountService` and never reach callers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Referenced account does not exist
    #[error("Invalid account: {0}")]
    InvalidAccount(AccountId),

    /// Debit exceeds the available balance
    #[error("Insufficient funds to debit {amount}")]
    InsufficientFunds { amount: Decimal },

    /// Transfer amount is negative
    #[error("Invalid transfer amount: {0}")]
    InvalidTransferAmount(Amount),

    /// Unknown transfer request
    #[error("Invalid transfer request: {0}")]
    InvalidTransferRequest(TransferRequestId),

    /// Account id already taken (fixed-id creation only)
    #[error("Account already exists: {0}")]
    DuplicateAccount(AccountId),

    /// Optimistic-concurrency retry ceiling reached
    #[error("Gave up updating account {account_id} after {attempts} conflicting attempts")]
    RetriesExhausted { account_id: AccountId, attempts: u32 },
}

impl DomainError {
    pub fn insufficient_funds(amount: &Amount) -> Self {
        Self::InsufficientFunds {
            amount: amount.value(),
        }
    }
}
