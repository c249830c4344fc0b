//! Ledger Errors

use crate::aggregate::TransferStatus;
use crate::domain::{AccountId, TransferRequestId};

/// Optimistic concurrency conflict on an account save.
///
/// Only `AccountService` handles this: it re-reads and retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Concurrent modification of account {account_id}: saved from version {expected}, ledger holds {found}")]
pub struct ConcurrentModification {
    pub account_id: AccountId,
    pub expected: u64,
    pub found: u64,
}

/// Errors that can occur in the ledgers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Insert of an id that is already present
    #[error("Account already exists: {0}")]
    DuplicateAccount(AccountId),

    /// Attempt to overwrite a transfer that already reached a terminal status
    #[error("Transfer {id} is already final ({status})")]
    TransferAlreadyFinal {
        id: TransferRequestId,
        status: TransferStatus,
    },
}
