//! Ledger module
//!
//! In-memory stores for accounts and transfer records. All access to the
//! underlying tables goes through a readers-writer lock; accounts are
//! additionally protected by an optimistic version check on save.

mod account_ledger;
mod error;
mod transfer_ledger;

pub use account_ledger::AccountLedger;
pub use error::{ConcurrentModification, LedgerError};
pub use transfer_ledger::TransferLedger;
