//! Aggregate module
//!
//! Entities owned by the ledgers. Callers only ever hold detached copies.

pub mod account;
pub mod transfer;

pub use account::Account;
pub use transfer::{TransferRecord, TransferStatus, TransitionError};

/// Aggregate trait that all ledger-owned entities implement
pub trait Aggregate: Clone {
    /// Identity type used as the ledger key
    type Id: Copy + Eq + std::hash::Hash + std::fmt::Display;

    /// Get the aggregate type name (for logging)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID
    fn id(&self) -> Self::Id;
}
