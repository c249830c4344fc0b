//! Domain module
//!
//! Core domain types and business errors.

pub mod amount;
pub mod error;
pub mod events;
pub mod ids;

pub use amount::{Amount, AmountError};
pub use error::DomainError;
pub use events::TransferEvent;
pub use ids::{AccountId, TransferRequestId};
