//! Services module
//!
//! Orchestration over the ledgers: account mutations with conflict retry,
//! transfer creation, and the transfer execution saga.

mod account_service;
mod commands;
mod transfer_creation;
mod transfer_execution;


pub use account_service::{AccountLocks, AccountOperations, AccountService, RetryPolicy};
pub use commands::*;
pub use transfer_creation::TransferCreationService;
pub use transfer_execution::{ExecutionOutcome, TransferExecutionService};
