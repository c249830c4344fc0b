//! Command definitions
//!
//! Commands represent intentions to change the system state.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, Amount};

// =========================================================================
// CreateAccountCommand
// =========================================================================

/// Command to open a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    /// Fixed identity; a random one is allocated when absent
    pub account_id: Option<AccountId>,
    pub initial_amount: Amount,
}

impl CreateAccountCommand {
    pub fn new(initial_amount: Amount) -> Self {
        Self {
            account_id: None,
            initial_amount,
        }
    }

    pub fn with_account_id(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

// =========================================================================
// TransferCommand
// =========================================================================

/// Command to move money between two accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCommand {
    pub source: AccountId,
    pub beneficiary: AccountId,
    pub amount: Amount,
}

impl TransferCommand {
    pub fn new(source: AccountId, beneficiary: AccountId, amount: Amount) -> Self {
        Self {
            source,
            beneficiary,
            amount,
        }
    }
}
