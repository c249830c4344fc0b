//! Account Ledger
//!
//! Concurrency-controlled account table with optimistic-concurrency writes.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::aggregate::{Account, Aggregate};
use crate::domain::{AccountId, Amount};

use super::{ConcurrentModification, LedgerError};

/// In-memory account store.
///
/// Reads run in parallel; a save holds the write lock for the whole
/// version-check-and-replace, so the check is atomic with the update.
/// Callers always receive detached copies.
#[derive(Debug, Default)]
pub struct AccountLedger {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a detached copy of the stored account
    pub fn find_by_id(&self, id: AccountId) -> Option<Account> {
        // A panic while holding the lock cannot leave a half-written entry:
        // every write is a single map insert.
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.get(&id).cloned()
    }

    pub fn contains(&self, id: AccountId) -> bool {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.contains_key(&id)
    }

    /// Insert a brand-new account. Fails if the id is taken.
    pub fn insert(&self, account: &Account) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);

        if accounts.contains_key(&account.id()) {
            return Err(LedgerError::DuplicateAccount(account.id()));
        }

        accounts.insert(account.id(), account.committed(account.version()));
        tracing::debug!(account_id = %account.id(), "Account inserted");
        Ok(())
    }

    /// Commit a previously read and modified account.
    ///
    /// - unknown id: the account is stored as-is (first insertion)
    /// - no pending change: no-op, the version does not move
    /// - pending change: succeeds only if the copy's version equals the
    ///   stored one; the stored version becomes `version + 1`
    ///
    /// Returns the version held by the ledger after the call.
    pub fn save(&self, account: &Account) -> Result<u64, ConcurrentModification> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);

        let Some(current) = accounts.get(&account.id()) else {
            accounts.insert(account.id(), account.committed(account.version()));
            return Ok(account.version());
        };

        if !account.has_pending_change() {
            return Ok(current.version());
        }

        if current.version() != account.version() {
            tracing::debug!(
                account_id = %account.id(),
                expected = account.version(),
                found = current.version(),
                "Rejected stale account save"
            );
            return Err(ConcurrentModification {
                account_id: account.id(),
                expected: account.version(),
                found: current.version(),
            });
        }

        let next_version = current.version() + 1;
        accounts.insert(account.id(), account.committed(next_version));
        Ok(next_version)
    }

    pub fn len(&self) -> usize {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all balances, taken under a single read lock
    pub fn total_balance(&self) -> Amount {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts
            .values()
            .fold(Amount::zero(), |total, account| total.add(account.balance()))
    }
}
