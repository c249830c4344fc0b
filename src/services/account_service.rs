//! Account Service
//!
//! Read-modify-write orchestration over the account ledger. Conflicting
//! saves are retried against a fresh read with bounded, jittered backoff.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::{Mutex, MutexGuard};

use crate::aggregate::{Account, Aggregate};
use crate::domain::{AccountId, Amount, DomainError};
use crate::ledger::{AccountLedger, ConcurrentModification};

use super::CreateAccountCommand;

/// Account operations the transfer services depend on
#[async_trait]
pub trait AccountOperations: Send + Sync {
    async fn credit_account(&self, id: AccountId, amount: &Amount) -> Result<(), DomainError>;

    async fn debit_account(&self, id: AccountId, amount: &Amount) -> Result<(), DomainError>;

    fn is_account_valid(&self, id: AccountId) -> bool;
}

// =========================================================================
// RetryPolicy
// =========================================================================

/// Bounded retry with exponential backoff for optimistic-concurrency conflicts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total save attempts before giving up
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(64),
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the wait after the given failed attempt (1-based)
    pub fn delay_ceiling(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Jittered wait in `[0, delay_ceiling(attempt)]`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = self.delay_ceiling(attempt).as_micros() as u64;
        Duration::from_micros(rand::thread_rng().gen_range(0..=ceiling))
    }
}

// =========================================================================
// AccountLocks
// =========================================================================

/// Striped async locks keyed by account id.
///
/// Serializes read-modify-write cycles on the same account so that
/// contending writers queue instead of colliding. Zero stripes disables it.
#[derive(Debug)]
pub struct AccountLocks {
    stripes: Vec<Mutex<()>>,
}

impl AccountLocks {
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    pub async fn acquire(&self, id: AccountId) -> Option<MutexGuard<'_, ()>> {
        if self.stripes.is_empty() {
            return None;
        }

        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        let index = (hasher.finish() % self.stripes.len() as u64) as usize;
        Some(self.stripes[index].lock().await)
    }
}

// =========================================================================
// AccountService
// =========================================================================

pub struct AccountService {
    ledger: Arc<AccountLedger>,
    locks: AccountLocks,
    retry: RetryPolicy,
}

impl AccountService {
    pub fn new(ledger: Arc<AccountLedger>, locks: AccountLocks, retry: RetryPolicy) -> Self {
        Self {
            ledger,
            locks,
            retry,
        }
    }

    pub fn ledger(&self) -> &Arc<AccountLedger> {
        &self.ledger
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Open an account with a freshly generated id at version 0.
    ///
    /// The initial balance is not sign-checked here.
    pub fn create_account(&self, initial_amount: Amount) -> Result<AccountId, DomainError> {
        self.open(CreateAccountCommand::new(initial_amount))
    }

    /// Open an account under a caller-chosen id
    pub fn create_account_with_id(
        &self,
        id: AccountId,
        initial_amount: Amount,
    ) -> Result<AccountId, DomainError> {
        self.open(CreateAccountCommand::new(initial_amount).with_account_id(id))
    }

    pub fn open(&self, command: CreateAccountCommand) -> Result<AccountId, DomainError> {
        let id = command.account_id.unwrap_or_default();
        let account = Account::new(id, command.initial_amount);

        self.ledger
            .insert(&account)
            .map_err(|_| DomainError::DuplicateAccount(id))?;

        tracing::info!(
            account_id = %id,
            initial_amount = %command.initial_amount,
            "Account created"
        );
        Ok(id)
    }

    /// Detached snapshot of the account
    pub fn get_account(&self, id: AccountId) -> Option<Account> {
        self.ledger.find_by_id(id)
    }

    pub async fn credit_account(&self, id: AccountId, amount: &Amount) -> Result<(), DomainError> {
        self.update_account(id, "credit", |account| {
            account.credit(amount);
            Ok(())
        })
        .await
    }

    pub async fn debit_account(&self, id: AccountId, amount: &Amount) -> Result<(), DomainError> {
        self.update_account(id, "debit", |account| account.debit(amount))
            .await
    }

    pub fn is_account_valid(&self, id: AccountId) -> bool {
        self.ledger.contains(id)
    }

    /// Read, mutate and save until the save commits.
    ///
    /// Every attempt starts from a fresh read. Errors raised by `mutate`
    /// (insufficient funds) are returned as-is and never retried.
    async fn update_account<F>(
        &self,
        id: AccountId,
        operation: &'static str,
        mutate: F,
    ) -> Result<(), DomainError>
    where
        F: Fn(&mut Account) -> Result<(), DomainError> + Send + Sync,
    {
        let _stripe = self.locks.acquire(id).await;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut account = self
                .ledger
                .find_by_id(id)
                .ok_or(DomainError::InvalidAccount(id))?;
            mutate(&mut account)?;

            match self.ledger.save(&account) {
                Ok(version) => {
                    tracing::debug!(
                        account_id = %id,
                        operation,
                        version,
                        attempt,
                        "Account updated"
                    );
                    return Ok(());
                }
                Err(ConcurrentModification { expected, found, .. }) => {
                    if attempt >= self.retry.max_attempts {
                        tracing::warn!(
                            aggregate = Account::aggregate_type(),
                            account_id = %id,
                            operation,
                            attempts = attempt,
                            "Concurrency retries exhausted"
                        );
                        return Err(DomainError::RetriesExhausted {
                            account_id: id,
                            attempts: attempt,
                        });
                    }

                    let delay = self.retry.backoff(attempt);
                    tracing::debug!(
                        account_id = %id,
                        operation,
                        expected,
                        found,
                        attempt,
                        delay_us = delay.as_micros() as u64,
                        "Concurrent modification, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl AccountOperations for AccountService {
    async fn credit_account(&self, id: AccountId, amount: &Amount) -> Result<(), DomainError> {
        AccountService::credit_account(self, id, amount).await
    }

    async fn debit_account(&self, id: AccountId, amount: &Amount) -> Result<(), DomainError> {
        AccountService::debit_account(self, id, amount).await
    }

    fn is_account_valid(&self, id: AccountId) -> bool {
        AccountService::is_account_valid(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    fn service(stripes: usize) -> AccountService {
        AccountService::new(
            Arc::new(AccountLedger::new()),
            AccountLocks::new(stripes),
            RetryPolicy::default(),
        )
    }

    #[test]
    fn test_create_account_starts_at_version_zero() {
        let service = service(0);
        let id = service.create_account(Amount::new(dec!(100))).unwrap();

        let account = service.get_account(id).unwrap();
        assert_eq!(account.balance().value(), dec!(100));
        assert_eq!(account.version(), 0);
    }

    #[test]
    fn test_create_account_does_not_check_sign() {
        let service = service(0);
        let id = service.create_account(Amount::new(dec!(-5))).unwrap();
        assert_eq!(service.get_account(id).unwrap().balance().value(), dec!(-5));
    }

    #[test]
    fn test_create_account_with_duplicate_id() {
        let service = service(0);
        let id = AccountId::new();
        assert_ok!(service.create_account_with_id(id, Amount::zero()));

        let err = assert_err!(service.create_account_with_id(id, Amount::new(dec!(1))));
        assert_eq!(err, DomainError::DuplicateAccount(id));
    }

    #[tokio::test]
    async fn test_credit_account() {
        let service = service(4);
        let id = service.create_account(Amount::zero()).unwrap();

        assert_ok!(service.credit_account(id, &Amount::new(dec!(10))).await);

        let account = service.get_account(id).unwrap();
        assert_eq!(account.balance().value(), dec!(10));
        assert_eq!(account.version(), 1);
    }

    #[tokio::test]
    async fn test_debit_account() {
        let service = service(4);
        let id = service.create_account(Amount::zero()).unwrap();

        service.credit_account(id, &Amount::new(dec!(10))).await.unwrap();
        service.debit_account(id, &Amount::new(dec!(6))).await.unwrap();

        let account = service.get_account(id).unwrap();
        assert_eq!(account.balance().value(), dec!(4));
        assert_eq!(account.version(), 2);
    }

    #[tokio::test]
    async fn test_unknown_account_is_invalid() {
        let service = service(4);
        let unknown = AccountId::new();

        let err = service.credit_account(unknown, &Amount::new(dec!(1))).await;
        assert_eq!(err, Err(DomainError::InvalidAccount(unknown)));

        let err = service.debit_account(unknown, &Amount::new(dec!(1))).await;
        assert_eq!(err, Err(DomainError::InvalidAccount(unknown)));
    }

    #[tokio::test]
    async fn test_debit_insufficient_funds_leaves_balance() {
        let service = service(4);
        let id = service.create_account(Amount::new(dec!(10))).unwrap();

        let err = service.debit_account(id, &Amount::new(dec!(11))).await;
        assert_eq!(err, Err(DomainError::InsufficientFunds { amount: dec!(11) }));

        let account = service.get_account(id).unwrap();
        assert_eq!(account.balance().value(), dec!(10));
        assert_eq!(account.version(), 0);
    }

    #[test]
    fn test_is_account_valid() {
        let service = service(0);
        let id = service.create_account(Amount::zero()).unwrap();

        assert!(service.is_account_valid(id));
        assert!(!service.is_account_valid(AccountId::new()));
    }

    #[test]
    fn test_retry_policy_delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(2),
            max_delay: Duration::from_millis(10),
        };

        assert_eq!(policy.delay_ceiling(1), Duration::from_millis(2));
        assert_eq!(policy.delay_ceiling(2), Duration::from_millis(4));
        assert_eq!(policy.delay_ceiling(3), Duration::from_millis(8));
        assert_eq!(policy.delay_ceiling(4), Duration::from_millis(10));
        assert_eq!(policy.delay_ceiling(1000), Duration::from_millis(10));

        for attempt in 1..20 {
            assert!(policy.backoff(attempt) <= policy.delay_ceiling(attempt));
        }
    }

    #[tokio::test]
    async fn test_account_locks_disabled() {
        let locks = AccountLocks::disabled();
        assert_eq!(locks.stripe_count(), 0);
        assert!(locks.acquire(AccountId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_account_locks_serialize_same_account() {
        let locks = AccountLocks::new(8);
        let id = AccountId::new();

        let guard = locks.acquire(id).await;
        assert!(guard.is_some());

        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(id)).await;
        assert!(second.is_err(), "same stripe must be held");

        drop(guard);
        assert!(locks.acquire(id).await.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debits_without_stripes() {
        let service = Arc::new(AccountService::new(
            Arc::new(AccountLedger::new()),
            AccountLocks::disabled(),
            RetryPolicy {
                max_attempts: 10_000,
                base_delay: Duration::from_micros(100),
                max_delay: Duration::from_millis(5),
            },
        ));
        let id = service.create_account(Amount::new(dec!(100))).unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..100 {
            let service = service.clone();
            tasks.spawn(async move { service.debit_account(id, &Amount::new(dec!(1))).await });
        }

        let mut succeeded = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        let account = service.get_account(id).unwrap();
        assert_eq!(succeeded, 100);
        assert_eq!(account.balance().value(), dec!(0));
        assert_eq!(account.version(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_retry_ceiling_surfaces_exhaustion() {
        const TASKS: usize = 8;
        const DEBITS_PER_TASK: usize = 500;

        let service = Arc::new(AccountService::new(
            Arc::new(AccountLedger::new()),
            AccountLocks::disabled(),
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_micros(1),
                max_delay: Duration::from_micros(1),
            },
        ));
        let opening = dec!(1000000);
        let id = service.create_account(Amount::new(opening)).unwrap();

        let mut succeeded: u64 = 0;
        let mut exhausted: u64 = 0;

        // Contention is scheduler-dependent; keep hammering until a save loses.
        for _round in 0..20 {
            let barrier = Arc::new(tokio::sync::Barrier::new(TASKS));
            let mut tasks = tokio::task::JoinSet::new();
            for _ in 0..TASKS {
                let service = service.clone();
                let barrier = barrier.clone();
                tasks.spawn(async move {
                    barrier.wait().await;
                    let mut outcomes = Vec::with_capacity(DEBITS_PER_TASK);
                    for _ in 0..DEBITS_PER_TASK {
                        outcomes.push(service.debit_account(id, &Amount::from_integer(1)).await);
                    }
                    outcomes
                });
            }

            while let Some(outcomes) = tasks.join_next().await {
                for outcome in outcomes.unwrap() {
                    match outcome {
                        Ok(()) => succeeded += 1,
                        Err(DomainError::RetriesExhausted { account_id, attempts }) => {
                            assert_eq!(account_id, id);
                            assert_eq!(attempts, 1);
                            exhausted += 1;
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            }

            if exhausted > 0 {
                break;
            }
        }

        assert!(exhausted >= 1, "no debit lost a version race");

        // Losing attempts leave no trace
        let account = service.get_account(id).unwrap();
        assert_eq!(
            account.balance().value(),
            opening - rust_decimal::Decimal::from(succeeded)
        );
        assert_eq!(account.version(), succeeded);
    }
}
