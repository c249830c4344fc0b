//! Application state
//!
//! Wires the ledgers, services and dispatcher into one engine shared by the
//! HTTP layer, the demo seeder and the load test.

use std::sync::Arc;

use crate::config::Config;
use crate::jobs::{transfer_channel, DispatcherHandle, DispatcherStats, TransferDispatcher};
use crate::ledger::{AccountLedger, TransferLedger};
use crate::services::{
    AccountLocks, AccountService, TransferCreationService, TransferExecutionService,
};

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub transfers: Arc<TransferLedger>,
    pub creation: Arc<TransferCreationService>,
    pub stats: Arc<DispatcherStats>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the engine and start the dispatcher workers.
    ///
    /// Must be called inside a tokio runtime. The dispatcher stops once every
    /// clone of the returned state is dropped and the queue is drained.
    pub fn build(config: Config) -> (Self, DispatcherHandle) {
        let accounts = Arc::new(AccountService::new(
            Arc::new(AccountLedger::new()),
            AccountLocks::new(config.account_lock_stripes),
            config.retry_policy(),
        ));
        let transfers = Arc::new(TransferLedger::new());

        let (publisher, receiver) = transfer_channel(config.transfer_queue_capacity);
        let creation = Arc::new(TransferCreationService::new(
            accounts.clone(),
            transfers.clone(),
            publisher,
        ));
        let execution = Arc::new(TransferExecutionService::new(
            accounts.clone(),
            transfers.clone(),
        ));

        let dispatcher = TransferDispatcher::new(execution, config.dispatcher());
        let stats = dispatcher.stats();
        let handle = dispatcher.start(receiver);

        tracing::info!(
            workers = config.transfer_workers,
            queue_capacity = config.transfer_queue_capacity,
            lock_stripes = config.account_lock_stripes,
            "Transfer engine ready"
        );

        let state = Self {
            accounts,
            transfers,
            creation,
            stats,
            config: Arc::new(config),
        };
        (state, handle)
    }
}
