//! Common test utilities

#![allow(dead_code)]

use std::time::Duration;

use money_transfer::aggregate::TransferRecord;
use money_transfer::jobs::DispatcherHandle;
use money_transfer::{AppState, Config, TransferRequestId};

/// Engine with the default configuration and a running dispatcher
pub fn setup_engine() -> (AppState, DispatcherHandle) {
    setup_engine_with(Config::default())
}

pub fn setup_engine_with(config: Config) -> (AppState, DispatcherHandle) {
    AppState::build(config)
}

/// Optimistic-only engine (no account lock stripes)
pub fn setup_optimistic_engine() -> (AppState, DispatcherHandle) {
    setup_engine_with(Config {
        account_lock_stripes: 0,
        ..Config::default()
    })
}

/// Poll until the transfer reaches a terminal status
pub async fn wait_for_terminal(state: &AppState, id: TransferRequestId) -> TransferRecord {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(transfer) = state.transfers.find_by_id(id) {
            if transfer.status().is_terminal() {
                return transfer;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "transfer {} did not finish in time",
            id
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Drop the state and wait for every queued transfer to finish
pub async fn drain(state: AppState, dispatcher: DispatcherHandle) {
    drop(state);
    assert!(
        dispatcher.join_with_timeout(Duration::from_secs(30)).await,
        "dispatcher did not drain"
    );
}
