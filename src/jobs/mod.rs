//! Transfer dispatch
//!
//! Decouples transfer creation from execution. Creation publishes a
//! `TransferEvent::Created` into a bounded queue; a fixed pool of worker
//! tasks drains the queue and runs the execution saga once per event.
//!
//! Delivery is at-most-once and memory-resident: an event lost to a crash
//! or a closed queue leaves its transfer in CREATED.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::domain::TransferEvent;
use crate::services::TransferExecutionService;

// =========================================================================
// Channel
// =========================================================================

/// Publishing side of the dispatch queue
#[derive(Debug, Clone)]
pub struct TransferPublisher {
    tx: mpsc::Sender<TransferEvent>,
}

impl TransferPublisher {
    /// Enqueue an event, waiting for queue space
    pub async fn publish(&self, event: TransferEvent) -> Result<(), PublishError> {
        self.tx
            .send(event)
            .await
            .map_err(|e| PublishError::QueueClosed(e.0))
    }
}

/// Consuming side of the dispatch queue
#[derive(Debug)]
pub struct TransferReceiver {
    rx: mpsc::Receiver<TransferEvent>,
}

impl TransferReceiver {
    pub async fn recv(&mut self) -> Option<TransferEvent> {
        self.rx.recv().await
    }
}

/// Create a new dispatch queue pair
pub fn transfer_channel(capacity: usize) -> (TransferPublisher, TransferReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (TransferPublisher { tx }, TransferReceiver { rx })
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Dispatch queue closed, dropped {} for {}", .0.event_type(), .0.request_id())]
    QueueClosed(TransferEvent),
}

// =========================================================================
// Stats
// =========================================================================

/// Execution counters, updated by the workers
#[derive(Debug, Default)]
pub struct DispatcherStats {
    received: AtomicU64,
    executed: AtomicU64,
    rejected: AtomicU64,
    compensation_failures: AtomicU64,
}

/// Point-in-time copy of [`DispatcherStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Events taken off the queue
    pub received: u64,
    /// Executions that reached a terminal status
    pub executed: u64,
    /// Executions refused before starting (unknown transfer)
    pub rejected: u64,
    /// Failed compensating credits (manual intervention needed)
    pub compensation_failures: u64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            compensation_failures: self.compensation_failures.load(Ordering::Relaxed),
        }
    }

    /// Executions finished, one way or the other
    pub fn finished(&self) -> u64 {
        self.executed.load(Ordering::Relaxed) + self.rejected.load(Ordering::Relaxed)
    }
}

// =========================================================================
// Dispatcher
// =========================================================================

/// Configuration for the dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of concurrent execution workers
    pub workers: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { workers: 8 }
    }
}

/// Worker pool executing created transfers
pub struct TransferDispatcher {
    execution: Arc<TransferExecutionService>,
    stats: Arc<DispatcherStats>,
    config: DispatcherConfig,
}

impl TransferDispatcher {
    pub fn new(execution: Arc<TransferExecutionService>, config: DispatcherConfig) -> Self {
        Self {
            execution,
            stats: Arc::new(DispatcherStats::default()),
            config,
        }
    }

    pub fn stats(&self) -> Arc<DispatcherStats> {
        self.stats.clone()
    }

    /// Spawn the workers. They run until every publisher is dropped and the
    /// queue is drained.
    pub fn start(self, receiver: TransferReceiver) -> DispatcherHandle {
        let workers = self.config.workers.max(1);
        let receiver = Arc::new(Mutex::new(receiver));

        tracing::info!(workers, "Transfer dispatcher started");

        let handles = (0..workers)
            .map(|worker| {
                let receiver = receiver.clone();
                let execution = self.execution.clone();
                let stats = self.stats.clone();
                tokio::spawn(async move {
                    run_worker(worker, receiver, execution, stats).await;
                })
            })
            .collect();

        DispatcherHandle {
            handles,
            stats: self.stats,
        }
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<Mutex<TransferReceiver>>,
    execution: Arc<TransferExecutionService>,
    stats: Arc<DispatcherStats>,
) {
    loop {
        let event = {
            let mut receiver = receiver.lock().await;
            receiver.recv().await
        };
        let Some(event) = event else {
            break;
        };

        stats.received.fetch_add(1, Ordering::Relaxed);
        let request_id = event.request_id();

        match execution.transfer_money(request_id).await {
            Ok(outcome) => {
                stats.executed.fetch_add(1, Ordering::Relaxed);
                if outcome.compensation_failed {
                    stats.compensation_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                stats.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    worker,
                    transfer_id = %request_id,
                    error = %e,
                    "Transfer execution rejected"
                );
            }
        }
    }

    tracing::debug!(worker, "Transfer worker stopped");
}

/// Running dispatcher
pub struct DispatcherHandle {
    handles: Vec<JoinHandle<()>>,
    stats: Arc<DispatcherStats>,
}

impl DispatcherHandle {
    pub fn stats(&self) -> Arc<DispatcherStats> {
        self.stats.clone()
    }

    /// Wait for the workers to drain the queue and exit.
    ///
    /// The queue only closes once every `TransferPublisher` is dropped.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Transfer worker panicked");
            }
        }
        tracing::info!(stats = ?self.stats.snapshot(), "Transfer dispatcher stopped");
    }

    /// Like [`join`](Self::join) but gives up after `timeout`
    pub async fn join_with_timeout(self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.join()).await.is_ok()
    }
}
