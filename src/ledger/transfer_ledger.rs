//! Transfer Ledger
//!
//! Store of transfer records and their lifecycle status.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::aggregate::{Aggregate, TransferRecord, TransferStatus};
use crate::domain::TransferRequestId;

use super::LedgerError;

#[derive(Debug, Default)]
pub struct TransferLedger {
    transfers: RwLock<HashMap<TransferRequestId, TransferRecord>>,
}

impl TransferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a detached copy of the stored record
    pub fn find_by_id(&self, id: TransferRequestId) -> Option<TransferRecord> {
        let transfers = self.transfers.read().unwrap_or_else(PoisonError::into_inner);
        transfers.get(&id).cloned()
    }

    /// Store a copy of the record.
    ///
    /// Records that already reached a terminal status are immutable.
    pub fn save(&self, transfer: &TransferRecord) -> Result<(), LedgerError> {
        let mut transfers = self.transfers.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = transfers.get(&transfer.id()) {
            if current.status().is_terminal() {
                return Err(LedgerError::TransferAlreadyFinal {
                    id: transfer.id(),
                    status: current.status(),
                });
            }
        }

        transfers.insert(transfer.id(), transfer.clone());
        Ok(())
    }

    pub fn len(&self) -> usize {
        let transfers = self.transfers.read().unwrap_or_else(PoisonError::into_inner);
        transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records per status
    pub fn count_by_status(&self) -> HashMap<TransferStatus, usize> {
        let transfers = self.transfers.read().unwrap_or_else(PoisonError::into_inner);
        let mut counts = HashMap::new();
        for transfer in transfers.values() {
            *counts.entry(transfer.status()).or_insert(0) += 1;
        }
        counts
    }
}
