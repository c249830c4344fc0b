//! Transfer Execution
//!
//! Two-step saga: debit the source, then credit the beneficiary. A failed
//! credit is compensated by crediting the source back. There is no
//! cross-account transaction; the transfer status is the saga's state.

use std::sync::Arc;

use serde::Serialize;

use crate::aggregate::{Aggregate, TransferRecord, TransferStatus};
use crate::domain::{DomainError, TransferRequestId};
use crate::ledger::TransferLedger;

use super::AccountOperations;

/// Result of one saga run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub status: TransferStatus,
    /// The compensating credit failed; money is stuck and needs a human
    pub compensation_failed: bool,
}

impl ExecutionOutcome {
    fn finished(status: TransferStatus) -> Self {
        Self {
            status,
            compensation_failed: false,
        }
    }
}

pub struct TransferExecutionService {
    accounts: Arc<dyn AccountOperations>,
    transfers: Arc<TransferLedger>,
}

impl TransferExecutionService {
    pub fn new(accounts: Arc<dyn AccountOperations>, transfers: Arc<TransferLedger>) -> Self {
        Self {
            accounts,
            transfers,
        }
    }

    /// Run the saga for a stored transfer.
    ///
    /// Only an unknown request id is reported as an error; every business
    /// failure ends up as a terminal status on the record.
    ///
    /// Not idempotent: running it twice for the same record debits twice.
    pub async fn transfer_money(
        &self,
        request_id: TransferRequestId,
    ) -> Result<ExecutionOutcome, DomainError> {
        let mut transfer = self
            .transfers
            .find_by_id(request_id)
            .ok_or(DomainError::InvalidTransferRequest(request_id))?;

        tracing::info!(
            transfer_id = %request_id,
            source = %transfer.source(),
            beneficiary = %transfer.beneficiary(),
            amount = %transfer.amount(),
            "Executing transfer"
        );

        // Step 1: nothing is committed yet if this fails.
        if let Err(status) = self.debit_source(&transfer).await {
            self.finish(&mut transfer, status);
            return Ok(ExecutionOutcome::finished(status));
        }

        // Step 2: the source is already debited.
        if let Err(status) = self.credit_beneficiary(&transfer).await {
            self.finish(&mut transfer, status);
            let compensated = self.compensate_source(&transfer).await;
            return Ok(ExecutionOutcome {
                status,
                compensation_failed: !compensated,
            });
        }

        self.finish(&mut transfer, TransferStatus::Completed);
        Ok(ExecutionOutcome::finished(TransferStatus::Completed))
    }

    async fn debit_source(&self, transfer: &TransferRecord) -> Result<(), TransferStatus> {
        match self
            .accounts
            .debit_account(transfer.source(), transfer.amount())
            .await
        {
            Ok(()) => Ok(()),
            Err(e @ DomainError::InsufficientFunds { .. }) => {
                tracing::warn!(
                    transfer_id = %transfer.id(),
                    error = %e,
                    "Failed to debit source account due to insufficient funds"
                );
                Err(TransferStatus::InsufficientFunds)
            }
            Err(e) => {
                tracing::warn!(
                    transfer_id = %transfer.id(),
                    error = %e,
                    "Failed to debit source account"
                );
                Err(TransferStatus::FailedToDebitSource)
            }
        }
    }

    async fn credit_beneficiary(&self, transfer: &TransferRecord) -> Result<(), TransferStatus> {
        self.accounts
            .credit_account(transfer.beneficiary(), transfer.amount())
            .await
            .map_err(|e| {
                tracing::warn!(
                    transfer_id = %transfer.id(),
                    error = %e,
                    "Failed to credit beneficiary account"
                );
                TransferStatus::FailedToCreditBeneficiary
            })
    }

    /// Credit the debited amount back to the source. Not retried beyond the
    /// account service's own conflict handling.
    async fn compensate_source(&self, transfer: &TransferRecord) -> bool {
        match self
            .accounts
            .credit_account(transfer.source(), transfer.amount())
            .await
        {
            Ok(()) => {
                tracing::info!(
                    transfer_id = %transfer.id(),
                    source = %transfer.source(),
                    amount = %transfer.amount(),
                    "Source account compensated"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    transfer_id = %transfer.id(),
                    source = %transfer.source(),
                    amount = %transfer.amount(),
                    error = %e,
                    manual_intervention = true,
                    "Failed to compensate source account, manual intervention needed"
                );
                false
            }
        }
    }

    /// Record the terminal status
    fn finish(&self, transfer: &mut TransferRecord, status: TransferStatus) {
        if let Err(e) = transfer.transition_to(status) {
            tracing::error!(error = %e, "Illegal transfer status change");
            return;
        }

        match self.transfers.save(transfer) {
            Ok(()) => tracing::info!(
                transfer_id = %transfer.id(),
                status = %status,
                "Transfer finished"
            ),
            Err(e) => tracing::error!(
                aggregate = TransferRecord::aggregate_type(),
                transfer_id = %transfer.id(),
                status = %status,
                error = %e,
                "Failed to record transfer status"
            ),
        }
    }
}
