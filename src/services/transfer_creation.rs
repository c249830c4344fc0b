//! Transfer Creation
//!
//! Validates a transfer request, records it in CREATED state and publishes
//! the creation signal. Returns before the transfer is executed.

use std::sync::Arc;

use crate::aggregate::TransferRecord;
use crate::domain::{AccountId, DomainError, TransferEvent, TransferRequestId};
use crate::jobs::TransferPublisher;
use crate::ledger::TransferLedger;

use super::{AccountOperations, TransferCommand};

pub struct TransferCreationService {
    accounts: Arc<dyn AccountOperations>,
    transfers: Arc<TransferLedger>,
    publisher: TransferPublisher,
}

impl TransferCreationService {
    pub fn new(
        accounts: Arc<dyn AccountOperations>,
        transfers: Arc<TransferLedger>,
        publisher: TransferPublisher,
    ) -> Self {
        Self {
            accounts,
            transfers,
            publisher,
        }
    }

    /// Accept a transfer request.
    ///
    /// Account existence is checked without holding any lock until
    /// execution; an account could change in between.
    pub async fn request_transfer(
        &self,
        command: TransferCommand,
    ) -> Result<TransferRequestId, DomainError> {
        self.validate(&command)?;

        let request_id = TransferRequestId::new();
        let transfer = TransferRecord::new(
            request_id,
            command.source,
            command.beneficiary,
            command.amount,
        );
        self.transfers
            .save(&transfer)
            .map_err(|_| DomainError::InvalidTransferRequest(request_id))?;

        tracing::info!(
            transfer_id = %request_id,
            source = %command.source,
            beneficiary = %command.beneficiary,
            amount = %command.amount,
            "Transfer created"
        );

        if let Err(e) = self
            .publisher
            .publish(TransferEvent::Created { request_id })
            .await
        {
            // The record stays CREATED; nothing will pick it up.
            tracing::error!(transfer_id = %request_id, error = %e, "Failed to dispatch transfer");
        }

        Ok(request_id)
    }

    fn validate(&self, command: &TransferCommand) -> Result<(), DomainError> {
        self.ensure_account(command.source)?;
        self.ensure_account(command.beneficiary)?;

        if command.amount.is_negative() {
            return Err(DomainError::InvalidTransferAmount(command.amount));
        }
        Ok(())
    }

    fn ensure_account(&self, id: AccountId) -> Result<(), DomainError> {
        if self.accounts.is_account_valid(id) {
            Ok(())
        } else {
            Err(DomainError::InvalidAccount(id))
        }
    }
}
