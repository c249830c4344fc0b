//! Demo data
//!
//! Two fixed accounts and a burst of concurrent transfers between them,
//! used by the demo start-up and the bulk test endpoint.

use uuid::Uuid;

use crate::domain::{AccountId, Amount, DomainError};
use crate::services::TransferCommand;
use crate::state::AppState;

const DEMO_SOURCE: Uuid = Uuid::from_u128(0x08f9da92_515f_4c55_b072_235c8443f1b6);
const DEMO_BENEFICIARY: Uuid = Uuid::from_u128(0x8bcc5f7f_3fe3_49a5_9dfc_f13c0323d67e);

/// Opening balance of each demo account
pub const DEMO_BALANCE: i64 = 2000;

/// Transfers of 1 fired from source to beneficiary at start-up
pub const DEMO_TRANSFERS: u32 = 1001;

pub fn demo_source() -> AccountId {
    AccountId::from_uuid(DEMO_SOURCE)
}

pub fn demo_beneficiary() -> AccountId {
    AccountId::from_uuid(DEMO_BENEFICIARY)
}

/// Open the demo accounts and fire the demo transfers.
///
/// Returns the number of accepted and rejected transfer requests.
pub async fn load_demo_data(state: &AppState) -> Result<(u32, u32), DomainError> {
    for id in [demo_source(), demo_beneficiary()] {
        state
            .accounts
            .create_account_with_id(id, Amount::from_integer(DEMO_BALANCE))?;
    }

    let (accepted, rejected) = fire_transfers(
        state,
        demo_source(),
        demo_beneficiary(),
        Amount::from_integer(1),
        DEMO_TRANSFERS,
    )
    .await;

    tracing::info!(accepted, rejected, "Demo data loaded");
    Ok((accepted, rejected))
}

/// Submit `count` identical transfer requests concurrently
pub async fn fire_transfers(
    state: &AppState,
    source: AccountId,
    beneficiary: AccountId,
    amount: Amount,
    count: u32,
) -> (u32, u32) {
    let tasks: Vec<_> = (0..count)
        .map(|_| {
            let creation = state.creation.clone();
            tokio::spawn(async move {
                creation
                    .request_transfer(TransferCommand::new(source, beneficiary, amount))
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await {
            Ok(Ok(_)) => accepted += 1,
            Ok(Err(e)) => {
                rejected += 1;
                tracing::debug!(error = %e, "Transfer request rejected");
            }
            Err(e) => {
                rejected += 1;
                tracing::error!(error = %e, "Transfer request task failed");
            }
        }
    }
    (accepted, rejected)
}
