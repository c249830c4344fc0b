//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, TransferStatus};
use crate::domain::{AccountId, Amount, TransferRequestId};
use crate::error::AppError;
use crate::jobs::StatsSnapshot;
use crate::seed;
use crate::services::{CreateAccountCommand, TransferCommand};
use crate::state::AppState;

/// Upper bound for the bulk test endpoint
pub const MAX_TEST_TRANSFERS: u32 = 10_000;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub account_id: Option<Uuid>,
    pub initial_amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub account_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub balance: String,
    pub version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source_account_id: Uuid,
    pub beneficiary_account_id: Uuid,
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransferResponse {
    pub transfer_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub transfer_id: Uuid,
    pub source_account_id: Uuid,
    pub beneficiary_account_id: Uuid,
    pub amount: String,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkTransferResponse {
    pub requested: u32,
    pub accepted: u32,
    pub rejected: u32,
}

fn parse_amount(raw: &str) -> Result<Amount, AppError> {
    raw.parse::<Amount>()
        .map_err(|e| AppError::InvalidRequest(e.to_string()))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/:account_id", get(get_account))
        .route("/transfers", post(create_transfer))
        .route("/transfers/:transfer_id", get(get_transfer))
        .route("/test/transfers/:count", post(fire_test_transfers))
        .route("/stats", get(get_stats))
}

// =========================================================================
// POST /accounts
// =========================================================================

async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), AppError> {
    let initial_amount = parse_amount(&request.initial_amount)?;
    if initial_amount.is_negative() {
        return Err(AppError::InvalidRequest(format!(
            "initial amount must not be negative: {}",
            initial_amount
        )));
    }

    let command = CreateAccountCommand::new(initial_amount);
    let command = match request.account_id {
        Some(id) => command.with_account_id(AccountId::from_uuid(id)),
        None => command,
    };
    let account_id = state.accounts.open(command)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            account_id: account_id.as_uuid(),
        }),
    ))
}

// =========================================================================
// GET /accounts/:account_id
// =========================================================================

async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .accounts
        .get_account(AccountId::from_uuid(account_id))
        .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;

    Ok(Json(AccountResponse {
        account_id,
        balance: account.balance().to_string(),
        version: account.version(),
    }))
}

// =========================================================================
// POST /transfers
// =========================================================================

async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<CreateTransferResponse>), AppError> {
    let command = TransferCommand::new(
        AccountId::from_uuid(request.source_account_id),
        AccountId::from_uuid(request.beneficiary_account_id),
        parse_amount(&request.amount)?,
    );

    let transfer_id = state.creation.request_transfer(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTransferResponse {
            transfer_id: transfer_id.as_uuid(),
        }),
    ))
}

// =========================================================================
// GET /transfers/:transfer_id
// =========================================================================

async fn get_transfer(
    State(state): State<AppState>,
    Path(transfer_id): Path<Uuid>,
) -> Result<Json<TransferResponse>, AppError> {
    let transfer = state
        .transfers
        .find_by_id(TransferRequestId::from_uuid(transfer_id))
        .ok_or_else(|| AppError::TransferNotFound(transfer_id.to_string()))?;

    Ok(Json(TransferResponse {
        transfer_id: transfer.id().as_uuid(),
        source_account_id: transfer.source().as_uuid(),
        beneficiary_account_id: transfer.beneficiary().as_uuid(),
        amount: transfer.amount().to_string(),
        status: transfer.status(),
        created_at: transfer.created_at(),
        updated_at: transfer.updated_at(),
    }))
}

// =========================================================================
// POST /test/transfers/:count
// =========================================================================

/// Fire `count` concurrent copies of the same transfer request
async fn fire_test_transfers(
    State(state): State<AppState>,
    Path(count): Path<u32>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<BulkTransferResponse>), AppError> {
    if state.config.is_production() {
        return Err(AppError::Forbidden(
            "bulk test transfers are disabled in production".to_string(),
        ));
    }
    if count > MAX_TEST_TRANSFERS {
        return Err(AppError::InvalidRequest(format!(
            "count must not exceed {}",
            MAX_TEST_TRANSFERS
        )));
    }
    let amount = parse_amount(&request.amount)?;

    let (accepted, rejected) = seed::fire_transfers(
        &state,
        AccountId::from_uuid(request.source_account_id),
        AccountId::from_uuid(request.beneficiary_account_id),
        amount,
        count,
    )
    .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(BulkTransferResponse {
            requested: count,
            accepted,
            rejected,
        }),
    ))
}

// =========================================================================
// GET /stats
// =========================================================================

async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}
