//! API Integration Tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use money_transfer::aggregate::TransferStatus;
use money_transfer::api::routes::{CreateAccountRequest, TransferRequest};
use money_transfer::{build_router, Config};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::util::ServiceExt;
use uuid::Uuid;

mod common;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json<T: serde::Serialize>(uri: &str, body: &T) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create_account(app: &Router, initial_amount: &str) -> Uuid {
    let (status, body) = send(
        app,
        post_json(
            "/accounts",
            &CreateAccountRequest {
                account_id: None,
                initial_amount: initial_amount.to_string(),
            },
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "account creation failed: {}", body);
    body["account_id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_transfer_e2e() {
    let (state, _dispatcher) = common::setup_engine();
    let app = build_router(state.clone());

    // 1. Create accounts
    let source = create_account(&app, "100.00").await;
    let beneficiary = create_account(&app, "0").await;

    // 2. Transfer
    let (status, body) = send(
        &app,
        post_json(
            "/transfers",
            &TransferRequest {
                source_account_id: source,
                beneficiary_account_id: beneficiary,
                amount: "40.50".to_string(),
            },
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "transfer failed: {}", body);
    let transfer_id: Uuid = body["transfer_id"].as_str().unwrap().parse().unwrap();

    // 3. Wait for execution
    common::wait_for_terminal(&state, transfer_id.into()).await;

    let (status, body) = send(&app, get(&format!("/transfers/{}", transfer_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["amount"], "40.50");
    assert_eq!(body["source_account_id"], source.to_string());

    // 4. Balances
    let (status, body) = send(&app, get(&format!("/accounts/{}", source))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "59.50");
    assert_eq!(body["version"], 1);

    let (_, body) = send(&app, get(&format!("/accounts/{}", beneficiary))).await;
    assert_eq!(body["balance"], "40.50");
}

#[tokio::test]
async fn test_transfer_from_unknown_account_is_bad_request() {
    let (state, _dispatcher) = common::setup_engine();
    let app = build_router(state.clone());
    let beneficiary = create_account(&app, "0").await;
    let missing = Uuid::new_v4();

    let (status, body) = send(
        &app,
        post_json(
            "/transfers",
            &TransferRequest {
                source_account_id: missing,
                beneficiary_account_id: beneficiary,
                amount: "1".to_string(),
            },
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_account");
    assert_eq!(body["details"], missing.to_string());
    assert!(state.transfers.is_empty());
}

#[tokio::test]
async fn test_negative_transfer_amount_is_bad_request() {
    let (state, _dispatcher) = common::setup_engine();
    let app = build_router(state);
    let source = create_account(&app, "10").await;
    let beneficiary = create_account(&app, "0").await;

    let (status, body) = send(
        &app,
        post_json(
            "/transfers",
            &TransferRequest {
                source_account_id: source,
                beneficiary_account_id: beneficiary,
                amount: "-5".to_string(),
            },
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_transfer_amount");
}

#[tokio::test]
async fn test_malformed_and_negative_initial_amounts_rejected() {
    let (state, _dispatcher) = common::setup_engine();
    let app = build_router(state);

    for amount in ["ten", "-1"] {
        let (status, body) = send(
            &app,
            post_json(
                "/accounts",
                &CreateAccountRequest {
                    account_id: None,
                    initial_amount: amount.to_string(),
                },
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {}", amount);
        assert_eq!(body["error_code"], "invalid_request");
    }
}

#[tokio::test]
async fn test_duplicate_fixed_account_id_conflicts() {
    let (state, _dispatcher) = common::setup_engine();
    let app = build_router(state);
    let request = CreateAccountRequest {
        account_id: Some(Uuid::new_v4()),
        initial_amount: "1".to_string(),
    };

    let (status, _) = send(&app, post_json("/accounts", &request)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, post_json("/accounts", &request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "duplicate_account");
}

#[tokio::test]
async fn test_unknown_resources_are_not_found() {
    let (state, _dispatcher) = common::setup_engine();
    let app = build_router(state);

    let (status, body) = send(&app, get(&format!("/accounts/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "account_not_found");

    let (status, body) = send(&app, get(&format!("/transfers/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "transfer_not_found");
}

#[tokio::test]
async fn test_bulk_test_transfers_use_request_body() {
    let (state, dispatcher) = common::setup_engine();
    let app = build_router(state.clone());
    let source = create_account(&app, "10").await;
    let beneficiary = create_account(&app, "0").await;

    let request = TransferRequest {
        source_account_id: source,
        beneficiary_account_id: beneficiary,
        amount: "2".to_string(),
    };
    let (status, body) = send(&app, post_json("/test/transfers/8", &request)).await;
    assert_eq!(status, StatusCode::ACCEPTED, "bulk request failed: {}", body);
    assert_eq!(body["requested"], 8);
    assert_eq!(body["accepted"], 8);
    assert_eq!(body["rejected"], 0);

    drop(app);
    let transfers = state.transfers.clone();
    let accounts = state.accounts.clone();
    common::drain(state, dispatcher).await;

    // 10 covers five transfers of 2; the rest bounce
    let counts = transfers.count_by_status();
    assert_eq!(counts.get(&TransferStatus::Completed), Some(&5));
    assert_eq!(counts.get(&TransferStatus::InsufficientFunds), Some(&3));
    let source_balance = accounts.get_account(source.into()).unwrap();
    assert_eq!(source_balance.balance().value(), dec!(0));
    let beneficiary_balance = accounts.get_account(beneficiary.into()).unwrap();
    assert_eq!(beneficiary_balance.balance().value(), dec!(10));
}

#[tokio::test]
async fn test_bulk_test_transfers_reject_unknown_accounts_and_bad_amounts() {
    let (state, _dispatcher) = common::setup_engine();
    let app = build_router(state.clone());
    let beneficiary = create_account(&app, "0").await;

    let mut request = TransferRequest {
        source_account_id: Uuid::new_v4(),
        beneficiary_account_id: beneficiary,
        amount: "1".to_string(),
    };
    let (status, body) = send(&app, post_json("/test/transfers/3", &request)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["accepted"], 0);
    assert_eq!(body["rejected"], 3);
    assert!(state.transfers.is_empty());

    request.amount = "one".to_string();
    let (status, body) = send(&app, post_json("/test/transfers/3", &request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn test_bulk_test_transfers_forbidden_in_production() {
    let (state, _dispatcher) = common::setup_engine_with(Config {
        environment: "production".to_string(),
        ..Config::default()
    });
    let app = build_router(state);

    let request = TransferRequest {
        source_account_id: Uuid::new_v4(),
        beneficiary_account_id: Uuid::new_v4(),
        amount: "1".to_string(),
    };
    let (status, body) = send(&app, post_json("/test/transfers/1", &request)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "forbidden");
}

#[tokio::test]
async fn test_health_stats_and_correlation_id() {
    let (state, _dispatcher) = common::setup_engine();
    let app = build_router(state);

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let generated = response.headers()["x-correlation-id"].to_str().unwrap();
    assert!(Uuid::parse_str(generated).is_ok());

    let request = Request::builder()
        .uri("/stats")
        .header("x-correlation-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-correlation-id"], "trace-me");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let stats: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(stats["received"], 0);
    assert_eq!(stats["compensation_failures"], 0);

    // Requests without an id get a generated one through the logged routes too
    let anonymous = app.clone().oneshot(get("/stats")).await.unwrap();
    let generated = anonymous.headers()["x-correlation-id"].to_str().unwrap();
    assert!(Uuid::parse_str(generated).is_ok());
}
