//! money_transfer Library
//!
//! Memory-resident account ledger with asynchronous, saga-based money
//! transfers. Re-exports modules for integration testing and the binaries.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod domain;
mod error;
pub mod jobs;
pub mod ledger;
pub mod seed;
pub mod services;
pub mod state;

use axum::http::HeaderName;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::Config;
pub use domain::{AccountId, Amount, AmountError, DomainError, TransferEvent, TransferRequestId};
pub use error::AppError;
pub use state::AppState;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "money_transfer=debug,tower_http=debug";

/// Initialize tracing/logging. Production logs are JSON lines.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Build the application router
///
/// Every response carries the request's correlation id, generated when the
/// caller did not send one.
pub fn build_router(state: AppState) -> Router {
    let correlation_header = HeaderName::from_static(api::middleware::CORRELATION_ID_HEADER);

    let api_router = api::create_router().layer(middleware::from_fn(
        api::middleware::logging_middleware,
    ));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api_router)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    correlation_header.clone(),
                    MakeRequestUuid,
                ))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(correlation_header)),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
