//! money_transfer server
//!
//! Serves the account and transfer API over HTTP and runs the transfer
//! execution workers in the same process.

use std::net::SocketAddr;
use std::time::Duration;

use money_transfer::{build_router, init_tracing, seed, AppState, Config};

/// How long shutdown waits for queued transfers to finish
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.is_production());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(environment = %config.environment, "Starting money_transfer server");

    let (state, dispatcher) = AppState::build(config);

    if state.config.seed_demo_data {
        if state.config.is_production() {
            tracing::warn!("Ignoring SEED_DEMO_DATA in production");
        } else {
            let (accepted, rejected) = seed::load_demo_data(&state).await?;
            tracing::info!(accepted, rejected, "Demo transfers submitted");
        }
    }

    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down, draining transfer queue...");

    // Last publisher goes with the state; the workers then drain and exit.
    let stats = state.stats.clone();
    drop(state);
    if dispatcher.join_with_timeout(DRAIN_TIMEOUT).await {
        tracing::info!(stats = ?stats.snapshot(), "Transfer queue drained. Goodbye!");
    } else {
        tracing::warn!(stats = ?stats.snapshot(), "Gave up waiting for queued transfers");
    }

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
