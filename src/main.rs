//! Tennis Score Server - live scoring for best-of-three tennis matches
//!
//! This is the main entry point for the server. It handles:
//! - HTTP endpoints for creating, reading and scoring matches
//! - Match persistence on Supabase (or in memory for local development)
//! - The daily email summary of completed matches

mod app;
mod config;
mod digest;
mod http;
mod matches;
mod scoring;
mod store;
mod util;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::digest::DigestJob;
use crate::http::build_router;
use crate::util::time::init_server_time;

/// How often idle per-match rate limiter entries are dropped
const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Tennis Score Server");
    info!("Server address: {}", config.server_addr);

    // Create application state
    let state = AppState::new(config.clone());
    info!(store = state.matches.store().backend(), "Match store ready");

    // Spawn daily digest
    match &config.digest {
        Some(digest_config) => {
            let job = DigestJob::new(state.matches.store().clone(), digest_config);
            tokio::spawn(job.run());
        }
        None => warn!("SUMMARY_RECIPIENT_EMAIL not set, daily digest disabled"),
    }

    // Sweep rate limiter state for matches nobody is scoring
    let limiter = state.score_limiter.clone();
    tokio::spawn(async move {
        let mut sweep = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
        loop {
            sweep.tick().await;
            limiter.retain_recent();
        }
    });

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
