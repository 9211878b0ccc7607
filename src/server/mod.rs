//! HTTP API for the generation pipeline.
//!
//! Endpoints:
//! - `POST /api/payment-text`            — payment method description text
//! - `POST /api/requirements`            — requirements list for a quotation
//! - `POST /api/requirement-suggestions` — requirement options for the quote form
//! - `POST /api/need-suggestions`        — client-need options for the quote form
//! - `POST /api/time-suggestions`        — delivery-time options for the quote form
//! - `POST /api/quote-short`             — short quotation text
//! - `POST /api/quote-detailed`          — detailed, structured quotation text
//! - `POST /api/market-estimate`         — three-stage market fee estimate
//! - `GET  /health`                      — readiness and provider wiring

pub mod handlers;
pub mod health;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use tracing::{info, warn};

use crate::pipeline::Orchestrator;

/// Shared state handed to every route handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the API router with all routes attached
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/api/payment-text", post(handlers::payment_text))
        .route("/api/requirements", post(handlers::requirements))
        .route(
            "/api/requirement-suggestions",
            post(handlers::requirement_suggestions),
        )
        .route("/api/need-suggestions", post(handlers::need_suggestions))
        .route("/api/time-suggestions", post(handlers::time_suggestions))
        .route("/api/quote-short", post(handlers::quote_short))
        .route("/api/quote-detailed", post(handlers::quote_detailed))
        .route("/api/market-estimate", post(handlers::market_estimate))
        .route("/health", get(health::health_check))
        .with_state(AppState { orchestrator })
}

/// Bind the listener and serve the API until interrupted
pub async fn serve(bind: &str, port: u16, orchestrator: Arc<Orchestrator>) -> anyhow::Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Listening on http://{addr}");
    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received, draining connections");
}
