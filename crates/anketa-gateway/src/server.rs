// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the webhook endpoint.

use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use teloxide::types::Update;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use anketa_config::model::GatewayConfig;
use anketa_core::AnketaError;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Channel for forwarding updates to the dispatcher.
    pub update_tx: mpsc::Sender<Update>,
    /// Expected path secret for the webhook endpoint.
    pub webhook_secret: String,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(update_tx: mpsc::Sender<Update>, webhook_secret: impl Into<String>) -> Self {
        Self {
            update_tx,
            webhook_secret: webhook_secret.into(),
            start_time: Instant::now(),
        }
    }
}

/// Build the gateway router:
/// - `GET /healthz` (unauthenticated liveness probe)
/// - `POST /webhook/{secret}` (Telegram update delivery)
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/webhook/{secret}", post(handlers::webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the gateway until shutdown is requested.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), AnketaError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AnketaError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("webhook gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| AnketaError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
