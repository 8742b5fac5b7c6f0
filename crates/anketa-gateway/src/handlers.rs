// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! The webhook handler acknowledges with 200 for every authenticated
//! request, even when the update is shed (unparseable payload, full queue):
//! a non-2xx answer would make Telegram re-deliver an update we have
//! already decided to drop.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use teloxide::types::Update;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::server::GatewayState;

/// Response body for `GET /healthz`.
#[derive(Debug, Serialize)]
pub struct HealthzResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_secs: u64,
}

/// Response body for accepted webhook deliveries.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// GET /healthz
///
/// Liveness probe for the deployment platform.
pub async fn healthz(State(state): State<GatewayState>) -> Json<HealthzResponse> {
    debug!("health check requested");
    Json(HealthzResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /webhook/{secret}
///
/// Validates the path secret, parses the Telegram update, and forwards it
/// to the dispatcher.
pub async fn webhook(
    State(state): State<GatewayState>,
    Path(secret): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if secret != state.webhook_secret {
        warn!("webhook called with wrong secret");
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "bad secret".to_string(),
            }),
        )
            .into_response();
    }

    let update: Update = match serde_json::from_value(body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "unparseable update payload, acknowledging anyway");
            return ack();
        }
    };

    match state.update_tx.try_send(update) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!("update queue full, shedding update");
        }
        Err(TrySendError::Closed(_)) => {
            warn!("dispatcher gone, dropping update");
        }
    }

    ack()
}

fn ack() -> Response {
    (StatusCode::OK, Json(AckResponse { ok: true })).into_response()
}
