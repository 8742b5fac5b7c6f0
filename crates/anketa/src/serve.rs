// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `anketa serve` command implementation.
//!
//! Startup order matters: the backend health check and the eager state load
//! both run before the webhook server binds, so a broken backend aborts the
//! process instead of serving traffic over silently-empty state. Once the
//! server is up, backend trouble only ever degrades to retried writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use anketa_config::model::AnketaConfig;
use anketa_config::WritePolicy;
use anketa_core::{AnketaError, PluginAdapter};
use anketa_gateway::{start_server, GatewayState};
use anketa_persistence::{PostgrestBackend, StateStore};
use anketa_telegram::{Dispatcher, TelegramChannel};

use crate::shutdown;

/// Size of the gateway-to-dispatcher update queue. Telegram retries
/// deliveries, so shedding on overflow is safe.
const UPDATE_QUEUE_CAPACITY: usize = 128;

/// Runs the `anketa serve` command.
pub async fn run_serve(config: AnketaConfig) -> Result<(), AnketaError> {
    // Initialize tracing subscriber.
    init_tracing(&config.bot.log_level);

    info!("starting anketa serve");

    let webhook_secret = config.gateway.webhook_secret.clone().ok_or_else(|| {
        AnketaError::Config(
            "gateway.webhook_secret is required to serve. Set via: config or ANKETA_GATEWAY_WEBHOOK_SECRET".into(),
        )
    })?;

    // Initialize storage: construct, health check, eager load. All fatal.
    let backend = Arc::new(PostgrestBackend::new(&config.backend).map_err(|e| {
        error!(error = %e, "failed to initialize state backend");
        eprintln!(
            "error: backend configuration incomplete. Set backend.url and backend.service_key."
        );
        e
    })?);
    let store = Arc::new(StateStore::new(
        backend,
        &config.backend,
        &config.persistence,
    ));

    store.health_check().await.map_err(|e| {
        error!(error = %e, "backend health check failed, refusing to start");
        e
    })?;
    info!(table = config.backend.table.as_str(), "backend health check passed");

    store.load_all().await.map_err(|e| {
        error!(error = %e, "startup state load failed, refusing to start");
        e
    })?;

    // Initialize the Telegram channel.
    let channel = TelegramChannel::new(&config.telegram).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram channel");
        eprintln!(
            "error: Telegram bot token required. Set via: config or ANKETA_TELEGRAM_BOT_TOKEN"
        );
        e
    })?;

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Spawn the update dispatcher.
    let (update_tx, update_rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);
    let dispatcher = Dispatcher::new(channel.bot(), store.clone(), &config.bot);
    let dispatcher_handle = tokio::spawn(dispatcher.run(update_rx, cancel.clone()));

    // Spawn the periodic flush task when deferring writes.
    if config.persistence.write_policy == WritePolicy::WriteBack {
        let flush_store = store.clone();
        let flush_cancel = cancel.clone();
        let interval_secs = config.persistence.flush_interval_secs;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            // Skip the first immediate tick.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        flush_store.flush().await;
                    }
                    _ = flush_cancel.cancelled() => {
                        info!("flush task shutting down");
                        break;
                    }
                }
            }
        });
        info!(interval_secs, "write-back flush task started");
    } else {
        debug!("write-through policy, no flush task needed");
    }

    // Serve the webhook until shutdown is requested.
    let state = GatewayState::new(update_tx, webhook_secret);
    start_server(&config.gateway, state, cancel.clone()).await?;

    // Graceful shutdown: stop the dispatcher, then flush remaining state.
    cancel.cancel();
    if let Err(e) = dispatcher_handle.await {
        error!(error = %e, "dispatcher task panicked");
    }
    store.shutdown().await?;
    channel.shutdown().await?;

    info!("anketa serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("anketa={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
