// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel for the anketa bot.
//!
//! Owns the teloxide [`Bot`] handle and the update [`dispatch`] loop that
//! the webhook gateway feeds. Handlers live in [`commands`] and [`survey`];
//! all durable state goes through the persistence store.

pub mod callback;
pub mod commands;
pub mod dispatch;
pub mod survey;
pub mod throttle;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::debug;

use anketa_config::model::TelegramConfig;
use anketa_core::{AdapterType, AnketaError, HealthStatus, PluginAdapter};

pub use dispatch::{BotContext, Dispatcher};

/// Telegram channel adapter wrapping the Bot API client.
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    /// Creates a new Telegram channel.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, AnketaError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            AnketaError::Config("telegram.bot_token is required to run the bot".into())
        })?;

        if token.is_empty() {
            return Err(AnketaError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// Returns a clone of the underlying teloxide Bot handle.
    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, AnketaError> {
        // Check that the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), AnketaError> {
        debug!("Telegram channel shutting down");
        Ok(())
    }
}

/// Send a plain-text reply, mapping the Bot API error into [`AnketaError`].
pub(crate) async fn send_text(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
) -> Result<(), AnketaError> {
    bot.send_message(chat_id, text)
        .await
        .map_err(|e| AnketaError::Channel {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        })?;
    Ok(())
}
