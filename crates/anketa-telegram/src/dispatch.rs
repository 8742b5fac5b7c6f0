// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update routing: throttle, command dispatch, and conversation lookup.
//!
//! The dispatcher drains the update channel fed by the webhook gateway.
//! Handler failures (usually undeliverable replies) are logged and never
//! tear down the loop; Telegram users just see silence for that message.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::UpdateKind;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use anketa_config::model::BotConfig;
use anketa_core::{ConversationKey, RecordRef};
use anketa_persistence::StateStore;

use crate::commands::{self, Command};
use crate::survey;
use crate::throttle::Throttle;

/// State threaded through every handler invocation.
///
/// Handlers own no process-wide mutable state; everything durable lives in
/// the store and is addressed per user/chat.
pub struct BotContext {
    pub bot: Bot,
    pub store: Arc<StateStore>,
    pub bot_name: String,
}

/// Consumes updates from the webhook gateway and routes them to handlers.
pub struct Dispatcher {
    ctx: BotContext,
    throttle: Throttle,
}

impl Dispatcher {
    pub fn new(bot: Bot, store: Arc<StateStore>, config: &BotConfig) -> Self {
        Self {
            ctx: BotContext {
                bot,
                store,
                bot_name: config.name.clone(),
            },
            throttle: Throttle::new(config.throttle_interval_ms),
        }
    }

    /// Run until the update channel closes or shutdown is requested.
    pub async fn run(self, mut updates: mpsc::Receiver<Update>, cancel: CancellationToken) {
        info!("update dispatcher started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("update dispatcher shutting down");
                    break;
                }
                update = updates.recv() => match update {
                    Some(update) => self.dispatch(update).await,
                    None => {
                        info!("update channel closed, dispatcher stopping");
                        break;
                    }
                },
            }
        }
    }

    async fn dispatch(&self, update: Update) {
        match update.kind {
            UpdateKind::Message(msg) => self.handle_message(msg).await,
            UpdateKind::CallbackQuery(query) => {
                if let Err(e) = survey::handle_callback(&self.ctx, query).await {
                    error!(error = %e, "callback handler failed");
                }
            }
            _ => debug!(update_id = update.id.0, "ignoring unsupported update kind"),
        }
    }

    async fn handle_message(&self, msg: Message) {
        let Some(user) = msg.from.as_ref() else {
            debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
            return;
        };
        let user_id = user.id.0 as i64;

        if !self.throttle.allow(user_id) {
            debug!(user_id, "throttled message dropped");
            return;
        }

        let Some(text) = msg.text() else {
            debug!(msg_id = msg.id.0, "ignoring non-text message");
            return;
        };

        let chat_id = msg.chat.id;
        let key = conversation_key(&msg);

        record_visit(&self.ctx, user_id).await;

        let result = match commands::parse(text) {
            Some(Command::Start) => commands::start(&self.ctx, chat_id).await,
            Some(Command::Help) => commands::help(&self.ctx, chat_id).await,
            Some(Command::Survey) => survey::start(&self.ctx, chat_id, key).await,
            Some(Command::Cancel) => survey::cancel(&self.ctx, chat_id, key, user_id).await,
            None => {
                match self
                    .ctx
                    .store
                    .get_conversation_entry(survey::FLOW, key)
                    .await
                {
                    Some(state) => {
                        survey::handle_reply(&self.ctx, chat_id, key, user_id, text, &state).await
                    }
                    None => commands::echo(&self.ctx, chat_id, text).await,
                }
            }
        };

        if let Err(e) = result {
            error!(error = %e, chat_id = chat_id.0, "handler failed");
        }
    }
}

/// The conversation slot a message belongs to: its chat plus the forum
/// topic thread when there is one.
pub fn conversation_key(msg: &Message) -> ConversationKey {
    ConversationKey::new(msg.chat.id.0, msg.thread_id.map(|t| t.0.0 as i64))
}

/// Bump the per-user visit counter in the user record.
pub(crate) async fn record_visit(ctx: &BotContext, user_id: i64) {
    let mut user = ctx.store.load(RecordRef::User(user_id)).await;
    let visits = user
        .get("visits")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0);
    user.insert("visits".to_string(), serde_json::json!(visits + 1));
    ctx.store.save(RecordRef::User(user_id), user).await;
}
