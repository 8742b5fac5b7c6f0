// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command parsing and the plain command/text handlers.
//!
//! Anything that is not a recognized command and not part of an active
//! conversation falls through to the echo handler, mirroring the bot's
//! original behavior.

use serde_json::json;
use teloxide::prelude::*;
use teloxide::types::ChatId;

use anketa_core::{AnketaError, RecordRef};

use crate::dispatch::BotContext;
use crate::send_text;

/// Commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Survey,
    Cancel,
}

/// Parse a leading bot command out of message text.
///
/// Accepts the `/command@botname` form Telegram uses in groups; the bot
/// name suffix is ignored. Unknown commands return `None` and fall through
/// to the echo/conversation path.
pub fn parse(text: &str) -> Option<Command> {
    let first = text.trim().split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    let command = command.split('@').next().unwrap_or(command);

    match command {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "survey" => Some(Command::Survey),
        "cancel" => Some(Command::Cancel),
        _ => None,
    }
}

/// `/start`: greet the user and bump the bot-wide greeting counter.
pub async fn start(ctx: &BotContext, chat_id: ChatId) -> Result<(), AnketaError> {
    let mut bot_data = ctx.store.load(RecordRef::Bot).await;
    let greeted = bot_data
        .get("users_greeted")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0);
    bot_data.insert("users_greeted".to_string(), json!(greeted + 1));
    ctx.store.save(RecordRef::Bot, bot_data).await;

    let text = format!(
        "Hi! I'm {}. Send /survey to tell me about yourself, or /help for the command list.",
        ctx.bot_name
    );
    send_text(&ctx.bot, chat_id, &text).await
}

/// `/help`: list the available commands.
pub async fn help(ctx: &BotContext, chat_id: ChatId) -> Result<(), AnketaError> {
    send_text(
        &ctx.bot,
        chat_id,
        "/start - greeting\n/survey - start the survey\n/cancel - abort the survey\n/help - this message",
    )
    .await
}

/// Echo handler for plain text outside a conversation.
pub async fn echo(ctx: &BotContext, chat_id: ChatId, text: &str) -> Result<(), AnketaError> {
    let reply = format!("You said: {text}");
    send_text(&ctx.bot, chat_id, &reply).await
}
