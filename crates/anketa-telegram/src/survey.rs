// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The survey conversation flow.
//!
//! A three-step dialogue per chat: ask for a name, ask for a city, then
//! confirm with an inline keyboard. The current step lives in the store's
//! conversation table under the `survey` flow; draft answers accumulate in
//! the user record and are promoted to final fields on save. Ending the
//! conversation writes the absent state, which removes the entry.

use std::str::FromStr;

use serde_json::{json, Value};
use strum::{Display, EnumString};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{debug, warn};

use anketa_core::{AnketaError, ConversationKey, RecordRef};

use crate::dispatch::BotContext;
use crate::{callback, send_text};

/// Name of this conversation flow in the store's conversation table.
pub const FLOW: &str = "survey";

/// Steps of the survey dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SurveyState {
    AskName,
    AskCity,
    Confirm,
}

impl SurveyState {
    /// Encode the step as the opaque state value stored in the table.
    pub fn to_value(self) -> Value {
        Value::String(self.to_string())
    }

    /// Decode a stored state value back into a step.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(|s| Self::from_str(s).ok())
    }
}

/// The question the bot asks when entering a step.
fn prompt(state: SurveyState) -> &'static str {
    match state {
        SurveyState::AskName => "What's your name?",
        SurveyState::AskCity => "Which city are you in?",
        SurveyState::Confirm => "Save these answers?",
    }
}

/// `/survey`: enter the flow at the first step.
pub async fn start(
    ctx: &BotContext,
    chat_id: ChatId,
    key: ConversationKey,
) -> Result<(), AnketaError> {
    ctx.store
        .set_conversation_entry(FLOW, key, Some(SurveyState::AskName.to_value()))
        .await;
    send_text(&ctx.bot, chat_id, prompt(SurveyState::AskName)).await
}

/// `/cancel`: leave the flow, discarding drafts.
pub async fn cancel(
    ctx: &BotContext,
    chat_id: ChatId,
    key: ConversationKey,
    user_id: i64,
) -> Result<(), AnketaError> {
    let active = ctx.store.get_conversation_entry(FLOW, key).await.is_some();
    if !active {
        return send_text(&ctx.bot, chat_id, "Nothing to cancel.").await;
    }

    discard_drafts(ctx, user_id).await;
    ctx.store.set_conversation_entry(FLOW, key, None).await;
    callback::prune_chat(&ctx.store, chat_id.0).await;
    send_text(&ctx.bot, chat_id, "Survey cancelled.").await
}

/// A text reply while the conversation is active.
pub async fn handle_reply(
    ctx: &BotContext,
    chat_id: ChatId,
    key: ConversationKey,
    user_id: i64,
    text: &str,
    state_value: &Value,
) -> Result<(), AnketaError> {
    let Some(state) = SurveyState::from_value(state_value) else {
        // A stored state this build no longer knows. Reset rather than trap
        // the user in an unanswerable step.
        warn!(state = %state_value, "unknown survey state, resetting conversation");
        ctx.store.set_conversation_entry(FLOW, key, None).await;
        return send_text(&ctx.bot, chat_id, "Something went stale. Send /survey to start over.")
            .await;
    };

    match state {
        SurveyState::AskName => {
            save_draft(ctx, user_id, "draft_name", text).await;
            ctx.store
                .set_conversation_entry(FLOW, key, Some(SurveyState::AskCity.to_value()))
                .await;
            let reply = format!("Nice to meet you, {text}! {}", prompt(SurveyState::AskCity));
            send_text(&ctx.bot, chat_id, &reply).await
        }
        SurveyState::AskCity => {
            save_draft(ctx, user_id, "draft_city", text).await;
            ctx.store
                .set_conversation_entry(FLOW, key, Some(SurveyState::Confirm.to_value()))
                .await;
            send_confirmation(ctx, chat_id, key, user_id).await
        }
        SurveyState::Confirm => {
            send_text(
                &ctx.bot,
                chat_id,
                "Use the buttons above, or /cancel to abort.",
            )
            .await
        }
    }
}

/// Send the summary with Save/Discard inline buttons.
///
/// The callback payloads carry the full conversation key (chat + optional
/// thread) so the button press resolves the same slot the dialogue ran in.
async fn send_confirmation(
    ctx: &BotContext,
    chat_id: ChatId,
    key: ConversationKey,
    user_id: i64,
) -> Result<(), AnketaError> {
    let user = ctx.store.load(RecordRef::User(user_id)).await;
    let name = user.get("draft_name").and_then(Value::as_str).unwrap_or("-");
    let city = user.get("draft_city").and_then(Value::as_str).unwrap_or("-");

    let save_id = callback::shorten(
        &ctx.store,
        json!({
            "flow": FLOW,
            "action": "save",
            "chat_id": chat_id.0,
            "thread_id": key.thread_id,
            "user_id": user_id,
        }),
    )
    .await;
    let discard_id = callback::shorten(
        &ctx.store,
        json!({
            "flow": FLOW,
            "action": "discard",
            "chat_id": chat_id.0,
            "thread_id": key.thread_id,
            "user_id": user_id,
        }),
    )
    .await;

    let keyboard = InlineKeyboardMarkup::new([[
        InlineKeyboardButton::callback("Save", save_id),
        InlineKeyboardButton::callback("Discard", discard_id),
    ]]);

    let text = format!(
        "Name: {name}\nCity: {city}\n{}",
        prompt(SurveyState::Confirm)
    );
    ctx.bot
        .send_message(chat_id, text)
        .reply_markup(keyboard)
        .await
        .map_err(|e| AnketaError::Channel {
            message: format!("failed to send confirmation: {e}"),
            source: Some(Box::new(e)),
        })?;
    Ok(())
}

/// A pressed inline button, routed here for any flow.
pub async fn handle_callback(ctx: &BotContext, query: CallbackQuery) -> Result<(), AnketaError> {
    let answer = ctx.bot.answer_callback_query(query.id.clone());

    let Some(ref data) = query.data else {
        answer.await.map_err(channel_err)?;
        return Ok(());
    };

    let Some(payload) = callback::resolve(&ctx.store, data).await else {
        debug!(id = data.as_str(), "expired callback id");
        answer.text("This button has expired.").await.map_err(channel_err)?;
        return Ok(());
    };

    let chat_id = match payload.get("chat_id").and_then(Value::as_i64) {
        Some(id) => ChatId(id),
        None => {
            warn!("callback payload without chat_id, ignoring");
            answer.await.map_err(channel_err)?;
            return Ok(());
        }
    };
    let user_id = payload
        .get("user_id")
        .and_then(Value::as_i64)
        .unwrap_or(query.from.id.0 as i64);
    let thread_id = payload.get("thread_id").and_then(Value::as_i64);
    let key = ConversationKey::new(chat_id.0, thread_id);

    match payload.get("action").and_then(Value::as_str) {
        Some("save") => {
            promote_drafts(ctx, user_id).await;
            bump_chat_counter(ctx, chat_id.0).await;
            ctx.store.set_conversation_entry(FLOW, key, None).await;
            callback::prune_chat(&ctx.store, chat_id.0).await;
            answer.await.map_err(channel_err)?;
            send_text(&ctx.bot, chat_id, "Saved. Thanks!").await
        }
        Some("discard") => {
            discard_drafts(ctx, user_id).await;
            ctx.store.set_conversation_entry(FLOW, key, None).await;
            callback::prune_chat(&ctx.store, chat_id.0).await;
            answer.await.map_err(channel_err)?;
            send_text(&ctx.bot, chat_id, "Discarded.").await
        }
        other => {
            warn!(action = ?other, "unknown callback action");
            answer.await.map_err(channel_err)?;
            Ok(())
        }
    }
}

// ---- User/chat record helpers ----

async fn save_draft(ctx: &BotContext, user_id: i64, field: &str, value: &str) {
    let mut user = ctx.store.load(RecordRef::User(user_id)).await;
    user.insert(field.to_string(), json!(value));
    ctx.store.save(RecordRef::User(user_id), user).await;
}

/// Move draft answers into their final fields.
async fn promote_drafts(ctx: &BotContext, user_id: i64) {
    let mut user = ctx.store.load(RecordRef::User(user_id)).await;
    if let Some(name) = user.remove("draft_name") {
        user.insert("name".to_string(), name);
    }
    if let Some(city) = user.remove("draft_city") {
        user.insert("city".to_string(), city);
    }
    ctx.store.save(RecordRef::User(user_id), user).await;
}

async fn discard_drafts(ctx: &BotContext, user_id: i64) {
    let mut user = ctx.store.load(RecordRef::User(user_id)).await;
    user.remove("draft_name");
    user.remove("draft_city");
    ctx.store.save(RecordRef::User(user_id), user).await;
}

/// Count completed surveys per chat.
async fn bump_chat_counter(ctx: &BotContext, chat_id: i64) {
    let mut chat = ctx.store.load(RecordRef::Chat(chat_id)).await;
    let done = chat
        .get("surveys_completed")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    chat.insert("surveys_completed".to_string(), json!(done + 1));
    ctx.store.save(RecordRef::Chat(chat_id), chat).await;
}

fn channel_err(e: teloxide::RequestError) -> AnketaError {
    AnketaError::Channel {
        message: format!("failed to answer callback query: {e}"),
        source: Some(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_values_round_trip() {
        for state in [
            SurveyState::AskName,
            SurveyState::AskCity,
            SurveyState::Confirm,
        ] {
            let value = state.to_value();
            assert_eq!(SurveyState::from_value(&value), Some(state));
        }
    }

    #[test]
    fn state_encodes_as_snake_case_strings() {
        assert_eq!(SurveyState::AskName.to_value(), json!("ask_name"));
        assert_eq!(SurveyState::AskCity.to_value(), json!("ask_city"));
        assert_eq!(SurveyState::Confirm.to_value(), json!("confirm"));
    }

    #[test]
    fn unknown_state_value_decodes_to_none() {
        assert_eq!(SurveyState::from_value(&json!("ask_shoe_size")), None);
        assert_eq!(SurveyState::from_value(&json!(42)), None);
        assert_eq!(SurveyState::from_value(&Value::Null), None);
    }

    #[test]
    fn every_state_has_a_prompt() {
        for state in [
            SurveyState::AskName,
            SurveyState::AskCity,
            SurveyState::Confirm,
        ] {
            assert!(!prompt(state).is_empty());
        }
    }
}
