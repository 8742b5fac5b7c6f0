// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the survey conversation flow.
//!
//! The Bot API is mocked with wiremock (teloxide's api_url is pointed at
//! the mock server) and the store runs over the in-memory mock backend, so
//! each test drives real handlers through a full dialogue and then asserts
//! on the durable state they left behind.

use std::sync::Arc;

use serde_json::{json, Value};
use teloxide::types::{CallbackQuery, ChatId};
use teloxide::Bot;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use anketa_config::model::{BackendConfig, PersistenceConfig};
use anketa_core::{ConversationKey, RecordRef};
use anketa_persistence::StateStore;
use anketa_telegram::{survey, BotContext};
use anketa_test_utils::MockBackend;

const TOKEN: &str = "test:token";
const CHAT: i64 = 100;
const USER: i64 = 500;

/// A syntactically valid sendMessage result for teloxide to parse.
fn sent_message_body() -> Value {
    json!({
        "ok": true,
        "result": {
            "message_id": 99,
            "date": 1700000000i64,
            "chat": {
                "id": CHAT,
                "type": "private",
                "first_name": "Test",
            },
            "text": "reply",
        },
    })
}

/// Mock Bot API server answering sendMessage and answerCallbackQuery.
async fn mock_bot_api() -> MockServer {
    let server = MockServer::start().await;

    // Telegram method names are matched case-insensitively; teloxide's
    // casing is an implementation detail.
    Mock::given(method("POST"))
        .and(path_regex("(?i)/sendmessage$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/answercallbackquery$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
        .mount(&server)
        .await;

    server
}

fn make_context(api_url: &str) -> BotContext {
    let store = StateStore::new(
        Arc::new(MockBackend::new()),
        &BackendConfig::default(),
        &PersistenceConfig::default(),
    );
    let bot = Bot::new(TOKEN).set_api_url(reqwest::Url::parse(api_url).unwrap());
    BotContext {
        bot,
        store: Arc::new(store),
        bot_name: "anketa".to_string(),
    }
}

/// Walk the dialogue up to the confirmation step.
async fn run_to_confirm(ctx: &BotContext, key: ConversationKey) {
    survey::start(ctx, ChatId(CHAT), key).await.unwrap();
    survey::handle_reply(ctx, ChatId(CHAT), key, USER, "Alice", &json!("ask_name"))
        .await
        .unwrap();
    survey::handle_reply(ctx, ChatId(CHAT), key, USER, "Berlin", &json!("ask_city"))
        .await
        .unwrap();
}

/// Find the shortened callback id carrying the given action.
async fn callback_id_for(ctx: &BotContext, action: &str) -> String {
    let cache = ctx.store.load(RecordRef::CallbackData).await;
    cache
        .iter()
        .find(|(_, payload)| payload.get("action").and_then(Value::as_str) == Some(action))
        .map(|(id, _)| id.clone())
        .expect("confirmation should have stored a callback payload")
}

fn make_callback_query(data: &str) -> CallbackQuery {
    serde_json::from_value(json!({
        "id": "cbq-1",
        "from": {
            "id": USER as u64,
            "is_bot": false,
            "first_name": "Alice",
        },
        "chat_instance": "ci-1",
        "data": data,
    }))
    .expect("failed to deserialize mock callback query")
}

#[tokio::test]
async fn answers_accumulate_and_state_advances() {
    let server = mock_bot_api().await;
    let ctx = make_context(&server.uri());
    let key = ConversationKey::for_chat(CHAT);

    survey::start(&ctx, ChatId(CHAT), key).await.unwrap();
    assert_eq!(
        ctx.store.get_conversation_entry(survey::FLOW, key).await,
        Some(json!("ask_name"))
    );

    survey::handle_reply(&ctx, ChatId(CHAT), key, USER, "Alice", &json!("ask_name"))
        .await
        .unwrap();
    assert_eq!(
        ctx.store.get_conversation_entry(survey::FLOW, key).await,
        Some(json!("ask_city"))
    );

    survey::handle_reply(&ctx, ChatId(CHAT), key, USER, "Berlin", &json!("ask_city"))
        .await
        .unwrap();
    assert_eq!(
        ctx.store.get_conversation_entry(survey::FLOW, key).await,
        Some(json!("confirm"))
    );

    let user = ctx.store.load(RecordRef::User(USER)).await;
    assert_eq!(user["draft_name"], json!("Alice"));
    assert_eq!(user["draft_city"], json!("Berlin"));
}

#[tokio::test]
async fn saving_promotes_drafts_and_ends_the_conversation() {
    let server = mock_bot_api().await;
    let ctx = make_context(&server.uri());
    let key = ConversationKey::for_chat(CHAT);

    run_to_confirm(&ctx, key).await;
    let save_id = callback_id_for(&ctx, "save").await;

    survey::handle_callback(&ctx, make_callback_query(&save_id))
        .await
        .unwrap();

    let user = ctx.store.load(RecordRef::User(USER)).await;
    assert_eq!(user["name"], json!("Alice"));
    assert_eq!(user["city"], json!("Berlin"));
    assert!(user.get("draft_name").is_none());
    assert!(user.get("draft_city").is_none());

    assert!(ctx
        .store
        .get_conversation_entry(survey::FLOW, key)
        .await
        .is_none());

    let chat = ctx.store.load(RecordRef::Chat(CHAT)).await;
    assert_eq!(chat["surveys_completed"], json!(1));

    // Both confirmation buttons were pruned.
    assert!(ctx.store.load(RecordRef::CallbackData).await.is_empty());
}

#[tokio::test]
async fn discarding_drops_drafts_without_saving() {
    let server = mock_bot_api().await;
    let ctx = make_context(&server.uri());
    let key = ConversationKey::for_chat(CHAT);

    run_to_confirm(&ctx, key).await;
    let discard_id = callback_id_for(&ctx, "discard").await;

    survey::handle_callback(&ctx, make_callback_query(&discard_id))
        .await
        .unwrap();

    let user = ctx.store.load(RecordRef::User(USER)).await;
    assert!(user.get("name").is_none());
    assert!(user.get("draft_name").is_none());
    assert!(ctx
        .store
        .get_conversation_entry(survey::FLOW, key)
        .await
        .is_none());
    assert!(ctx.store.load(RecordRef::Chat(CHAT)).await.is_empty());
}

#[tokio::test]
async fn cancel_mid_survey_clears_the_slot() {
    let server = mock_bot_api().await;
    let ctx = make_context(&server.uri());
    let key = ConversationKey::for_chat(CHAT);

    survey::start(&ctx, ChatId(CHAT), key).await.unwrap();
    survey::handle_reply(&ctx, ChatId(CHAT), key, USER, "Alice", &json!("ask_name"))
        .await
        .unwrap();

    survey::cancel(&ctx, ChatId(CHAT), key, USER).await.unwrap();

    assert!(ctx
        .store
        .get_conversation_entry(survey::FLOW, key)
        .await
        .is_none());
    let user = ctx.store.load(RecordRef::User(USER)).await;
    assert!(user.get("draft_name").is_none());
}

#[tokio::test]
async fn expired_button_is_answered_without_side_effects() {
    let server = mock_bot_api().await;
    let ctx = make_context(&server.uri());

    survey::handle_callback(&ctx, make_callback_query("deadbeef"))
        .await
        .unwrap();

    assert!(ctx.store.load(RecordRef::User(USER)).await.is_empty());
    assert!(ctx.store.load(RecordRef::Chat(CHAT)).await.is_empty());
}
