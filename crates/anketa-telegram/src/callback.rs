// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline-keyboard callback payload shortening.
//!
//! Telegram caps `callback_data` at 64 bytes, so buttons carry a generated
//! id and the real JSON payload lives in the callback-data record. Payloads
//! carry the chat id they belong to, so finished flows can prune every
//! button they handed out for that chat.

use serde_json::Value;

use anketa_core::RecordRef;
use anketa_persistence::StateStore;

/// Store a payload under a fresh short id and return the id.
///
/// The id is a 32-character hex UUID, comfortably inside Telegram's
/// 64-byte callback_data limit.
pub async fn shorten(store: &StateStore, payload: Value) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let mut cache = store.load(RecordRef::CallbackData).await;
    cache.insert(id.clone(), payload);
    store.save(RecordRef::CallbackData, cache).await;
    id
}

/// Look up the payload behind a callback id, if it is still known.
pub async fn resolve(store: &StateStore, id: &str) -> Option<Value> {
    store.load(RecordRef::CallbackData).await.get(id).cloned()
}

/// Remove every stored payload belonging to the given chat.
///
/// Called when a flow finishes so stale buttons in old messages answer
/// with "expired" instead of re-running the flow.
pub async fn prune_chat(store: &StateStore, chat_id: i64) {
    let mut cache = store.load(RecordRef::CallbackData).await;
    let before = cache.len();
    cache.retain(|_, payload| payload.get("chat_id").and_then(Value::as_i64) != Some(chat_id));
    if cache.len() != before {
        store.save(RecordRef::CallbackData, cache).await;
    }
}
