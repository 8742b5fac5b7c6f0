// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the anketa workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A string-keyed JSON object, the value shape of every stored record.
pub type RecordMap = serde_json::Map<String, serde_json::Value>;

/// The five kinds of records the persistence store manages.
///
/// Each kind is backed by exactly one row in the remote table, identified
/// by `"{prefix}:{kind}"` (e.g. `main:user_data`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    UserData,
    ChatData,
    BotData,
    Conversations,
    CallbackData,
}

impl RecordKind {
    /// All kinds, in the order they are loaded and flushed.
    pub const ALL: [RecordKind; 5] = [
        RecordKind::UserData,
        RecordKind::ChatData,
        RecordKind::BotData,
        RecordKind::Conversations,
        RecordKind::CallbackData,
    ];
}

/// Addresses one record: a keyed entry for per-user/per-chat kinds, or the
/// singleton for bot-wide and callback-data records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordRef {
    User(i64),
    Chat(i64),
    Bot,
    CallbackData,
}

impl RecordRef {
    /// The record kind this reference addresses.
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordRef::User(_) => RecordKind::UserData,
            RecordRef::Chat(_) => RecordKind::ChatData,
            RecordRef::Bot => RecordKind::BotData,
            RecordRef::CallbackData => RecordKind::CallbackData,
        }
    }
}

/// Identifies one conversation-state slot: a chat plus an optional topic
/// thread. `thread_id: None` (a plain chat) and `thread_id: Some(0)` are
/// distinct keys and must never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub chat_id: i64,
    pub thread_id: Option<i64>,
}

impl ConversationKey {
    pub fn new(chat_id: i64, thread_id: Option<i64>) -> Self {
        Self { chat_id, thread_id }
    }

    /// Key for a conversation in a chat without a topic thread.
    pub fn for_chat(chat_id: i64) -> Self {
        Self {
            chat_id,
            thread_id: None,
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Gateway,
}
