// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the anketa bot.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the anketa workspace. The persistence store
//! and its backends implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AnketaError;
pub use types::{AdapterType, ConversationKey, HealthStatus, RecordKind, RecordMap, RecordRef};

pub use traits::{PluginAdapter, StateBackend, StateRow};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn anketa_error_has_all_variants() {
        let _config = AnketaError::Config("test".into());
        let _backend = AnketaError::Backend {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _channel = AnketaError::Channel {
            message: "test".into(),
            source: None,
        };
        let _health = AnketaError::HealthCheckFailed {
            name: "test".into(),
            reason: "unreachable".into(),
        };
        let _internal = AnketaError::Internal("test".into());
    }

    #[test]
    fn record_kind_display_matches_row_id_segments() {
        assert_eq!(RecordKind::UserData.to_string(), "user_data");
        assert_eq!(RecordKind::ChatData.to_string(), "chat_data");
        assert_eq!(RecordKind::BotData.to_string(), "bot_data");
        assert_eq!(RecordKind::Conversations.to_string(), "conversations");
        assert_eq!(RecordKind::CallbackData.to_string(), "callback_data");
    }

    #[test]
    fn record_kind_round_trips_through_from_str() {
        for kind in RecordKind::ALL {
            let s = kind.to_string();
            let parsed = RecordKind::from_str(&s).expect("should parse back");
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn record_ref_maps_to_its_kind() {
        assert_eq!(RecordRef::User(1).kind(), RecordKind::UserData);
        assert_eq!(RecordRef::Chat(-100).kind(), RecordKind::ChatData);
        assert_eq!(RecordRef::Bot.kind(), RecordKind::BotData);
        assert_eq!(RecordRef::CallbackData.kind(), RecordKind::CallbackData);
    }

    #[test]
    fn conversation_key_distinguishes_no_thread_from_thread_zero() {
        let bare = ConversationKey::for_chat(100);
        let zero = ConversationKey::new(100, Some(0));
        assert_ne!(bare, zero);
    }

    #[test]
    fn state_row_serializes_to_wire_shape() {
        let row = StateRow::new("main:bot_data", serde_json::json!({"greeted": 3}));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], "main:bot_data");
        assert_eq!(json["data"]["greeted"], 3);
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }
}
