// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the anketa bot.

use thiserror::Error;

/// The primary error type used across all anketa adapter traits and core operations.
#[derive(Debug, Error)]
pub enum AnketaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// State backend errors (HTTP failure, rejected row write, bad response body).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Channel errors (Telegram API failure, webhook delivery, message format).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {reason}")]
    HealthCheckFailed { name: String, reason: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnketaError {
    /// Shorthand for a backend error wrapping an underlying cause.
    pub fn backend(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for a backend error with no underlying cause.
    pub fn backend_msg(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }
}
