// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the anketa bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level anketa configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values; the keys required
/// to actually serve (bot token, backend url/key, webhook secret) are checked
/// by `serve` at startup rather than at load time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnketaConfig {
    /// Bot identity and behavior settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram Bot API settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Remote state-table backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Persistence store behavior settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Webhook gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Bot identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Minimum interval between handled messages per user, in milliseconds.
    /// Messages arriving faster are dropped.
    #[serde(default = "default_throttle_interval_ms")]
    pub throttle_interval_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            throttle_interval_ms: default_throttle_interval_ms(),
        }
    }
}

fn default_bot_name() -> String {
    "anketa".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_throttle_interval_ms() -> u64 {
    1000
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` means `serve` cannot start.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// Remote state-table backend configuration.
///
/// Points at a hosted Postgres service exposing the PostgREST row API
/// (Supabase). The table holds opaque `(id, data)` rows.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base project URL, e.g. `https://xyzcompany.supabase.co`.
    #[serde(default)]
    pub url: Option<String>,

    /// Service-role API key used for both `apikey` and bearer auth headers.
    #[serde(default)]
    pub service_key: Option<String>,

    /// Name of the state table.
    #[serde(default = "default_table")]
    pub table: String,

    /// Namespace prefix for row ids, so several bots can share one table.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            table: default_table(),
            prefix: default_prefix(),
        }
    }
}

fn default_table() -> String {
    "bot_state".to_string()
}

fn default_prefix() -> String {
    "main".to_string()
}

/// Whether a mutation is persisted synchronously or deferred to a later flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Every mutation is mirrored to the backend before the handler returns.
    #[default]
    WriteThrough,
    /// Mutations accumulate in memory and are persisted by the periodic
    /// flush task and at shutdown.
    WriteBack,
}

/// Persistence store behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PersistenceConfig {
    /// Write policy for record mutations.
    #[serde(default)]
    pub write_policy: WritePolicy,

    /// Flush interval in seconds. Only used with the write-back policy.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::default(),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }
}

fn default_flush_interval_secs() -> u64 {
    30
}

/// Webhook gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind the webhook server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the webhook server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path secret for the webhook endpoint (`POST /webhook/{secret}`).
    /// `None` means `serve` cannot start.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_secret: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}
