// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./anketa.toml` > `~/.config/anketa/anketa.toml` > `/etc/anketa/anketa.toml`
//! with environment variable overrides via `ANKETA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AnketaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/anketa/anketa.toml` (system-wide)
/// 3. `~/.config/anketa/anketa.toml` (user XDG config)
/// 4. `./anketa.toml` (local directory)
/// 5. `ANKETA_*` environment variables
pub fn load_config() -> Result<AnketaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and for loading an explicit config snippet.
pub fn load_config_from_str(toml_content: &str) -> Result<AnketaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AnketaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AnketaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AnketaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AnketaConfig::default()))
        .merge(Toml::file("/etc/anketa/anketa.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("anketa/anketa.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("anketa.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `ANKETA_TELEGRAM_BOT_TOKEN`
/// must map to `telegram.bot_token`, not `telegram.bot.token`. Only the
/// leading segment is treated as a section, so the `bot` section never
/// swallows the `bot_` inside other keys.
fn env_provider() -> Env {
    Env::prefixed("ANKETA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: ANKETA_BACKEND_SERVICE_KEY -> "backend_service_key"
        let key_str = key.as_str();
        for section in ["bot", "telegram", "backend", "persistence", "gateway"] {
            if let Some(rest) = key_str.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
