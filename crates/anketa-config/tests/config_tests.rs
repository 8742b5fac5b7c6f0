// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the anketa configuration system.

use anketa_config::model::{AnketaConfig, WritePolicy};
use anketa_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_anketa_config() {
    let toml = r#"
[bot]
name = "test-bot"
log_level = "debug"
throttle_interval_ms = 500

[telegram]
bot_token = "123:ABC"

[backend]
url = "https://xyzcompany.supabase.co"
service_key = "service-role-key"
table = "state_rows"
prefix = "staging"

[persistence]
write_policy = "write-back"
flush_interval_secs = 10

[gateway]
host = "0.0.0.0"
port = 9000
webhook_secret = "s3cret"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "test-bot");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.bot.throttle_interval_ms, 500);
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(
        config.backend.url.as_deref(),
        Some("https://xyzcompany.supabase.co")
    );
    assert_eq!(config.backend.service_key.as_deref(), Some("service-role-key"));
    assert_eq!(config.backend.table, "state_rows");
    assert_eq!(config.backend.prefix, "staging");
    assert_eq!(config.persistence.write_policy, WritePolicy::WriteBack);
    assert_eq!(config.persistence.flush_interval_secs, 10);
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.gateway.webhook_secret.as_deref(), Some("s3cret"));
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let toml = "";
    let config = load_config_from_str(toml).expect("empty TOML should use defaults");

    assert_eq!(config.bot.name, "anketa");
    assert_eq!(config.bot.log_level, "info");
    assert_eq!(config.bot.throttle_interval_ms, 1000);
    assert!(config.telegram.bot_token.is_none());
    assert!(config.backend.url.is_none());
    assert!(config.backend.service_key.is_none());
    assert_eq!(config.backend.table, "bot_state");
    assert_eq!(config.backend.prefix, "main");
    assert_eq!(config.persistence.write_policy, WritePolicy::WriteThrough);
    assert_eq!(config.persistence.flush_interval_secs, 30);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 8080);
    assert!(config.gateway.webhook_secret.is_none());
}

/// Unknown field in [backend] section produces an error.
#[test]
fn unknown_field_in_backend_produces_error() {
    let toml = r#"
[backend]
tabel = "bot_state"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("tabel"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// An invalid write_policy value is rejected at deserialization.
#[test]
fn invalid_write_policy_is_rejected() {
    let toml = r#"
[persistence]
write_policy = "write-sometimes"
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// Environment variable ANKETA_TELEGRAM_BOT_TOKEN maps to telegram.bot_token
/// (NOT telegram.bot.token), exercised via dot-notation merge.
#[test]
fn env_style_override_sets_bot_token() {
    use figment::{providers::Serialized, Figment};

    let config: AnketaConfig = Figment::new()
        .merge(Serialized::defaults(AnketaConfig::default()))
        .merge(("telegram.bot_token", "xyz-from-env"))
        .extract()
        .expect("should set bot_token via dot notation");

    assert_eq!(config.telegram.bot_token.as_deref(), Some("xyz-from-env"));
}

/// load_and_validate_str surfaces validation errors, not just parse errors.
#[test]
fn validate_str_rejects_semantic_errors() {
    let toml = r#"
[backend]
url = "xyzcompany.supabase.co"
"#;

    let errors = load_and_validate_str(toml).expect_err("schemeless url should fail validation");
    assert!(!errors.is_empty());
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[databse]
url = "https://example.com"
"#;

    assert!(load_config_from_str(toml).is_err());
}
