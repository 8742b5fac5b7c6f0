// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty table names, and a
//! usable backend URL.

use crate::diagnostic::ConfigError;
use crate::model::AnketaConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AnketaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate gateway.host is not empty
    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    }

    // Validate gateway.host looks like a valid IP or hostname
    if !config.gateway.host.trim().is_empty() {
        let addr = config.gateway.host.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "gateway.host `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    // Validate backend.url carries an http(s) scheme when set
    if let Some(ref url) = config.backend.url
        && !url.starts_with("http://")
        && !url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!("backend.url `{url}` must start with http:// or https://"),
        });
    }

    // Validate backend.table is not empty
    if config.backend.table.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "backend.table must not be empty".to_string(),
        });
    }

    // Validate backend.prefix is not empty
    if config.backend.prefix.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "backend.prefix must not be empty".to_string(),
        });
    }

    // Validate persistence.flush_interval_secs is at least 1
    if config.persistence.flush_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "persistence.flush_interval_secs must be at least 1".to_string(),
        });
    }

    // Validate webhook secret is not blank when set (blank would make the
    // webhook path `/webhook/`)
    if let Some(ref secret) = config.gateway.webhook_secret
        && secret.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "gateway.webhook_secret must not be blank".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = AnketaConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_table_fails_validation() {
        let mut config = AnketaConfig::default();
        config.backend.table = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("backend.table"))));
    }

    #[test]
    fn empty_prefix_fails_validation() {
        let mut config = AnketaConfig::default();
        config.backend.prefix = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("backend.prefix"))));
    }

    #[test]
    fn url_without_scheme_fails_validation() {
        let mut config = AnketaConfig::default();
        config.backend.url = Some("xyzcompany.supabase.co".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("backend.url"))));
    }

    #[test]
    fn zero_flush_interval_fails_validation() {
        let mut config = AnketaConfig::default();
        config.persistence.flush_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("flush_interval_secs"))));
    }

    #[test]
    fn blank_webhook_secret_fails_validation() {
        let mut config = AnketaConfig::default();
        config.gateway.webhook_secret = Some("".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("webhook_secret"))));
    }

    #[test]
    fn persistence_section_deserializes_directly() {
        let toml_str = r#"
[persistence]
write_policy = "write-back"
flush_interval_secs = 5
"#;
        let config: AnketaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.persistence.write_policy,
            crate::model::WritePolicy::WriteBack
        );
        assert_eq!(config.persistence.flush_interval_secs, 5);
    }

    #[test]
    fn unknown_persistence_key_is_rejected() {
        let toml_str = r#"
[persistence]
write_polcy = "write-back"
"#;
        assert!(toml::from_str::<AnketaConfig>(toml_str).is_err());
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = AnketaConfig::default();
        config.gateway.host = "0.0.0.0".to_string();
        config.backend.url = Some("https://xyzcompany.supabase.co".to_string());
        config.backend.service_key = Some("service-role-key".to_string());
        config.gateway.webhook_secret = Some("s3cret".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
