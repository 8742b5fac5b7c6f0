// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `anketa doctor` command implementation.
//!
//! Runs diagnostic checks against the configured environment to identify
//! configuration issues and connectivity problems before `serve` hits them.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anketa_config::model::AnketaConfig;
use anketa_core::{AnketaError, HealthStatus, PluginAdapter};
use anketa_persistence::{PostgrestBackend, StateStore};
use anketa_telegram::TelegramChannel;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

/// Run the `anketa doctor` command.
///
/// With `--plain`, disables colored output.
pub async fn run_doctor(config: &AnketaConfig, plain: bool) -> Result<(), AnketaError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config().await,
        check_backend(config).await,
        check_telegram(config).await,
        check_webhook_secret(config),
    ];

    // Print results
    println!();
    println!("  anketa doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        let duration_ms = result.duration.as_millis();
        let line;

        match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    let symbol = "✓".green().to_string();
                    line = format!(
                        "    {symbol} {:<16} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                } else {
                    line = format!(
                        "    [OK]   {:<16} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                }
            }
            CheckStatus::Warn => {
                warn_count += 1;
                if use_color {
                    use colored::Colorize;
                    let symbol = "!".yellow().to_string();
                    line = format!(
                        "    {symbol} {:<16} {} ({duration_ms}ms)",
                        result.name,
                        result.message.yellow()
                    );
                } else {
                    line = format!(
                        "    [WARN] {:<16} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    let symbol = "✗".red().to_string();
                    line = format!(
                        "    {symbol} {:<16} {} ({duration_ms}ms)",
                        result.name,
                        result.message.red()
                    );
                } else {
                    line = format!(
                        "    [FAIL] {:<16} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                }
            }
        }

        println!("{line}");
    }

    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }

    println!();

    Ok(())
}

/// Check configuration loads without errors.
async fn check_config() -> CheckResult {
    let start = Instant::now();
    match anketa_config::load_and_validate() {
        Ok(_) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Pass,
            message: "valid".to_string(),
            duration: start.elapsed(),
        },
        Err(errors) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Fail,
            message: format!("{} error(s)", errors.len()),
            duration: start.elapsed(),
        },
    }
}

/// Check the state backend is reachable with a probe round-trip.
async fn check_backend(config: &AnketaConfig) -> CheckResult {
    let start = Instant::now();

    if config.backend.url.is_none() || config.backend.service_key.is_none() {
        return CheckResult {
            name: "Backend".to_string(),
            status: CheckStatus::Warn,
            message: "not configured (backend.url / backend.service_key)".to_string(),
            duration: start.elapsed(),
        };
    }

    let backend = match PostgrestBackend::new(&config.backend) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            return CheckResult {
                name: "Backend".to_string(),
                status: CheckStatus::Fail,
                message: e.to_string(),
                duration: start.elapsed(),
            };
        }
    };

    let store = StateStore::new(backend, &config.backend, &config.persistence);
    match store.probe().await {
        Ok(()) => CheckResult {
            name: "Backend".to_string(),
            status: CheckStatus::Pass,
            message: format!("table `{}` reachable", config.backend.table),
            duration: start.elapsed(),
        },
        Err(e) => CheckResult {
            name: "Backend".to_string(),
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        },
    }
}

/// Check the Telegram token is valid via getMe.
async fn check_telegram(config: &AnketaConfig) -> CheckResult {
    let start = Instant::now();

    if config.telegram.bot_token.is_none() {
        return CheckResult {
            name: "Telegram".to_string(),
            status: CheckStatus::Warn,
            message: "not configured (telegram.bot_token)".to_string(),
            duration: start.elapsed(),
        };
    }

    let channel = match TelegramChannel::new(&config.telegram) {
        Ok(channel) => channel,
        Err(e) => {
            return CheckResult {
                name: "Telegram".to_string(),
                status: CheckStatus::Fail,
                message: e.to_string(),
                duration: start.elapsed(),
            };
        }
    };

    match channel.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult {
            name: "Telegram".to_string(),
            status: CheckStatus::Pass,
            message: "token accepted".to_string(),
            duration: start.elapsed(),
        },
        Ok(HealthStatus::Degraded(reason)) => CheckResult {
            name: "Telegram".to_string(),
            status: CheckStatus::Warn,
            message: reason,
            duration: start.elapsed(),
        },
        Ok(HealthStatus::Unhealthy(reason)) => CheckResult {
            name: "Telegram".to_string(),
            status: CheckStatus::Fail,
            message: reason,
            duration: start.elapsed(),
        },
        Err(e) => CheckResult {
            name: "Telegram".to_string(),
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        },
    }
}

/// Check a webhook secret is configured.
fn check_webhook_secret(config: &AnketaConfig) -> CheckResult {
    let start = Instant::now();
    match config.gateway.webhook_secret {
        Some(_) => CheckResult {
            name: "Webhook".to_string(),
            status: CheckStatus::Pass,
            message: "secret configured".to_string(),
            duration: start.elapsed(),
        },
        None => CheckResult {
            name: "Webhook".to_string(),
            status: CheckStatus::Warn,
            message: "no gateway.webhook_secret set, serve will refuse to start".to_string(),
            duration: start.elapsed(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_check_warns_without_secret() {
        let config = AnketaConfig::default();
        let result = check_webhook_secret(&config);
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[test]
    fn webhook_check_passes_with_secret() {
        let mut config = AnketaConfig::default();
        config.gateway.webhook_secret = Some("s3cret".to_string());
        let result = check_webhook_secret(&config);
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn backend_check_warns_when_unconfigured() {
        let config = AnketaConfig::default();
        let result = check_backend(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn backend_check_fails_against_unreachable_backend() {
        let mut config = AnketaConfig::default();
        config.backend.url = Some("http://127.0.0.1:9".to_string());
        config.backend.service_key = Some("key".to_string());
        let result = check_backend(&config).await;
        assert_eq!(result.status, CheckStatus::Fail);
    }

    #[tokio::test]
    async fn telegram_check_warns_when_unconfigured() {
        let config = AnketaConfig::default();
        let result = check_telegram(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }
}
