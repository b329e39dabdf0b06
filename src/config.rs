//! # Bot Configuration Module
//!
//! Settings read from the environment (and `.env`) at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::dialogue::ConfirmationMode;
use crate::errors::ConfigError;
use crate::intake_buffer::DEFAULT_DEBOUNCE;
use crate::persister::{DEFAULT_PROGRESS_EVERY, STORAGE_DIR};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_SCHEME_DIR: &str = "assets/images/scheme";

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Runtime configuration of the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot API token
    pub bot_token: String,
    /// Default filter directive when `RUST_LOG` is not set
    pub log_level: String,
    pub log_format: LogFormat,
    /// Directory that contains `structure_inspections/`
    pub base_path: PathBuf,
    /// PostgreSQL URL for the session store; in-memory store when absent
    pub database_url: Option<String>,
    /// Quiet period that closes a media group
    pub debounce: Duration,
    /// Items between progress updates while saving
    pub progress_every: usize,
    pub confirmation_mode: ConfirmationMode,
    /// Directory holding `scheme.png` and `scheme_block_<X>.png`
    pub scheme_dir: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::default(),
            base_path: PathBuf::from("."),
            database_url: None,
            debounce: DEFAULT_DEBOUNCE,
            progress_every: DEFAULT_PROGRESS_EVERY,
            confirmation_mode: ConfirmationMode::default(),
            scheme_dir: PathBuf::from(DEFAULT_SCHEME_DIR),
        }
    }
}

impl BotConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bot_token = get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let log_format = match get("LOG_FORMAT").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let debounce = match get("DEBOUNCE_MS") {
            Some(raw) => Duration::from_millis(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "DEBOUNCE_MS",
                value: raw.clone(),
            })?),
            None => defaults.debounce,
        };

        let progress_every = match get("PROGRESS_EVERY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PROGRESS_EVERY",
                        value: raw,
                    })
                }
            },
            None => defaults.progress_every,
        };

        let confirmation_mode = match get("UPLOAD_MODE") {
            Some(raw) => raw.parse().map_err(|value| ConfigError::Invalid {
                key: "UPLOAD_MODE",
                value,
            })?,
            None => defaults.confirmation_mode,
        };

        Ok(Self {
            bot_token,
            log_level: get("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or(defaults.log_level),
            log_format,
            base_path: get("INSPECTIONS_BASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.base_path),
            database_url: get("DATABASE_URL"),
            debounce,
            progress_every,
            confirmation_mode,
            scheme_dir: get("SCHEME_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scheme_dir),
        })
    }

    /// Root directory uploads are written under
    pub fn storage_root(&self) -> PathBuf {
        self.base_path.join(STORAGE_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_token_is_required() {
        let err = BotConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.debounce, Duration::from_secs(1));
        assert_eq!(config.progress_every, 3);
        assert_eq!(config.confirmation_mode, ConfirmationMode::Immediate);
        assert_eq!(config.storage_root(), PathBuf::from("./structure_inspections"));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("INSPECTIONS_BASE_PATH", "/data"),
            ("DEBOUNCE_MS", "250"),
            ("UPLOAD_MODE", "confirm"),
            ("LOG_FORMAT", "json"),
            ("LOG_LEVEL", "DEBUG"),
        ]))
        .unwrap();
        assert_eq!(config.storage_root(), PathBuf::from("/data/structure_inspections"));
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.confirmation_mode, ConfirmationMode::Confirm);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("PROGRESS_EVERY", "0"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PROGRESS_EVERY",
                value: "0".to_string()
            }
        );
    }
}
