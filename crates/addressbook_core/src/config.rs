//! Process configuration loaded from the environment.
//!
//! # Responsibility
//! - Resolve log level, log target and SQL echo settings.
//! - Load a `.env` file once per process when one is present.
//!
//! # Invariants
//! - A missing variable falls back to its default; a malformed one is an error.
//! - `log_dir`, when set, is an absolute path.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use once_cell::sync::Lazy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const LOG_LEVEL_VAR: &str = "ADDRESSBOOK_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "ADDRESSBOOK_LOG_DIR";
pub const SHOW_SQL_VAR: &str = "ADDRESSBOOK_SHOW_SQL";

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings consumed by [`crate::app::bootstrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: &'static str,
    /// `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
    /// Echo every executed SQL statement at `debug` level.
    pub show_sql: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            show_sql: true,
        }
    }
}

impl AppConfig {
    /// Reads configuration from process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = non_blank(lookup(LOG_LEVEL_VAR)) {
            config.log_level =
                normalize_level(&value).map_err(|reason| invalid(LOG_LEVEL_VAR, &value, reason))?;
        }

        if let Some(value) = non_blank(lookup(LOG_DIR_VAR)) {
            let dir = normalize_log_dir(Path::new(value.trim()))
                .map_err(|reason| invalid(LOG_DIR_VAR, &value, reason))?;
            config.log_dir = Some(dir);
        }

        if let Some(value) = non_blank(lookup(SHOW_SQL_VAR)) {
            config.show_sql = parse_flag(&value).ok_or_else(|| {
                invalid(
                    SHOW_SQL_VAR,
                    &value,
                    "expected true|false|1|0|yes|no|on|off".to_string(),
                )
            })?;
        }

        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason,
    }
}
