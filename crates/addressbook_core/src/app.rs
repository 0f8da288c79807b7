//! Process wiring.
//!
//! # Responsibility
//! - Build every runtime dependency once, in order, from an [`AppConfig`].
//! - Run the startup routine against the freshly wired store.
//!
//! # Invariants
//! - Logging is active before the store is opened.
//! - The returned connection is a fresh, fully migrated in-memory store.

use crate::config::{AppConfig, ConfigError};
use crate::db::{enable_sql_echo, open_db_in_memory, DbError};
use crate::logging::init_logging;
use crate::service::startup::{run_startup, StartupError, StartupReport};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

/// Error for process wiring and the run built on top of it.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Logging(String),
    Db(DbError),
    Startup(StartupError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Db(err) => write!(f, "storage bootstrap failed: {err}"),
            Self::Startup(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
            Self::Startup(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StartupError> for AppError {
    fn from(value: StartupError) -> Self {
        Self::Startup(value)
    }
}

/// Initializes logging and opens the store described by `config`.
pub fn bootstrap(config: &AppConfig) -> Result<Connection, AppError> {
    init_logging(config.log_level, config.log_dir.as_deref()).map_err(AppError::Logging)?;

    let mut conn = open_db_in_memory()?;
    if config.show_sql {
        enable_sql_echo(&mut conn);
    }
    Ok(conn)
}

/// Wires a fresh store from `config` and runs the startup routine on it.
pub fn run_app<W: Write>(config: &AppConfig, out: &mut W) -> Result<StartupReport, AppError> {
    let mut conn = bootstrap(config)?;
    let report = run_startup(&mut conn, out)?;
    out.flush().map_err(StartupError::Output)?;
    Ok(report)
}
