//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define query-capability contracts over persons and addresses.
//! - Isolate SQLite query details from service orchestration.
//! - Provide the session (persistence context) used by write paths.
//!
//! # Invariants
//! - Write paths validate entities before SQL mutations.
//! - Repositories only accept connections with the latest schema applied.
//! - Single-result queries fail on zero or multiple matches.

pub mod person_repo;
pub mod session;

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::address::AddressId;
use crate::model::person::PersonId;
use crate::model::ModelValidationError;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Identity of an entity tracked by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Person(PersonId),
    Address(AddressId),
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Person(id) => write!(f, "Person#{id}"),
            Self::Address(id) => write!(f, "Address#{id}"),
        }
    }
}

/// Repository error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound(PersonId),
    /// A single-result query matched zero or several rows.
    IncorrectResultSize {
        expected: usize,
        actual: usize,
    },
    /// Storage rejected a write, e.g. a dangling or already-owned address.
    ConstraintViolation(String),
    /// A person references an address that was never persisted.
    TransientReference {
        city: String,
    },
    /// Persist was called for an entity that already has an identity.
    DetachedEntity(EntityKey),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::IncorrectResultSize { expected, actual } => write!(
                f,
                "incorrect result size: expected {expected}, actual {actual}"
            ),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::TransientReference { city } => write!(
                f,
                "person references unsaved address `{city}`; persist the address first"
            ),
            Self::DetachedEntity(key) => write!(f, "entity {key} is already persistent"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            return Self::ConstraintViolation(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("person", &["id", "name"]),
    ("address", &["id", "city"]),
    ("person_address", &["person_id", "address_id"]),
];

/// Rejects connections that did not go through `db::open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
