//! Transaction boundaries for core write paths.
//!
//! # Responsibility
//! - Run a body of work inside one atomic unit of work.
//! - Provide savepoint-scoped atomicity for multi-statement writes that may
//!   run with or without an enclosing unit of work.
//!
//! # Invariants
//! - A body returning `Ok` is committed; a body returning `Err` is rolled back.
//! - A rollback failure never masks the body error.

use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Runs `body` inside one immediate transaction on `conn`.
///
/// Every write and read performed through the transaction handle commits
/// together when `body` returns `Ok`, or rolls back together when it returns
/// `Err`.
///
/// # Errors
/// - Returns the body error unchanged after rolling back.
/// - Returns begin/commit failures converted into `E`.
pub fn in_unit_of_work<T, E, F>(conn: &mut Connection, body: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    let started_at = Instant::now();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    info!("event=unit_of_work module=db status=begin");

    match body(&tx) {
        Ok(value) => {
            tx.commit()?;
            info!(
                "event=unit_of_work module=db status=commit duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event=unit_of_work module=db status=error error_code=rollback_failed error={}",
                    rollback_err
                );
            }
            warn!(
                "event=unit_of_work module=db status=rollback duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

/// Runs `body` inside a named savepoint on `conn`.
///
/// Works both inside an open transaction (nested scope) and in autocommit
/// mode (the savepoint then acts as its own transaction).
pub fn with_savepoint<T, E, F>(conn: &Connection, name: &'static str, body: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    conn.execute_batch(&format!("SAVEPOINT {name};"))?;

    match body() {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name};"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) =
                conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name};"))
            {
                error!(
                    "event=savepoint module=db status=error savepoint={name} error_code=rollback_failed error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}
