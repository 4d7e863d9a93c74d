//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by ledger behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys` set exactly as requested.
//! - Returned connections have migrations fully applied.
//! - Busy-timeout setup is best-effort and never fails the open.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Connection-level settings applied during bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Enables SQLite referential-integrity checks for trade references.
    pub enforce_foreign_keys: bool,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            enforce_foreign_keys: true,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Opens a SQLite database file with default options and applies all
/// pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with(path, &StoreOptions::default())
}

/// Opens an in-memory SQLite database with default options and applies all
/// pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_db_in_memory_with(&StoreOptions::default())
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_with(path: impl AsRef<Path>, options: &StoreOptions) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");
    finish_open(Connection::open(path), options, "file", started_at)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// Every call yields an independent, empty database.
pub fn open_db_in_memory_with(options: &StoreOptions) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");
    finish_open(Connection::open_in_memory(), options, "memory", started_at)
}

fn finish_open(
    opened: rusqlite::Result<Connection>,
    options: &StoreOptions,
    mode: &str,
    started_at: Instant,
) -> DbResult<Connection> {
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, options) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} foreign_keys={} duration_ms={}",
                mode,
                options.enforce_foreign_keys,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, options: &StoreOptions) -> DbResult<()> {
    let foreign_keys = if options.enforce_foreign_keys {
        "ON"
    } else {
        "OFF"
    };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;

    if let Err(err) = conn.busy_timeout(options.busy_timeout) {
        warn!(
            "event=db_pragma module=db status=skipped pragma=busy_timeout error={}",
            err
        );
    }

    apply_migrations(conn)?;
    Ok(())
}

/// Reports whether the connection currently enforces foreign keys.
pub fn foreign_keys_enabled(conn: &Connection) -> DbResult<bool> {
    let enabled: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    Ok(enabled == 1)
}
