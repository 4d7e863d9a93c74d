//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts (create, get, list, partial
//!   update, delete) and report queries.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Write paths validate payloads before SQL mutations.
//! - Missing rows are reported as `Ok(None)`, never as an error.
//! - Every write runs inside one transaction that rolls back on drop.
//! - Uniqueness and foreign-key failures surface as
//!   `RepoError::ConstraintViolation`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::ValidationError;
use log::{error, warn};
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod counterparty_repo;
pub mod lot_repo;
pub mod report_repo;
pub mod trade_repo;

/// Page size used when callers do not pass one.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for ledger persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Payload rejected before reaching the store.
    Validation(ValidationError),
    /// Uniqueness or foreign-key check failed at commit time.
    ConstraintViolation(String),
    Db(DbError),
    /// Persisted row cannot be decoded into a domain value.
    InvalidData(String),
    /// Connection schema version does not match this binary.
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
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
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

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
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
        match value {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation(
                    message.unwrap_or_else(|| "constraint failed".to_string()),
                )
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Opens the unit of work for one repository write.
///
/// The returned transaction rolls back when dropped without `commit()`, so
/// early returns and errors never leave partial writes behind.
pub(crate) fn begin_write(conn: &Connection) -> RepoResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

/// Logs a failed write; constraint failures are expected user errors.
pub(crate) fn log_write_failure(event: &str, err: &RepoError) {
    match err {
        RepoError::ConstraintViolation(message) => warn!(
            "event={} module=repo status=rejected error_code=constraint_violation error={}",
            event, message
        ),
        RepoError::Validation(validation) => warn!(
            "event={} module=repo status=rejected error_code=validation field={}",
            event, validation.field
        ),
        other => error!(
            "event={} module=repo status=error error={}",
            event, other
        ),
    }
}

/// Checks that the connection is migrated and exposes `table` with `columns`.
pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
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

#[cfg(test)]
mod tests {
    use super::RepoError;
    use rusqlite::ffi;

    #[test]
    fn constraint_failures_map_to_constraint_violation() {
        let sqlite_err = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: emerald_lots.lot_code".to_string()),
        );
        let err = RepoError::from(sqlite_err);
        assert!(
            matches!(err, RepoError::ConstraintViolation(ref message) if message.contains("lot_code"))
        );
    }

    #[test]
    fn other_sqlite_failures_stay_db_errors() {
        let err = RepoError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, RepoError::Db(_)));
    }
}
