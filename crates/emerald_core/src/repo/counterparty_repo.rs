//! Counterparty repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Lists are ordered by `id ASC`.
//! - Duplicate `name` surfaces as `RepoError::ConstraintViolation`.
//! - Deleting a counterparty still referenced by trades is rejected when
//!   foreign keys are enforced.

use crate::model::counterparty::{
    Counterparty, CounterpartyId, CounterpartyPatch, CounterpartyType, NewCounterparty,
};
use crate::repo::{
    begin_write, ensure_table_ready, log_write_failure, RepoError, RepoResult,
    DEFAULT_LIST_LIMIT,
};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const COUNTERPARTY_SELECT_SQL: &str = "SELECT
    id,
    name,
    type,
    contact_info,
    country,
    kyc_notes
FROM counterparties";

const COUNTERPARTY_COLUMNS: &[&str] = &["id", "name", "type", "contact_info", "country", "kyc_notes"];

/// Query options for listing counterparties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterpartyListQuery {
    pub kind: Option<CounterpartyType>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for CounterpartyListQuery {
    fn default() -> Self {
        Self {
            kind: None,
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Repository interface for counterparty operations.
pub trait CounterpartyRepository {
    fn create_counterparty(&self, counterparty: &NewCounterparty) -> RepoResult<Counterparty>;
    fn get_counterparty(&self, id: CounterpartyId) -> RepoResult<Option<Counterparty>>;
    fn list_counterparties(&self, query: &CounterpartyListQuery) -> RepoResult<Vec<Counterparty>>;
    fn update_counterparty(
        &self,
        id: CounterpartyId,
        patch: &CounterpartyPatch,
    ) -> RepoResult<Option<Counterparty>>;
    fn delete_counterparty(&self, id: CounterpartyId) -> RepoResult<Option<Counterparty>>;
}

/// SQLite-backed counterparty repository.
pub struct SqliteCounterpartyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCounterpartyRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "counterparties", COUNTERPARTY_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl CounterpartyRepository for SqliteCounterpartyRepository<'_> {
    fn create_counterparty(&self, counterparty: &NewCounterparty) -> RepoResult<Counterparty> {
        counterparty.validate()?;

        let result = insert_counterparty(self.conn, counterparty);
        match &result {
            Ok(created) => debug!(
                "event=counterparty_create module=repo status=ok id={}",
                created.id
            ),
            Err(err) => log_write_failure("counterparty_create", err),
        }
        result
    }

    fn get_counterparty(&self, id: CounterpartyId) -> RepoResult<Option<Counterparty>> {
        load_counterparty(self.conn, id)
    }

    fn list_counterparties(&self, query: &CounterpartyListQuery) -> RepoResult<Vec<Counterparty>> {
        let mut sql = format!("{COUNTERPARTY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = query.kind {
            sql.push_str(" AND type = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }

        sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.skip)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut counterparties = Vec::new();
        while let Some(row) = rows.next()? {
            counterparties.push(parse_counterparty_row(row)?);
        }

        Ok(counterparties)
    }

    fn update_counterparty(
        &self,
        id: CounterpartyId,
        patch: &CounterpartyPatch,
    ) -> RepoResult<Option<Counterparty>> {
        let result = patch_counterparty(self.conn, id, patch);
        match &result {
            Ok(Some(_)) => debug!("event=counterparty_update module=repo status=ok id={}", id),
            Ok(None) => debug!(
                "event=counterparty_update module=repo status=not_found id={}",
                id
            ),
            Err(err) => log_write_failure("counterparty_update", err),
        }
        result
    }

    fn delete_counterparty(&self, id: CounterpartyId) -> RepoResult<Option<Counterparty>> {
        let result = remove_counterparty(self.conn, id);
        match &result {
            Ok(Some(_)) => debug!("event=counterparty_delete module=repo status=ok id={}", id),
            Ok(None) => debug!(
                "event=counterparty_delete module=repo status=not_found id={}",
                id
            ),
            Err(err) => log_write_failure("counterparty_delete", err),
        }
        result
    }
}

fn insert_counterparty(
    conn: &Connection,
    counterparty: &NewCounterparty,
) -> RepoResult<Counterparty> {
    let tx = begin_write(conn)?;
    tx.execute(
        "INSERT INTO counterparties (
            name,
            type,
            contact_info,
            country,
            kyc_notes
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            counterparty.name.as_str(),
            counterparty.kind.as_str(),
            counterparty.contact_info.as_deref(),
            counterparty.country.as_deref(),
            counterparty.kyc_notes.as_deref(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    let created = load_counterparty(&tx, id)?.ok_or_else(|| {
        RepoError::InvalidData(format!("counterparty {id} missing after insert"))
    })?;
    tx.commit()?;
    Ok(created)
}

fn patch_counterparty(
    conn: &Connection,
    id: CounterpartyId,
    patch: &CounterpartyPatch,
) -> RepoResult<Option<Counterparty>> {
    let tx = begin_write(conn)?;
    let Some(mut counterparty) = load_counterparty(&tx, id)? else {
        return Ok(None);
    };

    patch.apply_to(&mut counterparty);
    counterparty.validate()?;

    tx.execute(
        "UPDATE counterparties
         SET
            name = ?2,
            type = ?3,
            contact_info = ?4,
            country = ?5,
            kyc_notes = ?6
         WHERE id = ?1;",
        params![
            id,
            counterparty.name.as_str(),
            counterparty.kind.as_str(),
            counterparty.contact_info.as_deref(),
            counterparty.country.as_deref(),
            counterparty.kyc_notes.as_deref(),
        ],
    )?;
    let updated = load_counterparty(&tx, id)?;
    tx.commit()?;
    Ok(updated)
}

fn remove_counterparty(conn: &Connection, id: CounterpartyId) -> RepoResult<Option<Counterparty>> {
    let tx = begin_write(conn)?;
    let Some(counterparty) = load_counterparty(&tx, id)? else {
        return Ok(None);
    };

    tx.execute("DELETE FROM counterparties WHERE id = ?1;", [id])?;
    tx.commit()?;
    Ok(Some(counterparty))
}

fn load_counterparty(conn: &Connection, id: CounterpartyId) -> RepoResult<Option<Counterparty>> {
    let mut stmt = conn.prepare(&format!("{COUNTERPARTY_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_counterparty_row(row)?));
    }

    Ok(None)
}

fn parse_counterparty_row(row: &Row<'_>) -> RepoResult<Counterparty> {
    let type_text: String = row.get("type")?;
    let kind = type_text
        .parse()
        .map_err(|err| RepoError::InvalidData(format!("{err} in counterparties.type")))?;

    Ok(Counterparty {
        id: row.get("id")?,
        name: row.get("name")?,
        kind,
        contact_info: row.get("contact_info")?,
        country: row.get("country")?,
        kyc_notes: row.get("kyc_notes")?,
    })
}
