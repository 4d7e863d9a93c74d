//! Emerald lot repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `emerald_lots` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Lists are ordered by `id ASC`, which is insertion order.
//! - Updates are partial: only fields present in the patch are written.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::lot::{EmeraldLot, EmeraldLotPatch, LotId, LotStatus, NewEmeraldLot};
use crate::repo::{
    begin_write, ensure_table_ready, log_write_failure, RepoError, RepoResult,
    DEFAULT_LIST_LIMIT,
};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const LOT_SELECT_SQL: &str = "SELECT
    id,
    lot_code,
    carat,
    shape,
    color_grade,
    clarity,
    treatment,
    origin,
    certificate_id,
    status
FROM emerald_lots";

const LOT_COLUMNS: &[&str] = &[
    "id",
    "lot_code",
    "carat",
    "shape",
    "color_grade",
    "clarity",
    "treatment",
    "origin",
    "certificate_id",
    "status",
];

/// Query options for listing lots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotListQuery {
    pub status: Option<LotStatus>,
    /// Number of rows to skip.
    pub skip: u32,
    /// Maximum rows to return. `0` returns an empty page.
    pub limit: u32,
}

impl Default for LotListQuery {
    fn default() -> Self {
        Self {
            status: None,
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Repository interface for emerald lot operations.
pub trait LotRepository {
    /// Inserts a lot and returns the stored row with its assigned id.
    fn create_lot(&self, lot: &NewEmeraldLot) -> RepoResult<EmeraldLot>;
    fn get_lot(&self, id: LotId) -> RepoResult<Option<EmeraldLot>>;
    fn list_lots(&self, query: &LotListQuery) -> RepoResult<Vec<EmeraldLot>>;
    /// Merges `patch` into the stored lot. `None` when the id is unknown.
    fn update_lot(&self, id: LotId, patch: &EmeraldLotPatch) -> RepoResult<Option<EmeraldLot>>;
    /// Removes the lot and returns its prior state. `None` when unknown.
    fn delete_lot(&self, id: LotId) -> RepoResult<Option<EmeraldLot>>;
}

/// SQLite-backed lot repository.
pub struct SqliteLotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLotRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "emerald_lots", LOT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl LotRepository for SqliteLotRepository<'_> {
    fn create_lot(&self, lot: &NewEmeraldLot) -> RepoResult<EmeraldLot> {
        lot.validate()?;

        let result = insert_lot(self.conn, lot);
        match &result {
            Ok(created) => debug!("event=lot_create module=repo status=ok id={}", created.id),
            Err(err) => log_write_failure("lot_create", err),
        }
        result
    }

    fn get_lot(&self, id: LotId) -> RepoResult<Option<EmeraldLot>> {
        load_lot(self.conn, id)
    }

    fn list_lots(&self, query: &LotListQuery) -> RepoResult<Vec<EmeraldLot>> {
        let mut sql = format!("{LOT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.skip)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut lots = Vec::new();
        while let Some(row) = rows.next()? {
            lots.push(parse_lot_row(row)?);
        }

        Ok(lots)
    }

    fn update_lot(&self, id: LotId, patch: &EmeraldLotPatch) -> RepoResult<Option<EmeraldLot>> {
        let result = patch_lot(self.conn, id, patch);
        match &result {
            Ok(Some(_)) => debug!("event=lot_update module=repo status=ok id={}", id),
            Ok(None) => debug!("event=lot_update module=repo status=not_found id={}", id),
            Err(err) => log_write_failure("lot_update", err),
        }
        result
    }

    fn delete_lot(&self, id: LotId) -> RepoResult<Option<EmeraldLot>> {
        let result = remove_lot(self.conn, id);
        match &result {
            Ok(Some(_)) => debug!("event=lot_delete module=repo status=ok id={}", id),
            Ok(None) => debug!("event=lot_delete module=repo status=not_found id={}", id),
            Err(err) => log_write_failure("lot_delete", err),
        }
        result
    }
}

fn insert_lot(conn: &Connection, lot: &NewEmeraldLot) -> RepoResult<EmeraldLot> {
    let tx = begin_write(conn)?;
    tx.execute(
        "INSERT INTO emerald_lots (
            lot_code,
            carat,
            shape,
            color_grade,
            clarity,
            treatment,
            origin,
            certificate_id,
            status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
        params![
            lot.lot_code.as_str(),
            lot.carat,
            lot.shape.as_deref(),
            lot.color_grade.as_deref(),
            lot.clarity.as_deref(),
            lot.treatment.as_deref(),
            lot.origin.as_deref(),
            lot.certificate_id.as_deref(),
            lot.status.as_str(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    let created = load_lot(&tx, id)?
        .ok_or_else(|| RepoError::InvalidData(format!("lot {id} missing after insert")))?;
    tx.commit()?;
    Ok(created)
}

fn patch_lot(
    conn: &Connection,
    id: LotId,
    patch: &EmeraldLotPatch,
) -> RepoResult<Option<EmeraldLot>> {
    let tx = begin_write(conn)?;
    let Some(mut lot) = load_lot(&tx, id)? else {
        return Ok(None);
    };
    if patch.is_empty() {
        return Ok(Some(lot));
    }

    patch.apply_to(&mut lot);
    lot.validate()?;

    tx.execute(
        "UPDATE emerald_lots
         SET
            lot_code = ?2,
            carat = ?3,
            shape = ?4,
            color_grade = ?5,
            clarity = ?6,
            treatment = ?7,
            origin = ?8,
            certificate_id = ?9,
            status = ?10
         WHERE id = ?1;",
        params![
            id,
            lot.lot_code.as_str(),
            lot.carat,
            lot.shape.as_deref(),
            lot.color_grade.as_deref(),
            lot.clarity.as_deref(),
            lot.treatment.as_deref(),
            lot.origin.as_deref(),
            lot.certificate_id.as_deref(),
            lot.status.as_str(),
        ],
    )?;
    let updated = load_lot(&tx, id)?;
    tx.commit()?;
    Ok(updated)
}

fn remove_lot(conn: &Connection, id: LotId) -> RepoResult<Option<EmeraldLot>> {
    let tx = begin_write(conn)?;
    let Some(lot) = load_lot(&tx, id)? else {
        return Ok(None);
    };

    tx.execute("DELETE FROM emerald_lots WHERE id = ?1;", [id])?;
    tx.commit()?;
    Ok(Some(lot))
}

fn load_lot(conn: &Connection, id: LotId) -> RepoResult<Option<EmeraldLot>> {
    let mut stmt = conn.prepare(&format!("{LOT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_lot_row(row)?));
    }

    Ok(None)
}

/// Lists every lot with the given status, in id order, without pagination.
pub(crate) fn list_lots_with_status(
    conn: &Connection,
    status: LotStatus,
) -> RepoResult<Vec<EmeraldLot>> {
    let mut stmt = conn.prepare(&format!(
        "{LOT_SELECT_SQL} WHERE status = ?1 ORDER BY id ASC;"
    ))?;
    let mut rows = stmt.query([status.as_str()])?;
    let mut lots = Vec::new();
    while let Some(row) = rows.next()? {
        lots.push(parse_lot_row(row)?);
    }
    Ok(lots)
}

fn parse_lot_row(row: &Row<'_>) -> RepoResult<EmeraldLot> {
    let status_text: String = row.get("status")?;
    let status = status_text
        .parse()
        .map_err(|err| RepoError::InvalidData(format!("{err} in emerald_lots.status")))?;

    Ok(EmeraldLot {
        id: row.get("id")?,
        lot_code: row.get("lot_code")?,
        carat: row.get("carat")?,
        shape: row.get("shape")?,
        color_grade: row.get("color_grade")?,
        clarity: row.get("clarity")?,
        treatment: row.get("treatment")?,
        origin: row.get("origin")?,
        certificate_id: row.get("certificate_id")?,
        status,
    })
}
