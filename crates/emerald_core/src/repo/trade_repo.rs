//! Trade repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `trades` storage.
//! - Persist trade dates as ISO `YYYY-MM-DD` text.
//!
//! # Invariants
//! - Lot/counterparty references are checked by SQLite only. With
//!   `foreign_keys=OFF` a dangling reference is stored as-is.
//! - Trades are never created or removed as a side effect of lot or
//!   counterparty writes.

use crate::model::counterparty::CounterpartyId;
use crate::model::lot::LotId;
use crate::model::trade::{NewTrade, Trade, TradeId, TradePatch, TradeType};
use crate::repo::{
    begin_write, ensure_table_ready, log_write_failure, RepoError, RepoResult,
    DEFAULT_LIST_LIMIT,
};
use chrono::NaiveDate;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TRADE_DATE_FORMAT: &str = "%Y-%m-%d";

const TRADE_SELECT_SQL: &str = "SELECT
    id,
    type,
    date,
    currency,
    unit_price,
    total_price,
    location,
    emerald_lot_id,
    counterparty_id
FROM trades";

const TRADE_COLUMNS: &[&str] = &[
    "id",
    "type",
    "date",
    "currency",
    "unit_price",
    "total_price",
    "location",
    "emerald_lot_id",
    "counterparty_id",
];

/// Query options for listing trades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeListQuery {
    pub kind: Option<TradeType>,
    pub emerald_lot_id: Option<LotId>,
    pub counterparty_id: Option<CounterpartyId>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for TradeListQuery {
    fn default() -> Self {
        Self {
            kind: None,
            emerald_lot_id: None,
            counterparty_id: None,
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Repository interface for trade operations.
pub trait TradeRepository {
    fn create_trade(&self, trade: &NewTrade) -> RepoResult<Trade>;
    fn get_trade(&self, id: TradeId) -> RepoResult<Option<Trade>>;
    fn list_trades(&self, query: &TradeListQuery) -> RepoResult<Vec<Trade>>;
    fn update_trade(&self, id: TradeId, patch: &TradePatch) -> RepoResult<Option<Trade>>;
    fn delete_trade(&self, id: TradeId) -> RepoResult<Option<Trade>>;
}

/// SQLite-backed trade repository.
pub struct SqliteTradeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTradeRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "trades", TRADE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl TradeRepository for SqliteTradeRepository<'_> {
    fn create_trade(&self, trade: &NewTrade) -> RepoResult<Trade> {
        trade.validate()?;

        let result = insert_trade(self.conn, trade);
        match &result {
            Ok(created) => debug!(
                "event=trade_create module=repo status=ok id={} type={} lot_id={} counterparty_id={}",
                created.id, created.kind, created.emerald_lot_id, created.counterparty_id
            ),
            Err(err) => log_write_failure("trade_create", err),
        }
        result
    }

    fn get_trade(&self, id: TradeId) -> RepoResult<Option<Trade>> {
        load_trade(self.conn, id)
    }

    fn list_trades(&self, query: &TradeListQuery) -> RepoResult<Vec<Trade>> {
        let mut sql = format!("{TRADE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = query.kind {
            sql.push_str(" AND type = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }

        if let Some(lot_id) = query.emerald_lot_id {
            sql.push_str(" AND emerald_lot_id = ?");
            bind_values.push(Value::Integer(lot_id));
        }

        if let Some(counterparty_id) = query.counterparty_id {
            sql.push_str(" AND counterparty_id = ?");
            bind_values.push(Value::Integer(counterparty_id));
        }

        sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.skip)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut trades = Vec::new();
        while let Some(row) = rows.next()? {
            trades.push(parse_trade_row(row)?);
        }

        Ok(trades)
    }

    fn update_trade(&self, id: TradeId, patch: &TradePatch) -> RepoResult<Option<Trade>> {
        let result = patch_trade(self.conn, id, patch);
        match &result {
            Ok(Some(_)) => debug!("event=trade_update module=repo status=ok id={}", id),
            Ok(None) => debug!("event=trade_update module=repo status=not_found id={}", id),
            Err(err) => log_write_failure("trade_update", err),
        }
        result
    }

    fn delete_trade(&self, id: TradeId) -> RepoResult<Option<Trade>> {
        let result = remove_trade(self.conn, id);
        match &result {
            Ok(Some(_)) => debug!("event=trade_delete module=repo status=ok id={}", id),
            Ok(None) => debug!("event=trade_delete module=repo status=not_found id={}", id),
            Err(err) => log_write_failure("trade_delete", err),
        }
        result
    }
}

fn insert_trade(conn: &Connection, trade: &NewTrade) -> RepoResult<Trade> {
    let tx = begin_write(conn)?;
    tx.execute(
        "INSERT INTO trades (
            type,
            date,
            currency,
            unit_price,
            total_price,
            location,
            emerald_lot_id,
            counterparty_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            trade.kind.as_str(),
            date_to_db(trade.date),
            trade.currency.as_str(),
            trade.unit_price,
            trade.total_price,
            trade.location.as_deref(),
            trade.emerald_lot_id,
            trade.counterparty_id,
        ],
    )?;
    let id = tx.last_insert_rowid();
    let created = load_trade(&tx, id)?
        .ok_or_else(|| RepoError::InvalidData(format!("trade {id} missing after insert")))?;
    tx.commit()?;
    Ok(created)
}

fn patch_trade(conn: &Connection, id: TradeId, patch: &TradePatch) -> RepoResult<Option<Trade>> {
    let tx = begin_write(conn)?;
    let Some(mut trade) = load_trade(&tx, id)? else {
        return Ok(None);
    };

    patch.apply_to(&mut trade);
    trade.validate()?;

    tx.execute(
        "UPDATE trades
         SET
            type = ?2,
            date = ?3,
            currency = ?4,
            unit_price = ?5,
            total_price = ?6,
            location = ?7,
            emerald_lot_id = ?8,
            counterparty_id = ?9
         WHERE id = ?1;",
        params![
            id,
            trade.kind.as_str(),
            date_to_db(trade.date),
            trade.currency.as_str(),
            trade.unit_price,
            trade.total_price,
            trade.location.as_deref(),
            trade.emerald_lot_id,
            trade.counterparty_id,
        ],
    )?;
    let updated = load_trade(&tx, id)?;
    tx.commit()?;
    Ok(updated)
}

fn remove_trade(conn: &Connection, id: TradeId) -> RepoResult<Option<Trade>> {
    let tx = begin_write(conn)?;
    let Some(trade) = load_trade(&tx, id)? else {
        return Ok(None);
    };

    tx.execute("DELETE FROM trades WHERE id = ?1;", [id])?;
    tx.commit()?;
    Ok(Some(trade))
}

fn load_trade(conn: &Connection, id: TradeId) -> RepoResult<Option<Trade>> {
    let mut stmt = conn.prepare(&format!("{TRADE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_trade_row(row)?));
    }

    Ok(None)
}

fn parse_trade_row(row: &Row<'_>) -> RepoResult<Trade> {
    let type_text: String = row.get("type")?;
    let kind = type_text
        .parse()
        .map_err(|err| RepoError::InvalidData(format!("{err} in trades.type")))?;

    let date_text: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_text, TRADE_DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date value `{date_text}` in trades.date"))
    })?;

    Ok(Trade {
        id: row.get("id")?,
        kind,
        date,
        currency: row.get("currency")?,
        unit_price: row.get("unit_price")?,
        total_price: row.get("total_price")?,
        location: row.get("location")?,
        emerald_lot_id: row.get("emerald_lot_id")?,
        counterparty_id: row.get("counterparty_id")?,
    })
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(TRADE_DATE_FORMAT).to_string()
}
