//! Read-only report queries over lots and trades.
//!
//! # Responsibility
//! - Load the current inventory (lots flagged `IN_STOCK`).
//! - Aggregate trade `total_price` per currency and trade type.
//!
//! # Invariants
//! - Totals are raw sums of `total_price`; no currency conversion happens.
//! - Output ordering is deterministic (`id ASC`, `currency ASC, type ASC`).

use crate::model::lot::{EmeraldLot, LotStatus};
use crate::model::trade::TradeType;
use crate::repo::lot_repo::list_lots_with_status;
use crate::repo::{ensure_table_ready, RepoError, RepoResult};
use rusqlite::Connection;

/// Sum of `total_price` for one `(currency, type)` bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeTotal {
    pub currency: String,
    pub kind: TradeType,
    pub total: f64,
    pub trade_count: u64,
}

/// Repository interface for report queries.
pub trait ReportRepository {
    /// Returns every lot whose status is `IN_STOCK`, unpaginated.
    fn list_in_stock_lots(&self) -> RepoResult<Vec<EmeraldLot>>;
    /// Returns per-currency, per-type trade totals. Empty when no trades exist.
    fn trade_totals(&self) -> RepoResult<Vec<TradeTotal>>;
}

/// SQLite-backed report repository.
pub struct SqliteReportRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReportRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "emerald_lots", &["id", "status"])?;
        ensure_table_ready(conn, "trades", &["type", "currency", "total_price"])?;
        Ok(Self { conn })
    }
}

impl ReportRepository for SqliteReportRepository<'_> {
    fn list_in_stock_lots(&self) -> RepoResult<Vec<EmeraldLot>> {
        list_lots_with_status(self.conn, LotStatus::InStock)
    }

    fn trade_totals(&self) -> RepoResult<Vec<TradeTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                currency,
                type,
                TOTAL(total_price) AS total,
                COUNT(*) AS trade_count
             FROM trades
             GROUP BY currency, type
             ORDER BY currency ASC, type ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut totals = Vec::new();
        while let Some(row) = rows.next()? {
            let type_text: String = row.get("type")?;
            let kind = type_text
                .parse()
                .map_err(|err| RepoError::InvalidData(format!("{err} in trades.type")))?;
            let trade_count: i64 = row.get("trade_count")?;
            totals.push(TradeTotal {
                currency: row.get("currency")?,
                kind,
                total: row.get("total")?,
                trade_count: u64::try_from(trade_count).unwrap_or_default(),
            });
        }

        Ok(totals)
    }
}
