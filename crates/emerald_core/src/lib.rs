//! Core domain logic for the emerald ledger.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::counterparty::{
    Counterparty, CounterpartyId, CounterpartyPatch, CounterpartyType, NewCounterparty,
};
pub use model::lot::{EmeraldLot, EmeraldLotPatch, LotId, LotStatus, NewEmeraldLot};
pub use model::trade::{NewTrade, Trade, TradeId, TradePatch, TradeType};
pub use model::{UnknownTag, ValidationError};
pub use repo::counterparty_repo::{
    CounterpartyListQuery, CounterpartyRepository, SqliteCounterpartyRepository,
};
pub use repo::lot_repo::{LotListQuery, LotRepository, SqliteLotRepository};
pub use repo::report_repo::{ReportRepository, SqliteReportRepository, TradeTotal};
pub use repo::trade_repo::{SqliteTradeRepository, TradeListQuery, TradeRepository};
pub use repo::{RepoError, RepoResult, DEFAULT_LIST_LIMIT};
pub use service::report_service::{CurrencyPnl, PnlReport, ReportService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
