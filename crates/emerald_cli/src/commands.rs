//! Sub-command handlers. Each prints its result as pretty JSON on stdout.

use crate::{CounterpartyAction, LotAction, ReportAction, TradeAction};
use anyhow::{anyhow, Context, Result};
use emerald_core::{
    CounterpartyListQuery, CounterpartyRepository, LotListQuery, LotRepository, ReportService,
    SqliteCounterpartyRepository, SqliteLotRepository, SqliteReportRepository,
    SqliteTradeRepository, TradeListQuery, TradeRepository,
};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;

pub(crate) fn lots(conn: &Connection, action: LotAction) -> Result<()> {
    let repo = SqliteLotRepository::try_new(conn)?;
    match action {
        LotAction::Create { payload } => print_json(&repo.create_lot(&parse_payload(&payload)?)?),
        LotAction::List {
            skip,
            limit,
            status,
        } => print_json(&repo.list_lots(&LotListQuery {
            status,
            skip,
            limit,
        })?),
        LotAction::Get { id } => print_found("lot", id, repo.get_lot(id)?),
        LotAction::Update { id, payload } => {
            print_found("lot", id, repo.update_lot(id, &parse_payload(&payload)?)?)
        }
        LotAction::Delete { id } => print_found("lot", id, repo.delete_lot(id)?),
    }
}

pub(crate) fn counterparties(conn: &Connection, action: CounterpartyAction) -> Result<()> {
    let repo = SqliteCounterpartyRepository::try_new(conn)?;
    match action {
        CounterpartyAction::Create { payload } => {
            print_json(&repo.create_counterparty(&parse_payload(&payload)?)?)
        }
        CounterpartyAction::List { skip, limit, kind } => {
            print_json(&repo.list_counterparties(&CounterpartyListQuery { kind, skip, limit })?)
        }
        CounterpartyAction::Get { id } => {
            print_found("counterparty", id, repo.get_counterparty(id)?)
        }
        CounterpartyAction::Update { id, payload } => print_found(
            "counterparty",
            id,
            repo.update_counterparty(id, &parse_payload(&payload)?)?,
        ),
        CounterpartyAction::Delete { id } => {
            print_found("counterparty", id, repo.delete_counterparty(id)?)
        }
    }
}

pub(crate) fn trades(conn: &Connection, action: TradeAction) -> Result<()> {
    let repo = SqliteTradeRepository::try_new(conn)?;
    match action {
        TradeAction::Create { payload } => {
            print_json(&repo.create_trade(&parse_payload(&payload)?)?)
        }
        TradeAction::List {
            skip,
            limit,
            kind,
            lot_id,
            counterparty_id,
        } => print_json(&repo.list_trades(&TradeListQuery {
            kind,
            emerald_lot_id: lot_id,
            counterparty_id,
            skip,
            limit,
        })?),
        TradeAction::Get { id } => print_found("trade", id, repo.get_trade(id)?),
        TradeAction::Update { id, payload } => print_found(
            "trade",
            id,
            repo.update_trade(id, &parse_payload(&payload)?)?,
        ),
        TradeAction::Delete { id } => print_found("trade", id, repo.delete_trade(id)?),
    }
}

pub(crate) fn report(conn: &Connection, action: ReportAction) -> Result<()> {
    let service = ReportService::new(SqliteReportRepository::try_new(conn)?);
    match action {
        ReportAction::Inventory => print_json(&service.inventory()?),
        ReportAction::Pnl => print_json(&service.pnl()?),
        ReportAction::PnlByCurrency => print_json(&service.pnl_by_currency()?),
    }
}

/// Decodes a JSON payload given inline, or from stdin when `raw` is `-`.
fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let text = if raw == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read payload from stdin")?;
        buffer
    } else {
        raw.to_string()
    };
    serde_json::from_str(&text).context("invalid JSON payload")
}

fn print_found<T: Serialize>(entity: &str, id: i64, value: Option<T>) -> Result<()> {
    let value = value.ok_or_else(|| anyhow!("{entity} {id} not found"))?;
    print_json(&value)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
