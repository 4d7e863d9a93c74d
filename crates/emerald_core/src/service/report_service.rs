//! Inventory and profit-and-loss reports.
//!
//! # Responsibility
//! - Provide the inventory report (lots currently in stock).
//! - Fold per-type trade totals into cost, revenue and profit.
//!
//! # Invariants
//! - `total_cost` sums PURCHASE `total_price`; `total_revenue` sums SALE
//!   `total_price`; `profit = total_revenue - total_cost`.
//! - Empty buckets contribute `0.0`.
//! - `pnl()` adds amounts across currencies without conversion. Use
//!   `pnl_by_currency()` for per-currency figures.

use crate::model::lot::EmeraldLot;
use crate::model::trade::TradeType;
use crate::repo::report_repo::{ReportRepository, TradeTotal};
use crate::repo::RepoResult;
use log::info;
use serde::Serialize;

/// Aggregate profit-and-loss figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PnlReport {
    pub total_cost: f64,
    pub total_revenue: f64,
    pub profit: f64,
}

impl PnlReport {
    fn add(&mut self, total: &TradeTotal) {
        match total.kind {
            TradeType::Purchase => self.total_cost += total.total,
            TradeType::Sale => self.total_revenue += total.total,
        }
        self.profit = self.total_revenue - self.total_cost;
    }
}

/// Profit-and-loss figures for trades in one currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyPnl {
    pub currency: String,
    #[serde(flatten)]
    pub pnl: PnlReport,
}

/// Report service facade over repository implementations.
pub struct ReportService<R: ReportRepository> {
    repo: R,
}

impl<R: ReportRepository> ReportService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists lots with status `IN_STOCK`.
    pub fn inventory(&self) -> RepoResult<Vec<EmeraldLot>> {
        let lots = self.repo.list_in_stock_lots()?;
        info!(
            "event=report_inventory module=service status=ok lot_count={}",
            lots.len()
        );
        Ok(lots)
    }

    /// Computes cost, revenue and profit over every trade.
    pub fn pnl(&self) -> RepoResult<PnlReport> {
        let totals = self.repo.trade_totals()?;
        let report = fold_pnl(&totals);
        let trade_count: u64 = totals.iter().map(|total| total.trade_count).sum();
        info!(
            "event=report_pnl module=service status=ok bucket_count={} trade_count={}",
            totals.len(),
            trade_count
        );
        Ok(report)
    }

    /// Computes cost, revenue and profit per currency, ordered by currency.
    pub fn pnl_by_currency(&self) -> RepoResult<Vec<CurrencyPnl>> {
        let totals = self.repo.trade_totals()?;
        let reports = fold_pnl_by_currency(&totals);
        info!(
            "event=report_pnl_by_currency module=service status=ok currency_count={}",
            reports.len()
        );
        Ok(reports)
    }
}

/// Folds trade totals into a single report.
pub fn fold_pnl(totals: &[TradeTotal]) -> PnlReport {
    let mut report = PnlReport::default();
    for total in totals {
        report.add(total);
    }
    report
}

/// Folds trade totals into one report per currency.
///
/// `totals` must be sorted by currency, which `trade_totals()` guarantees.
pub fn fold_pnl_by_currency(totals: &[TradeTotal]) -> Vec<CurrencyPnl> {
    let mut reports: Vec<CurrencyPnl> = Vec::new();
    for total in totals {
        match reports.last_mut() {
            Some(last) if last.currency == total.currency => last.pnl.add(total),
            _ => {
                let mut pnl = PnlReport::default();
                pnl.add(total);
                reports.push(CurrencyPnl {
                    currency: total.currency.clone(),
                    pnl,
                });
            }
        }
    }
    reports
}
