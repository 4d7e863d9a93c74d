//! Emerald ledger command-line surface.
//!
//! Usage:
//!   emerald lots create '{"lot_code": "EM001", "carat": 2.5}'
//!   emerald lots list --status IN_STOCK --limit 20
//!   emerald trades update 4 '{"total_price": 3100.0}'
//!   emerald report pnl

mod commands;

use clap::{Parser, Subcommand};
use emerald_core::db::{open_db_with, StoreOptions};
use emerald_core::{
    default_log_level, init_logging, CounterpartyType, LotStatus, TradeType, DEFAULT_LIST_LIMIT,
};
use log::debug;
use std::path::PathBuf;

const DEFAULT_DB_FILE: &str = "emerald_ledger.sqlite3";

#[derive(Parser)]
#[command(name = "emerald")]
#[command(about = "Emerald ledger - lots, counterparties, trades and reports", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = DEFAULT_DB_FILE)]
    db: PathBuf,

    /// Store trades even when their lot or counterparty does not exist
    #[arg(long, global = true)]
    no_foreign_keys: bool,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emerald lot records
    Lots {
        #[command(subcommand)]
        action: LotAction,
    },

    /// Supplier and buyer records
    Counterparties {
        #[command(subcommand)]
        action: CounterpartyAction,
    },

    /// Purchase and sale records
    Trades {
        #[command(subcommand)]
        action: TradeAction,
    },

    /// Derived reports
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
}

#[derive(Subcommand)]
enum LotAction {
    /// Create a lot from a JSON payload (`-` reads stdin)
    Create { payload: String },

    /// List lots in id order
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
        /// IN_STOCK or SOLD
        #[arg(long)]
        status: Option<LotStatus>,
    },

    /// Show one lot
    Get { id: i64 },

    /// Apply a partial JSON update (`-` reads stdin)
    Update { id: i64, payload: String },

    /// Delete a lot and print its last state
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum CounterpartyAction {
    /// Create a counterparty from a JSON payload (`-` reads stdin)
    Create { payload: String },

    /// List counterparties in id order
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
        /// SUPPLIER, BUYER or BOTH
        #[arg(long = "type")]
        kind: Option<CounterpartyType>,
    },

    /// Show one counterparty
    Get { id: i64 },

    /// Apply a partial JSON update (`-` reads stdin)
    Update { id: i64, payload: String },

    /// Delete a counterparty and print its last state
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum TradeAction {
    /// Create a trade from a JSON payload (`-` reads stdin)
    Create { payload: String },

    /// List trades in id order
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
        /// PURCHASE or SALE
        #[arg(long = "type")]
        kind: Option<TradeType>,
        /// Only trades on this lot
        #[arg(long = "lot")]
        lot_id: Option<i64>,
        /// Only trades with this counterparty
        #[arg(long = "counterparty")]
        counterparty_id: Option<i64>,
    },

    /// Show one trade
    Get { id: i64 },

    /// Apply a partial JSON update (`-` reads stdin)
    Update { id: i64, payload: String },

    /// Delete a trade and print its last state
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ReportAction {
    /// Lots currently in stock
    Inventory,

    /// Total cost, revenue and profit over all trades
    Pnl,

    /// Cost, revenue and profit per currency
    PnlByCurrency,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_ref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let options = StoreOptions {
        enforce_foreign_keys: !cli.no_foreign_keys,
        ..StoreOptions::default()
    };
    let conn = open_db_with(&cli.db, &options)?;
    debug!(
        "event=cli_start module=cli status=ok db={} foreign_keys={}",
        cli.db.display(),
        options.enforce_foreign_keys
    );

    match cli.command {
        Commands::Lots { action } => commands::lots(&conn, action),
        Commands::Counterparties { action } => commands::counterparties(&conn, action),
        Commands::Trades { action } => commands::trades(&conn, action),
        Commands::Report { action } => commands::report(&conn, action),
    }
}
