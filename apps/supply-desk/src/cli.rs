//! Command-line arguments.
//!
//! Values stay raw strings where the ledger has its own parsing rules, so
//! bad input surfaces as a `VALIDATION_ERROR` rather than a clap usage error.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::consumption::ReportRequest;
use crate::commands::history::HistoryRequest;
use crate::commands::stock::AdjustRequest;

#[derive(Parser, Debug)]
#[command(
    name = "supply-desk",
    version,
    about = "Printer supply usage and stock ledger",
    long_about = "Records printer counter readings, consumes supply stock and reports low-stock alerts.\n\
                  Output is JSON on stdout; logs go to stderr (RUST_LOG)."
)]
pub struct Cli {
    /// Config file (default: $SUPPLY_CONFIG, then the platform config dir)
    #[arg(long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long = "db", global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create missing stock entries for every catalog model and supply
    Init,

    /// Record a counter reading and consume one unit of stock
    Report(ReportArgs),

    /// Manually increase or decrease stock
    Adjust(AdjustArgs),

    /// List recorded usage events, one page at a time
    History(HistoryArgs),

    /// Show stock for every model and supply
    Stock,

    /// Show entries below their low-stock threshold
    Alerts,

    /// Show printers, users and thresholds
    Catalog,

    /// Check both ledgers against the catalog
    Audit(AuditArgs),
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[arg(long = "printer")]
    pub printer: String,

    /// toner | photoconductor | fuser
    #[arg(long = "supply")]
    pub supply: String,

    /// Current page counter shown on the device
    #[arg(long = "counter", allow_hyphen_values = true)]
    pub counter: String,

    #[arg(long = "user")]
    pub user: String,

    /// YYYY-MM-DD (default: today)
    #[arg(long = "date")]
    pub date: Option<String>,

    /// HH:MM or HH:MM:SS (default: now)
    #[arg(long = "time")]
    pub time: Option<String>,
}

impl From<ReportArgs> for ReportRequest {
    fn from(args: ReportArgs) -> Self {
        ReportRequest {
            printer: args.printer,
            supply: args.supply,
            counter: args.counter,
            user: args.user,
            date: args.date,
            time: args.time,
        }
    }
}

#[derive(Args, Debug)]
pub struct AdjustArgs {
    #[arg(long = "model")]
    pub model: String,

    #[arg(long = "supply")]
    pub supply: String,

    /// increase | decrease
    #[arg(long = "action")]
    pub action: String,

    #[arg(long = "amount", allow_hyphen_values = true)]
    pub amount: String,
}

impl From<AdjustArgs> for AdjustRequest {
    fn from(args: AdjustArgs) -> Self {
        AdjustRequest {
            model: args.model,
            supply: args.supply,
            action: args.action,
            amount: args.amount,
        }
    }
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// printer | date | supply (anything else: insertion order)
    #[arg(long = "sort")]
    pub sort: Option<String>,

    /// asc | desc
    #[arg(long = "direction")]
    pub direction: Option<String>,

    /// Zero-based page index
    #[arg(long = "page", allow_hyphen_values = true)]
    pub page: Option<String>,
}

impl From<HistoryArgs> for HistoryRequest {
    fn from(args: HistoryArgs) -> Self {
        HistoryRequest {
            sort: args.sort,
            direction: args.direction,
            page: args.page,
        }
    }
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Create missing stock entries before reporting
    #[arg(long = "repair")]
    pub repair: bool,
}
