//! # Supply Desk Library
//!
//! Command-line front desk for the printer supply ledger.
//!
//! ## Module Organization
//! ```text
//! supply_desk/
//! ├── lib.rs          ◄─── You are here (tracing, dispatch)
//! ├── cli.rs          ◄─── clap argument definitions
//! ├── config.rs       ◄─── supplies.toml + environment overrides
//! ├── state.rs        ◄─── Database + engine built from the config
//! ├── commands/
//! │   ├── consumption.rs ◄─ report
//! │   ├── stock.rs       ◄─ init, adjust, stock, alerts
//! │   ├── history.rs     ◄─ history
//! │   ├── catalog.rs     ◄─ catalog
//! │   └── audit.rs       ◄─ audit [--repair]
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Output Contract
//! Results are pretty JSON on stdout. Failures print an `ApiError` on
//! stdout and exit non-zero. Logs always go to stderr.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use commands::{audit, catalog, consumption, history, stock};
use config::AppConfig;
use error::ApiError;
use state::LedgerState;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=sqlx=debug` - Show executed queries
/// - Default: `info,supply=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,supply=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one CLI invocation and returns its JSON output.
///
/// ## Sequence
/// 1. Load and validate the config
/// 2. `catalog` answers from the config alone
/// 3. Otherwise connect to the database (migrations run on connect)
/// 4. Execute the subcommand, then close the pool
pub async fn run(cli: Cli) -> Result<Value, ApiError> {
    let config = AppConfig::load(cli.config)?;

    if let Command::Catalog = cli.command {
        return to_json(catalog::get_catalog(&config.catalog()?));
    }

    let state = LedgerState::open(&config, cli.db).await?;
    let result = execute(&state, cli.command).await;
    state.close().await;
    result
}

/// Dispatches a subcommand against an open ledger.
///
/// `report` and `adjust` create missing stock entries first, so a model
/// added to the catalog is usable right away.
pub async fn execute(state: &LedgerState, command: Command) -> Result<Value, ApiError> {
    let engine = state.engine();
    debug!(?command, "Executing command");

    match command {
        Command::Init => {
            let result = stock::initialize(engine).await?;
            info!(created = result.created.len(), "Stock initialized");
            to_json(result)
        }
        Command::Report(args) => {
            engine.initialize().await?;
            to_json(consumption::record_consumption(engine, &args.into()).await?)
        }
        Command::Adjust(args) => {
            engine.initialize().await?;
            to_json(stock::adjust_stock(engine, &args.into()).await?)
        }
        Command::History(args) => {
            to_json(history::list_usage(engine, &args.into(), state.default_query()).await?)
        }
        Command::Stock => to_json(stock::get_stock(engine).await?),
        Command::Alerts => to_json(stock::get_alerts(engine).await?),
        Command::Catalog => to_json(catalog::get_catalog(engine.catalog())),
        Command::Audit(args) => to_json(audit::run_audit(engine, args.repair).await?),
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use supply_db::{Database, DbConfig};

    const SAMPLE: &str = include_str!("../../../config/supplies.toml");

    async fn state() -> LedgerState {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        LedgerState::with_database(&config, db).unwrap()
    }

    async fn exec(state: &LedgerState, args: &[&str]) -> Result<Value, ApiError> {
        let cli = Cli::try_parse_from(std::iter::once("supply-desk").chain(args.iter().copied()))
            .unwrap();
        execute(state, cli.command).await
    }

    #[tokio::test]
    async fn test_report_then_history_and_stock() {
        let state = state().await;

        exec(
            &state,
            &["adjust", "--model", "HP M750", "--supply", "toner", "--action", "increase", "--amount", "4"],
        )
        .await
        .unwrap();

        let event = exec(
            &state,
            &[
                "report", "--printer", "HP Color", "--supply", "toner", "--counter", "1500",
                "--user", "Andrei", "--date", "2024-07-01", "--time", "10:15",
            ],
        )
        .await
        .unwrap();
        assert_eq!(event["counterPrevious"], 0);
        assert_eq!(event["pagesConsumed"], 1500);
        assert_eq!(event["model"], "HP M750");

        let page = exec(&state, &["history"]).await.unwrap();
        assert_eq!(page["totalCount"], 1);
        assert_eq!(page["items"][0]["displayDate"], "01-07-2024");

        let stock = exec(&state, &["stock"]).await.unwrap();
        let toner = stock["entries"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["model"] == "HP M750" && e["supply"] == "toner")
            .cloned()
            .unwrap();
        assert_eq!(toner["quantity"], 3);
        assert_eq!(toner["low"], false);
    }

    #[tokio::test]
    async fn test_init_and_audit() {
        let state = state().await;

        let audit = exec(&state, &["audit"]).await.unwrap();
        assert_eq!(audit["clean"], false);

        let init = exec(&state, &["init"]).await.unwrap();
        assert_eq!(init["created"].as_array().unwrap().len(), 12);

        let audit = exec(&state, &["audit"]).await.unwrap();
        assert_eq!(audit["clean"], true);

        let alerts = exec(&state, &["alerts"]).await.unwrap();
        assert_eq!(alerts.as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_errors_carry_codes() {
        let state = state().await;

        let err = exec(
            &state,
            &["report", "--printer", "IMP404", "--supply", "toner", "--counter", "1", "--user", "Paulo"],
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, error::ErrorCode::ValidationError);

        let err = exec(
            &state,
            &["report", "--printer", "IMPADM01", "--supply", "toner", "--counter", "1", "--user", "Mallory"],
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, error::ErrorCode::ValidationError);

        let catalog = exec(&state, &["catalog"]).await.unwrap();
        assert_eq!(catalog["printers"].as_array().unwrap().len(), 5);
    }
}
