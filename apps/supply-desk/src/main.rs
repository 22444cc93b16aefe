//! # Supply Desk Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  $ supply-desk report --printer IMPADM01 --supply toner \               │
//! │        --counter 1500 --user Bruno                                      │
//! │                                                                         │
//! │  main.rs ────► tracing to stderr, parse args                           │
//! │  lib.rs  ────► config, database, engine, dispatch                      │
//! │  stdout  ◄──── { "id": 1, "pagesConsumed": 1500, ... }                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use supply_desk::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    supply_desk::init_tracing();

    let cli = Cli::parse();
    match supply_desk::run(cli).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err)?);
            std::process::exit(err.exit_code());
        }
    }
}
