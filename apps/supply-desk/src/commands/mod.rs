//! # Commands
//!
//! One function per CLI subcommand. Each takes the engine (generic over
//! the ledger store), returns a serializable DTO and maps every failure
//! onto [`ApiError`](crate::error::ApiError).
//!
//! ## Command Map
//! ```text
//! ┌──────────────┬───────────────────────────────┬──────────────────────┐
//! │  Subcommand  │  Function                     │  Writes              │
//! ├──────────────┼───────────────────────────────┼──────────────────────┤
//! │  init        │  stock::initialize            │  stock (missing)     │
//! │  report      │  consumption::record_consumption │ usage + stock     │
//! │  adjust      │  stock::adjust_stock          │  stock               │
//! │  history     │  history::list_usage          │  -                   │
//! │  stock       │  stock::get_stock             │  -                   │
//! │  alerts      │  stock::get_alerts            │  -                   │
//! │  catalog     │  catalog::get_catalog         │  -                   │
//! │  audit       │  audit::run_audit             │  stock if --repair   │
//! └──────────────┴───────────────────────────────┴──────────────────────┘
//! ```

pub mod audit;
pub mod catalog;
pub mod consumption;
pub mod history;
pub mod stock;

#[cfg(test)]
pub(crate) mod tests {
    use supply_core::catalog::{CatalogConfig, Thresholds};
    use supply_core::{Catalog, Printer};
    use supply_db::{Database, DbConfig, EngineSettings, ReconciliationEngine, SqliteLedgerStore};

    pub const MX711: &str = "Lexmark MX711";

    pub fn catalog() -> Catalog {
        Catalog::from_config(CatalogConfig {
            printers: vec![
                Printer::new("IMPADM01", MX711),
                Printer::new("IMP_HALL01", "Brother MFC-L6902"),
            ],
            users: vec!["Bruno".to_string(), "Kelcey".to_string()],
            thresholds: Thresholds::default(),
        })
        .unwrap()
    }

    /// Initialized engine over a fresh in-memory database.
    pub async fn test_engine() -> ReconciliationEngine<SqliteLedgerStore> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine =
            ReconciliationEngine::new(catalog(), db.ledger_store(), EngineSettings::default())
                .unwrap();
        engine.initialize().await.unwrap();
        engine
    }
}
