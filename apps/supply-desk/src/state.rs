//! # Ledger State
//!
//! Everything a command needs, built once per process from the config.
//!
//! The `Database` owns the pool; the engine holds a store over a clone of
//! it. Closing the state closes the pool so WAL checkpoints run on exit.

use std::path::PathBuf;

use tracing::info;

use supply_db::{Database, DbConfig, ReconciliationEngine, SqliteLedgerStore, UsageQuery};

use crate::config::AppConfig;
use crate::error::ApiError;

#[derive(Debug)]
pub struct LedgerState {
    db: Database,
    engine: ReconciliationEngine<SqliteLedgerStore>,
    default_query: UsageQuery,
}

impl LedgerState {
    /// Connects to the database and builds the engine.
    ///
    /// ## Arguments
    /// * `config` - validated configuration
    /// * `db_override` - `--db` path, takes precedence over the config
    pub async fn open(config: &AppConfig, db_override: Option<PathBuf>) -> Result<Self, ApiError> {
        let db_path = match db_override {
            Some(path) => path,
            None => config.database_path()?,
        };
        info!(?db_path, "Database path determined");

        let db_config = DbConfig::new(db_path).max_connections(config.database.max_connections);
        let db = Database::new(db_config).await?;

        Self::with_database(config, db)
    }

    /// Builds the state over an already connected database.
    pub fn with_database(config: &AppConfig, db: Database) -> Result<Self, ApiError> {
        let engine =
            ReconciliationEngine::new(config.catalog()?, db.ledger_store(), config.engine_settings())?;
        Ok(LedgerState {
            db,
            engine,
            default_query: config.default_query(),
        })
    }

    pub fn engine(&self) -> &ReconciliationEngine<SqliteLedgerStore> {
        &self.engine
    }

    pub fn default_query(&self) -> &UsageQuery {
        &self.default_query
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}
