//! # SQLite Ledger Store
//!
//! ## Exclusive Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   BEGIN IMMEDIATE                                       │
//! │   (takes the database write lock; other writers wait busy_timeout)     │
//! │                                                                         │
//! │  1. SELECT usage_events, stock_entries    → LedgerSnapshot             │
//! │  2. decide(snapshot)                      → LedgerWrite                │
//! │  3. INSERT INTO usage_events (...)          (consumption only)         │
//! │  4. UPDATE stock_entries SET quantity = ? WHERE model = ? AND supply = ?│
//! │     └── 0 rows? → rollback, NotFound                                   │
//! │                                                                         │
//! │  COMMIT ← snapshot still current, both rows or neither                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock lives in the database file, so separate `supply-desk`
//! processes are serialized as well as tasks of one process.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use supply_core::{StockEntry, UsageEvent};

use crate::error::{DbError, DbResult};
use crate::repository::stock::StockRepository;
use crate::repository::usage::UsageRepository;
use crate::store::{LedgerSnapshot, LedgerStore, LedgerWrite};

/// [`LedgerStore`] over the `usage_events` and `stock_entries` tables.
#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteLedgerStore { pool }
    }

    fn usage(&self) -> UsageRepository {
        UsageRepository::new(self.pool.clone())
    }

    fn stock(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }
}

fn stock_not_found(entry: &StockEntry) -> DbError {
    DbError::not_found("Stock entry", entry.key().to_string())
}

async fn update_existing(conn: &mut SqliteConnection, entry: &StockEntry) -> DbResult<()> {
    let updated = StockRepository::update_quantity(&mut *conn, entry).await?;
    if updated == 0 {
        warn!(key = %entry.key(), "Stock entry missing during write");
        return Err(stock_not_found(entry));
    }
    Ok(())
}

async fn apply(conn: &mut SqliteConnection, write: &LedgerWrite) -> DbResult<()> {
    match write {
        LedgerWrite::Consumption { event, stock } => {
            UsageRepository::insert(&mut *conn, event).await?;
            update_existing(conn, stock).await
        }
        LedgerWrite::Stock(entry) => update_existing(conn, entry).await,
    }
}

impl LedgerStore for SqliteLedgerStore {
    async fn load_usage_events(&self) -> DbResult<Vec<UsageEvent>> {
        self.usage().list_all().await
    }

    async fn save_usage_events(&self, events: &[UsageEvent]) -> DbResult<()> {
        self.usage().replace_all(events).await
    }

    async fn load_stock_entries(&self) -> DbResult<Vec<StockEntry>> {
        self.stock().list_all().await
    }

    async fn save_stock_entries(&self, entries: &[StockEntry]) -> DbResult<()> {
        self.stock().replace_all(entries).await
    }

    async fn insert_stock_entries(&self, entries: &[StockEntry]) -> DbResult<u64> {
        self.stock().insert_missing(entries).await
    }

    async fn write_exclusive<T, E, F>(&self, decide: F) -> Result<T, E>
    where
        F: FnOnce(LedgerSnapshot) -> Result<(LedgerWrite, T), E> + Send,
        T: Send,
        E: From<DbError> + Send,
    {
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let snapshot = LedgerSnapshot {
            events: UsageRepository::load_all(&mut *tx).await?,
            stock: StockRepository::load_all(&mut *tx).await?,
        };

        // an early return drops the transaction, which rolls it back
        let (write, output) = decide(snapshot)?;
        apply(&mut *tx, &write).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(?write, "Exclusive write committed");
        Ok(output)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
