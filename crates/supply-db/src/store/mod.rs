//! # Ledger Store
//!
//! Persistence seam of the reconciliation engine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         LedgerStore                                     │
//! │                                                                         │
//! │   ReconciliationEngine<S: LedgerStore>                                  │
//! │            │                                                            │
//! │            ├──► SqliteLedgerStore  (production, sqlx transactions)     │
//! │            │                                                            │
//! │            └──► MemoryLedgerStore  (tests, failure injection)          │
//! │                                                                         │
//! │   write_exclusive(decide):                                             │
//! │     read both ledgers ─► decide(snapshot) ─► apply the write           │
//! │     one exclusive unit, across every handle on the same data           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;

use supply_core::{StockEntry, UsageEvent};

use crate::error::{DbError, DbResult};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;

/// Both ledgers as read at the start of an exclusive write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// Usage events in append order.
    pub events: Vec<UsageEvent>,
    pub stock: Vec<StockEntry>,
}

/// Write chosen from a [`LedgerSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerWrite {
    /// Appends `event` and sets the quantity of the `stock` row.
    Consumption { event: UsageEvent, stock: StockEntry },

    /// Sets the quantity of one stock row.
    Stock(StockEntry),
}

/// Durable home of both ledgers.
///
/// Usage events are returned in append order.
pub trait LedgerStore: Send + Sync {
    /// All usage events in append order.
    fn load_usage_events(&self) -> impl Future<Output = DbResult<Vec<UsageEvent>>> + Send;

    /// Replaces the stored usage history.
    fn save_usage_events(
        &self,
        events: &[UsageEvent],
    ) -> impl Future<Output = DbResult<()>> + Send;

    /// All stock entries.
    fn load_stock_entries(&self) -> impl Future<Output = DbResult<Vec<StockEntry>>> + Send;

    /// Replaces the stored stock table.
    fn save_stock_entries(
        &self,
        entries: &[StockEntry],
    ) -> impl Future<Output = DbResult<()>> + Send;

    /// Adds entries whose key is not stored yet. Returns how many were added.
    fn insert_stock_entries(
        &self,
        entries: &[StockEntry],
    ) -> impl Future<Output = DbResult<u64>> + Send;

    /// Reads both ledgers, lets `decide` pick a write, and applies it.
    ///
    /// Read and write form one exclusive unit: no other writer, in this
    /// process or another one sharing the data, commits in between.
    /// Nothing is written if `decide` fails. If the write fails neither
    /// ledger changes. Updating a stock row that is not stored fails with
    /// `DbError::NotFound`.
    fn write_exclusive<T, E, F>(&self, decide: F) -> impl Future<Output = Result<T, E>> + Send
    where
        F: FnOnce(LedgerSnapshot) -> Result<(LedgerWrite, T), E> + Send,
        T: Send,
        E: From<DbError> + Send;
}
