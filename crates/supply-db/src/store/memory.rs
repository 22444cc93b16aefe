//! In-memory [`LedgerStore`] for tests.
//!
//! Writes can be made to fail on demand to exercise the engine's
//! all-or-nothing behaviour.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use supply_core::{StockEntry, StockKey, UsageEvent};

use crate::error::{DbError, DbResult};
use crate::store::{LedgerSnapshot, LedgerStore, LedgerWrite};

#[derive(Debug, Default)]
struct MemoryState {
    events: Vec<UsageEvent>,
    stock: BTreeMap<StockKey, i64>,
}

/// Mock ledger store.
///
/// Clones share state, so a test can keep a handle while the engine owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with stock entries.
    pub fn with_stock(entries: impl IntoIterator<Item = StockEntry>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.stock = entries
                .into_iter()
                .map(|e| (e.key(), e.quantity))
                .collect();
        }
        store
    }

    /// While set, every write fails with `DbError::TransactionFailed`
    /// and changes nothing.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| DbError::Internal("memory store poisoned".to_string()))
    }

    fn check_writable(&self) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::TransactionFailed("injected write failure".to_string()));
        }
        Ok(())
    }
}

fn snapshot(stock: &BTreeMap<StockKey, i64>) -> Vec<StockEntry> {
    stock
        .iter()
        .map(|(key, quantity)| StockEntry {
            model: key.model.clone(),
            supply: key.supply,
            quantity: *quantity,
        })
        .collect()
}

fn check_quantity(entry: &StockEntry) -> DbResult<()> {
    if entry.quantity < 0 {
        return Err(DbError::ConstraintViolation(
            "CHECK constraint failed: quantity >= 0".to_string(),
        ));
    }
    Ok(())
}

impl LedgerStore for MemoryLedgerStore {
    fn load_usage_events(&self) -> impl Future<Output = DbResult<Vec<UsageEvent>>> + Send {
        let result = self.lock().map(|state| state.events.clone());
        async move { result }
    }

    fn save_usage_events(
        &self,
        events: &[UsageEvent],
    ) -> impl Future<Output = DbResult<()>> + Send {
        let result = self.check_writable().and_then(|()| {
            let mut events = events.to_vec();
            events.sort_by_key(|e| e.id);
            self.lock()?.events = events;
            Ok(())
        });
        async move { result }
    }

    fn load_stock_entries(&self) -> impl Future<Output = DbResult<Vec<StockEntry>>> + Send {
        let result = self.lock().map(|state| snapshot(&state.stock));
        async move { result }
    }

    fn save_stock_entries(
        &self,
        entries: &[StockEntry],
    ) -> impl Future<Output = DbResult<()>> + Send {
        let result = self.check_writable().and_then(|()| {
            entries.iter().try_for_each(check_quantity)?;
            self.lock()?.stock = entries.iter().map(|e| (e.key(), e.quantity)).collect();
            Ok(())
        });
        async move { result }
    }

    fn insert_stock_entries(
        &self,
        entries: &[StockEntry],
    ) -> impl Future<Output = DbResult<u64>> + Send {
        let result = self.check_writable().and_then(|()| {
            entries.iter().try_for_each(check_quantity)?;
            let mut state = self.lock()?;
            let mut created: u64 = 0;
            for entry in entries {
                if !state.stock.contains_key(&entry.key()) {
                    state.stock.insert(entry.key(), entry.quantity);
                    created += 1;
                }
            }
            Ok(created)
        });
        async move { result }
    }

    fn write_exclusive<T, E, F>(&self, decide: F) -> impl Future<Output = Result<T, E>> + Send
    where
        F: FnOnce(LedgerSnapshot) -> Result<(LedgerWrite, T), E> + Send,
        T: Send,
        E: From<DbError> + Send,
    {
        let result = self.write_locked(decide);
        async move { result }
    }
}

impl MemoryLedgerStore {
    // The state lock is held from snapshot to write.
    fn write_locked<T, E, F>(&self, decide: F) -> Result<T, E>
    where
        F: FnOnce(LedgerSnapshot) -> Result<(LedgerWrite, T), E>,
        E: From<DbError>,
    {
        let mut state = self.lock()?;
        let current = LedgerSnapshot {
            events: state.events.clone(),
            stock: snapshot(&state.stock),
        };
        let (write, output) = decide(current)?;

        self.check_writable()?;
        apply(&mut state, write)?;
        Ok(output)
    }
}

/// Validates every part of `write` before applying any of it.
fn apply(state: &mut MemoryState, write: LedgerWrite) -> DbResult<()> {
    let (event, stock) = match write {
        LedgerWrite::Consumption { event, stock } => (Some(event), stock),
        LedgerWrite::Stock(stock) => (None, stock),
    };
    check_quantity(&stock)?;

    if let Some(event) = &event {
        if state.events.iter().any(|e| e.id == event.id) {
            return Err(DbError::UniqueViolation {
                field: "usage_events.id".to_string(),
                value: event.id.to_string(),
            });
        }
    }
    let quantity = state
        .stock
        .get_mut(&stock.key())
        .ok_or_else(|| DbError::not_found("Stock entry", stock.key().to_string()))?;

    *quantity = stock.quantity;
    state.events.extend(event);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use supply_core::SupplyType;

    fn entry(quantity: i64) -> StockEntry {
        StockEntry {
            model: "HP M750".to_string(),
            supply: SupplyType::Fuser,
            quantity,
        }
    }

    fn event(id: i64) -> UsageEvent {
        UsageEvent {
            id,
            printer: "HP Color".to_string(),
            model: "HP M750".to_string(),
            supply: SupplyType::Fuser,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            user: "Andrei".to_string(),
            counter_current: 10,
            counter_previous: 0,
            pages_consumed: 10,
        }
    }

    async fn commit(
        store: &MemoryLedgerStore,
        event: UsageEvent,
        stock: StockEntry,
    ) -> DbResult<()> {
        store
            .write_exclusive(|_| Ok::<_, DbError>((LedgerWrite::Consumption { event, stock }, ())))
            .await
    }

    #[tokio::test]
    async fn test_injected_failure_changes_nothing() {
        let store = MemoryLedgerStore::with_stock([entry(2)]);
        store.fail_writes(true);

        assert!(commit(&store, event(1), entry(1)).await.is_err());
        assert!(store.load_usage_events().await.unwrap().is_empty());
        assert_eq!(store.load_stock_entries().await.unwrap(), vec![entry(2)]);

        store.fail_writes(false);
        commit(&store, event(1), entry(1)).await.unwrap();
        assert_eq!(store.load_stock_entries().await.unwrap(), vec![entry(1)]);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = MemoryLedgerStore::new();
        let err = commit(&store, event(1), entry(1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(store.load_usage_events().await.unwrap().is_empty());

        let store = MemoryLedgerStore::with_stock([entry(3)]);
        commit(&store, event(1), entry(2)).await.unwrap();
        let err = commit(&store, event(1), entry(1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(store.load_stock_entries().await.unwrap(), vec![entry(2)]);
    }

    #[tokio::test]
    async fn test_stock_write_never_creates_events() {
        let store = MemoryLedgerStore::with_stock([entry(3)]);
        let before = store
            .write_exclusive(|current| {
                Ok::<_, DbError>((LedgerWrite::Stock(entry(8)), current.stock[0].quantity))
            })
            .await
            .unwrap();
        assert_eq!(before, 3);
        assert_eq!(store.load_stock_entries().await.unwrap(), vec![entry(8)]);
        assert!(store.load_usage_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryLedgerStore::new();
        let handle = store.clone();
        store.insert_stock_entries(&[entry(5)]).await.unwrap();
        assert_eq!(handle.load_stock_entries().await.unwrap(), vec![entry(5)]);
    }
}
