//! # Reconciliation Engine
//!
//! The only component that writes to both ledgers.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  record_consumption(report)                             │
//! │                                                                         │
//! │  write_lock (tokio::sync::Mutex, this process)                         │
//! │  └── store.write_exclusive (SQLite BEGIN IMMEDIATE, every process)     │
//! │      ┌─────────────────────────────────────────────────────────────┐   │
//! │      │ 1. snapshot of usage events + stock entries                 │   │
//! │      │ 2. reconcile::plan_consumption()     (pure, may reject)     │   │
//! │      │ 3. append event + write stock        (same transaction)     │   │
//! │      └─────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  adjust_stock takes the same path; initialize / repair take the lock.  │
//! │  usage_page / stock_overview / audit read committed state only.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The plan is computed from a snapshot that no other writer can change
//! before the commit, so two reports for one printer/supply pair never
//! read the same previous counter and an adjustment never overwrites a
//! decrement, even from another process.

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use supply_core::reconcile::{self, AuditReport};
use supply_core::usage::{paginate, sort_events};
use supply_core::validation::{parse_page_index, validate_amount, validate_page_size};
use supply_core::{
    Catalog, ConsumptionReport, CounterLookup, Page, SortDirection, SortKey, StockAdjustment,
    StockEntry, StockKey, StockLedger, UsageEvent, UsageLedger, DEFAULT_PAGE_SIZE,
};

use crate::error::{EngineError, EngineResult};
use crate::store::{LedgerStore, LedgerWrite};

// =============================================================================
// Settings & Views
// =============================================================================

/// Tunables of the engine, from the `[ledger]` and `[listing]` config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub counter_lookup: CounterLookup,
    pub page_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            counter_lookup: CounterLookup::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Listing request for the usage history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageQuery {
    pub sort_key: SortKey,
    pub direction: SortDirection,
    /// Negative values mean the first page.
    pub page_index: i64,
}

impl UsageQuery {
    /// Builds a query from raw parameters, falling back to defaults for
    /// anything missing.
    pub fn from_params(sort: Option<&str>, direction: Option<&str>, page: Option<&str>) -> Self {
        let defaults = UsageQuery::default();
        UsageQuery {
            sort_key: sort.map_or(defaults.sort_key, SortKey::from_query),
            direction: direction.map_or(defaults.direction, SortDirection::from_query),
            page_index: page.map_or(defaults.page_index, parse_page_index),
        }
    }
}

/// Stock map plus the pairs that need reordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockOverview {
    pub entries: Vec<StockEntry>,
    pub alerts: Vec<StockKey>,
}

// =============================================================================
// Engine
// =============================================================================

/// Serializes writes to the usage and stock ledgers.
#[derive(Debug)]
pub struct ReconciliationEngine<S> {
    catalog: Catalog,
    store: S,
    settings: EngineSettings,
    write_lock: Mutex<()>,
}

impl<S: LedgerStore> ReconciliationEngine<S> {
    /// Creates an engine. Fails if the page size is zero.
    pub fn new(catalog: Catalog, store: S, settings: EngineSettings) -> EngineResult<Self> {
        validate_page_size(settings.page_size)?;
        Ok(ReconciliationEngine {
            catalog,
            store,
            settings,
            write_lock: Mutex::new(()),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load_usage(&self) -> EngineResult<UsageLedger> {
        Ok(UsageLedger::from_events(self.store.load_usage_events().await?))
    }

    async fn load_stock(&self) -> EngineResult<StockLedger> {
        Ok(StockLedger::from_entries(self.store.load_stock_entries().await?))
    }

    /// Ensures every catalog model × supply pair has a stock entry.
    ///
    /// Idempotent; returns the pairs that were created with quantity 0.
    pub async fn initialize(&self) -> EngineResult<Vec<StockKey>> {
        let _guard = self.write_lock.lock().await;
        self.create_missing_stock().await
    }

    async fn create_missing_stock(&self) -> EngineResult<Vec<StockKey>> {
        let mut stock = self.load_stock().await?;
        let created = stock.initialize(&self.catalog);
        if created.is_empty() {
            debug!("Stock entries already initialized");
            return Ok(created);
        }

        let entries: Vec<StockEntry> = created
            .iter()
            .map(|key| StockEntry {
                model: key.model.clone(),
                supply: key.supply,
                quantity: 0,
            })
            .collect();
        self.store.insert_stock_entries(&entries).await?;

        info!(count = created.len(), "Created missing stock entries");
        Ok(created)
    }

    /// Records a counter reading and consumes one unit of stock.
    ///
    /// ## Errors
    /// - `Domain(Validation)` - unknown printer/user, negative counter
    /// - `Domain(StockEntryNotFound)` - model never initialized
    /// - `Persistence` - commit failed; neither ledger changed
    pub async fn record_consumption(&self, report: &ConsumptionReport) -> EngineResult<UsageEvent> {
        let _guard = self.write_lock.lock().await;

        let catalog = &self.catalog;
        let lookup = self.settings.counter_lookup;
        let (event, quantity) = self
            .store
            .write_exclusive(|current| -> EngineResult<(LedgerWrite, (UsageEvent, i64))> {
                let usage = UsageLedger::from_events(current.events);
                let stock = StockLedger::from_entries(current.stock);
                let plan = reconcile::plan_consumption(catalog, &usage, &stock, report, lookup)
                    .inspect_err(
                        |e| warn!(printer = %report.printer, error = %e, "Consumption rejected"),
                    )?;

                let output = (plan.event.clone(), plan.stock.quantity);
                Ok((
                    LedgerWrite::Consumption {
                        event: plan.event,
                        stock: plan.stock,
                    },
                    output,
                ))
            })
            .await
            .inspect_err(|e| {
                if let EngineError::Persistence(e) = e {
                    warn!(printer = %report.printer, error = %e, "Consumption commit failed");
                }
            })?;

        info!(
            id = event.id,
            printer = %event.printer,
            supply = %event.supply,
            pages = event.pages_consumed,
            stock = quantity,
            "Consumption recorded"
        );
        if event.pages_consumed < 0 {
            warn!(
                id = event.id,
                previous = event.counter_previous,
                current = event.counter_current,
                "Counter went backwards"
            );
        }

        Ok(event)
    }

    /// Applies a manual stock correction. Creates no usage event.
    pub async fn adjust_stock(&self, adjustment: &StockAdjustment) -> EngineResult<StockEntry> {
        validate_amount(adjustment.amount)?;

        let _guard = self.write_lock.lock().await;

        let entry = self
            .store
            .write_exclusive(|current| -> EngineResult<(LedgerWrite, StockEntry)> {
                let mut stock = StockLedger::from_entries(current.stock);
                let entry = stock.adjust(adjustment)?;
                Ok((LedgerWrite::Stock(entry.clone()), entry))
            })
            .await?;

        info!(
            key = %entry.key(),
            action = %adjustment.action,
            amount = adjustment.amount,
            quantity = entry.quantity,
            "Stock adjusted"
        );
        Ok(entry)
    }

    /// One page of the sorted usage history.
    pub async fn usage_page(&self, query: &UsageQuery) -> EngineResult<Page<UsageEvent>> {
        let mut events = self.store.load_usage_events().await?;
        sort_events(&mut events, query.sort_key, query.direction);
        Ok(paginate(&events, query.page_index, self.settings.page_size))
    }

    /// Current stock map and low-stock alerts.
    pub async fn stock_overview(&self) -> EngineResult<StockOverview> {
        let stock = self.load_stock().await?;
        let alerts = stock.low_stock_alerts(&self.catalog).into_iter().collect();
        Ok(StockOverview {
            entries: stock.snapshot(),
            alerts,
        })
    }

    /// Consistency findings across catalog, usage and stock.
    pub async fn audit(&self) -> EngineResult<AuditReport> {
        let usage = self.load_usage().await?;
        let stock = self.load_stock().await?;
        let report = reconcile::audit(&self.catalog, &usage, &stock);

        if report.is_clean() {
            debug!("Audit clean");
        } else {
            warn!(issues = report.issue_count(), "Audit found issues");
        }
        Ok(report)
    }

    /// Creates missing stock entries, then audits again.
    pub async fn repair(&self) -> EngineResult<AuditReport> {
        {
            let _guard = self.write_lock.lock().await;
            self.create_missing_stock().await?;
        }
        self.audit().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DbError, EngineError};
    use crate::store::MemoryLedgerStore;
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::Arc;
    use supply_core::catalog::{CatalogConfig, Thresholds};
    use supply_core::{CoreError, Printer, StockAction, SupplyType, ValidationError};

    const MX711: &str = "Lexmark MX711";

    fn catalog() -> Catalog {
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

    async fn engine() -> ReconciliationEngine<MemoryLedgerStore> {
        let engine =
            ReconciliationEngine::new(catalog(), MemoryLedgerStore::new(), EngineSettings::default())
                .unwrap();
        engine.initialize().await.unwrap();
        engine
    }

    fn report(counter: i64, day: u32) -> ConsumptionReport {
        ConsumptionReport {
            printer: "IMPADM01".to_string(),
            supply: SupplyType::Toner,
            counter_current: counter,
            user: "Bruno".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        }
    }

    fn restock(amount: i64) -> StockAdjustment {
        StockAdjustment {
            model: MX711.to_string(),
            supply: SupplyType::Toner,
            action: StockAction::Increase,
            amount,
        }
    }

    async fn toner(engine: &ReconciliationEngine<MemoryLedgerStore>) -> i64 {
        engine
            .stock_overview()
            .await
            .unwrap()
            .entries
            .into_iter()
            .find(|e| e.model == MX711 && e.supply == SupplyType::Toner)
            .map(|e| e.quantity)
            .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let engine = engine().await;
        assert!(engine.initialize().await.unwrap().is_empty());
        assert_eq!(engine.stock_overview().await.unwrap().entries.len(), 6);
    }

    #[tokio::test]
    async fn test_first_report_end_to_end() {
        let engine = engine().await;
        engine.adjust_stock(&restock(4)).await.unwrap();

        let event = engine.record_consumption(&report(1500, 1)).await.unwrap();
        assert_eq!(event.id, 1);
        assert_eq!(event.counter_previous, 0);
        assert_eq!(event.pages_consumed, 1500);
        assert_eq!(toner(&engine).await, 3);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_both_ledgers_unchanged() {
        let engine = engine().await;
        engine.adjust_stock(&restock(4)).await.unwrap();
        engine.record_consumption(&report(1500, 1)).await.unwrap();

        engine.store().fail_writes(true);
        let err = engine.record_consumption(&report(2300, 2)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Persistence(DbError::TransactionFailed(_))
        ));
        engine.store().fail_writes(false);

        assert_eq!(engine.store().load_usage_events().await.unwrap().len(), 1);
        assert_eq!(toner(&engine).await, 3);

        // the chain resumes from the last committed reading
        let event = engine.record_consumption(&report(2300, 2)).await.unwrap();
        assert_eq!(event.counter_previous, 1500);
        assert_eq!(event.id, 2);
    }

    #[tokio::test]
    async fn test_validation_failure_leaves_both_ledgers_unchanged() {
        let engine = engine().await;
        engine.adjust_stock(&restock(4)).await.unwrap();

        let mut unknown = report(10, 1);
        unknown.printer = "IMP404".to_string();
        assert!(matches!(
            engine.record_consumption(&unknown).await,
            Err(EngineError::Domain(CoreError::Validation(
                ValidationError::Unknown { .. }
            )))
        ));

        assert!(engine.record_consumption(&report(-1, 1)).await.is_err());

        let mut stranger = report(10, 1);
        stranger.user = "Mallory".to_string();
        assert!(engine.record_consumption(&stranger).await.is_err());

        assert!(engine.store().load_usage_events().await.unwrap().is_empty());
        assert_eq!(toner(&engine).await, 4);
    }

    #[tokio::test]
    async fn test_adjust_stock_rules() {
        let engine = engine().await;
        engine.adjust_stock(&restock(2)).await.unwrap();

        let decrease = StockAdjustment {
            action: StockAction::Decrease,
            ..restock(5)
        };
        assert_eq!(engine.adjust_stock(&decrease).await.unwrap().quantity, 0);

        assert!(matches!(
            engine.adjust_stock(&restock(-3)).await,
            Err(EngineError::Domain(CoreError::Validation(
                ValidationError::MustNotBeNegative { .. }
            )))
        ));

        let unknown_model = StockAdjustment {
            model: "Epson".to_string(),
            ..restock(1)
        };
        assert!(matches!(
            engine.adjust_stock(&unknown_model).await,
            Err(EngineError::Domain(CoreError::StockEntryNotFound { .. }))
        ));

        // adjustments never create usage events
        assert!(engine.store().load_usage_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_never_negative_through_reports() {
        let engine = engine().await;
        engine.adjust_stock(&restock(2)).await.unwrap();
        for i in 0..5 {
            engine
                .record_consumption(&report(100 * (i + 1), 1))
                .await
                .unwrap();
        }
        assert_eq!(toner(&engine).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reports_keep_the_chain() {
        let engine = Arc::new(engine().await);
        engine.adjust_stock(&restock(100)).await.unwrap();

        let handles: Vec<_> = (1..=20)
            .map(|i| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.record_consumption(&report(i * 10, 1)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let events = engine.store().load_usage_events().await.unwrap();
        assert_eq!(events.len(), 20);
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<i64>>());
        assert_eq!(events[0].counter_previous, 0);
        for pair in events.windows(2) {
            assert_eq!(pair[1].counter_previous, pair[0].counter_current);
        }
        assert_eq!(toner(&engine).await, 80);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_adjustments_interleaved_with_reports_lose_nothing() {
        let engine = Arc::new(engine().await);
        engine.adjust_stock(&restock(50)).await.unwrap();

        let mut handles = Vec::new();
        for i in 1..=15 {
            let reporter = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                reporter.record_consumption(&report(i * 10, 1)).await.map(|_| ())
            }));
            let adjuster = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                adjuster.adjust_stock(&restock(2)).await.map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // 50 + 15 * 2 restocked, 15 consumed
        assert_eq!(toner(&engine).await, 65);
        assert_eq!(engine.store().load_usage_events().await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_usage_page_sorting_and_bounds() {
        let engine = engine().await;
        engine.adjust_stock(&restock(20)).await.unwrap();
        for (i, day) in [3, 1, 4, 1, 5, 9, 2].into_iter().enumerate() {
            engine
                .record_consumption(&report(i as i64 * 100, day))
                .await
                .unwrap();
        }

        let newest = engine.usage_page(&UsageQuery::default()).await.unwrap();
        assert_eq!(newest.total_count, 7);
        assert_eq!(newest.items.len(), 5);
        assert_eq!(newest.items[0].date.format("%d").to_string(), "09");

        let query = UsageQuery {
            sort_key: SortKey::Insertion,
            direction: SortDirection::Desc,
            page_index: 1,
        };
        let second = engine.usage_page(&query).await.unwrap();
        let ids: Vec<i64> = second.items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![6, 7]);

        let past_end = UsageQuery {
            page_index: 9,
            ..query
        };
        assert!(engine.usage_page(&past_end).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_overview_alerts() {
        let engine = engine().await;
        engine.adjust_stock(&restock(3)).await.unwrap();

        let overview = engine.stock_overview().await.unwrap();
        assert!(!overview
            .alerts
            .contains(&StockKey::new(MX711, SupplyType::Toner)));
        assert_eq!(overview.alerts.len(), 5);
    }

    #[tokio::test]
    async fn test_repair_creates_missing_entries() {
        let store = MemoryLedgerStore::new();
        let engine =
            ReconciliationEngine::new(catalog(), store.clone(), EngineSettings::default()).unwrap();

        let before = engine.audit().await.unwrap();
        assert_eq!(before.missing_stock_keys.len(), 6);

        let after = engine.repair().await.unwrap();
        assert!(after.is_clean());
        assert_eq!(store.load_stock_entries().await.unwrap().len(), 6);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let settings = EngineSettings {
            page_size: 0,
            ..EngineSettings::default()
        };
        assert!(ReconciliationEngine::new(catalog(), MemoryLedgerStore::new(), settings).is_err());
    }

    #[test]
    fn test_query_from_params() {
        let query = UsageQuery::from_params(Some("printer"), Some("asc"), Some("2"));
        assert_eq!(query.sort_key, SortKey::Printer);
        assert_eq!(query.direction, SortDirection::Asc);
        assert_eq!(query.page_index, 2);

        let lenient = UsageQuery::from_params(Some("colour"), Some("up"), Some("two"));
        assert_eq!(lenient.sort_key, SortKey::Insertion);
        assert_eq!(lenient.direction, SortDirection::Desc);
        assert_eq!(lenient.page_index, 0);
        assert_eq!(UsageQuery::from_params(None, None, Some("-3")).page_index, 0);

        assert_eq!(UsageQuery::from_params(None, None, None), UsageQuery::default());
    }
}
