//! # Reconciliation Rules
//!
//! Pure planning for the two-ledger write and the consistency audit.
//!
//! ## Consumption Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    plan_consumption()                                   │
//! │                                                                         │
//! │  ConsumptionReport                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. printer ──► Catalog ──► model        (unknown printer → reject)    │
//! │  2. user / counter checks                (reject before any mutation)  │
//! │  3. previous = UsageLedger.find_latest_counter(printer, supply)        │
//! │  4. event    = { pages = current - previous, id = next_id }            │
//! │  5. stock    = StockLedger.decremented(model, supply, 1)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ConsumptionPlan { event, stock }  ──►  committed together or not at   │
//! │                                         all by the persistence layer   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this module mutates a ledger. The caller commits the plan and
//! then, if it keeps ledgers in memory, applies it with
//! [`apply_consumption`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::CoreResult;
use crate::stock::StockLedger;
use crate::types::{ConsumptionReport, CounterLookup, StockEntry, StockKey, SupplyType, UsageEvent};
use crate::usage::UsageLedger;
use crate::validation::validate_counter;

/// Units consumed per accepted report.
pub const UNITS_PER_REPORT: u32 = 1;

// =============================================================================
// Consumption Planning
// =============================================================================

/// Rows produced by one accepted consumption report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumptionPlan {
    /// Usage event to append.
    pub event: UsageEvent,
    /// Stock entry after the decrement.
    pub stock: StockEntry,
}

/// Validates a report and computes the rows it would write.
///
/// ## Validation order
/// 1. Printer must be in the catalog
/// 2. User must be known (when the catalog lists users)
/// 3. Counter must not be negative
/// 4. The printer's model must have a stock entry
///
/// A counter lower than the previous reading is accepted and yields a
/// negative page count.
pub fn plan_consumption(
    catalog: &Catalog,
    usage: &UsageLedger,
    stock: &StockLedger,
    report: &ConsumptionReport,
    lookup: CounterLookup,
) -> CoreResult<ConsumptionPlan> {
    let model = catalog.resolve_model(&report.printer)?;
    catalog.check_user(&report.user)?;
    validate_counter(report.counter_current)?;

    let stock = stock.decremented(model, report.supply, UNITS_PER_REPORT)?;
    let event = usage.derive_event(report, model, lookup);

    Ok(ConsumptionPlan { event, stock })
}

/// Applies a committed plan to in-memory ledgers.
pub fn apply_consumption(
    usage: &mut UsageLedger,
    stock: &mut StockLedger,
    plan: &ConsumptionPlan,
) -> CoreResult<()> {
    stock.decrement(&plan.event.model, plan.event.supply, UNITS_PER_REPORT)?;
    usage.append(plan.event.clone());
    Ok(())
}

// =============================================================================
// Audit
// =============================================================================

/// A usage event whose printer is no longer in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnknownPrinter {
    pub event_id: i64,
    pub printer: String,
}

/// A usage event recorded under a model the printer no longer has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ModelMismatch {
    pub event_id: i64,
    pub printer: String,
    pub recorded_model: String,
    pub catalog_model: String,
}

/// An event whose `counter_previous` does not continue its pair's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChainBreak {
    pub event_id: i64,
    pub printer: String,
    pub supply: SupplyType,
    /// `counter_current` of the prior event for the pair (0 if none).
    pub expected_previous: i64,
    pub recorded_previous: i64,
}

/// Findings of a consistency pass over both ledgers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuditReport {
    /// Catalog pairs with no stock entry. Repairable.
    pub missing_stock_keys: Vec<StockKey>,
    pub unknown_printers: Vec<UnknownPrinter>,
    pub model_mismatches: Vec<ModelMismatch>,
    pub chain_breaks: Vec<ChainBreak>,
}

impl AuditReport {
    /// Returns true if nothing was found.
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }

    pub fn issue_count(&self) -> usize {
        self.missing_stock_keys.len()
            + self.unknown_printers.len()
            + self.model_mismatches.len()
            + self.chain_breaks.len()
    }

    /// Returns true if [`StockLedger::initialize`] would fix something.
    pub fn is_repairable(&self) -> bool {
        !self.missing_stock_keys.is_empty()
    }
}

/// Checks both ledgers against the catalog and each other.
///
/// Events are immutable, so only missing stock keys can be repaired; the
/// other findings are informational.
pub fn audit(catalog: &Catalog, usage: &UsageLedger, stock: &StockLedger) -> AuditReport {
    let missing_stock_keys = catalog
        .stock_keys()
        .into_iter()
        .filter(|key| !stock.contains(key))
        .collect();

    let mut unknown_printers = Vec::new();
    let mut model_mismatches = Vec::new();
    let mut chain_breaks = Vec::new();
    let mut reported_unknown = BTreeSet::new();
    let mut last_counter: BTreeMap<(&str, SupplyType), i64> = BTreeMap::new();

    for event in usage.events() {
        match catalog.model_of(&event.printer) {
            None => {
                // one finding per printer; the first event identifies it
                if reported_unknown.insert(event.printer.as_str()) {
                    unknown_printers.push(UnknownPrinter {
                        event_id: event.id,
                        printer: event.printer.clone(),
                    });
                }
            }
            Some(model) if model != event.model => {
                model_mismatches.push(ModelMismatch {
                    event_id: event.id,
                    printer: event.printer.clone(),
                    recorded_model: event.model.clone(),
                    catalog_model: model.to_string(),
                });
            }
            Some(_) => {}
        }

        let expected = last_counter
            .insert((event.printer.as_str(), event.supply), event.counter_current)
            .unwrap_or(0);
        if event.counter_previous != expected {
            chain_breaks.push(ChainBreak {
                event_id: event.id,
                printer: event.printer.clone(),
                supply: event.supply,
                expected_previous: expected,
                recorded_previous: event.counter_previous,
            });
        }
    }

    AuditReport {
        missing_stock_keys,
        unknown_printers,
        model_mismatches,
        chain_breaks,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
