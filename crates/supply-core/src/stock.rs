//! # Stock Ledger
//!
//! Units on hand per (model, supply) pair.
//!
//! ## Quantity Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Quantity Rules                                 │
//! │                                                                         │
//! │  decrement(n)   quantity = max(0, quantity - n)   never fails on       │
//! │                                                   underflow             │
//! │  increase(n)    quantity = quantity + n           saturating            │
//! │  decrease(n)    quantity = max(0, quantity - n)                        │
//! │                                                                         │
//! │  n < 0 on a manual adjustment → ValidationError                        │
//! │  unknown (model, supply)      → CoreError::StockEntryNotFound          │
//! │                                                                         │
//! │  Example: quantity 2, decrement ×5 → 1, 0, 0, 0, 0                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::types::{StockAction, StockAdjustment, StockEntry, StockKey, SupplyType};
use crate::validation::validate_amount;

/// In-memory view of the stock table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLedger {
    entries: BTreeMap<StockKey, i64>,
}

impl StockLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        StockLedger::default()
    }

    /// Builds a ledger from stored rows. Negative quantities are clamped.
    pub fn from_entries(entries: impl IntoIterator<Item = StockEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| (StockKey::new(e.model, e.supply), e.quantity.max(0)))
            .collect();
        StockLedger { entries }
    }

    /// All entries ordered by (model, supply).
    pub fn snapshot(&self) -> Vec<StockEntry> {
        self.entries
            .iter()
            .map(|(key, quantity)| StockEntry {
                model: key.model.clone(),
                supply: key.supply,
                quantity: *quantity,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &StockKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Current quantity for a pair.
    pub fn get(&self, model: &str, supply: SupplyType) -> CoreResult<i64> {
        self.entries
            .get(&StockKey::new(model, supply))
            .copied()
            .ok_or_else(|| CoreError::stock_not_found(model, supply))
    }

    /// Current entry for a pair.
    pub fn entry(&self, model: &str, supply: SupplyType) -> CoreResult<StockEntry> {
        let quantity = self.get(model, supply)?;
        Ok(StockEntry {
            model: model.to_string(),
            supply,
            quantity,
        })
    }

    /// Creates a zero entry for every catalog pair that lacks one.
    ///
    /// Existing quantities are left alone. Returns the keys that were
    /// created.
    pub fn initialize(&mut self, catalog: &Catalog) -> Vec<StockKey> {
        let mut created = Vec::new();
        for key in catalog.stock_keys() {
            if !self.entries.contains_key(&key) {
                self.entries.insert(key.clone(), 0);
                created.push(key);
            }
        }
        created
    }

    /// Entry as it would be after consuming `amount` units. Does not mutate.
    pub fn decremented(
        &self,
        model: &str,
        supply: SupplyType,
        amount: u32,
    ) -> CoreResult<StockEntry> {
        let mut entry = self.entry(model, supply)?;
        entry.quantity = (entry.quantity - i64::from(amount)).max(0);
        Ok(entry)
    }

    /// Consumes `amount` units, clamping at zero.
    pub fn decrement(
        &mut self,
        model: &str,
        supply: SupplyType,
        amount: u32,
    ) -> CoreResult<StockEntry> {
        let entry = self.decremented(model, supply, amount)?;
        self.entries.insert(entry.key(), entry.quantity);
        Ok(entry)
    }

    /// Applies a manual adjustment.
    ///
    /// ## Errors
    /// - `ValidationError::MustNotBeNegative` if `amount < 0` (checked first)
    /// - `CoreError::StockEntryNotFound` for an uninitialized pair
    pub fn adjust(&mut self, adjustment: &StockAdjustment) -> CoreResult<StockEntry> {
        validate_amount(adjustment.amount)?;

        let quantity = self.quantity_mut(&adjustment.model, adjustment.supply)?;
        *quantity = match adjustment.action {
            StockAction::Increase => quantity.saturating_add(adjustment.amount),
            StockAction::Decrease => (*quantity - adjustment.amount).max(0),
        };
        self.entry(&adjustment.model, adjustment.supply)
    }

    /// Pairs whose quantity is below the catalog threshold.
    pub fn low_stock_alerts(&self, catalog: &Catalog) -> BTreeSet<StockKey> {
        self.entries
            .iter()
            .filter(|(key, quantity)| **quantity < catalog.threshold(key.supply))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn quantity_mut(&mut self, model: &str, supply: SupplyType) -> CoreResult<&mut i64> {
        self.entries
            .get_mut(&StockKey::new(model, supply))
            .ok_or_else(|| CoreError::stock_not_found(model, supply))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
