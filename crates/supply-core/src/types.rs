//! # Domain Types
//!
//! Core domain types used throughout the supply ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Printer      │   │   UsageEvent    │   │   StockEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name (unique)  │   │  id (sequence)  │   │  model  ┐ key   │       │
//! │  │  model          │   │  printer/model  │   │  supply ┘       │       │
//! │  └─────────────────┘   │  counters       │   │  quantity ≥ 0   │       │
//! │                        │  pages_consumed │   └─────────────────┘       │
//! │  ┌─────────────────┐   └─────────────────┘                              │
//! │  │   SupplyType    │                         ┌─────────────────┐       │
//! │  │  ─────────────  │                         │  StockAction    │       │
//! │  │  Toner          │                         │  ─────────────  │       │
//! │  │  Photoconductor │                         │  Increase       │       │
//! │  │  Fuser          │                         │  Decrease       │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A usage event copies the printer's model at the time of the report, so
//! history stays stable when the catalog is edited later.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Supply Type
// =============================================================================

/// A consumable part tracked independently per printer model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SupplyType {
    Toner,
    Photoconductor,
    Fuser,
}

impl SupplyType {
    /// Every supply type, in display order.
    pub const ALL: [SupplyType; 3] = [
        SupplyType::Toner,
        SupplyType::Photoconductor,
        SupplyType::Fuser,
    ];

    /// Stable lowercase identifier (matches the serde and database form).
    pub const fn as_str(&self) -> &'static str {
        match self {
            SupplyType::Toner => "toner",
            SupplyType::Photoconductor => "photoconductor",
            SupplyType::Fuser => "fuser",
        }
    }
}

impl std::fmt::Display for SupplyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupplyType::Toner => write!(f, "Toner"),
            SupplyType::Photoconductor => write!(f, "Photoconductor"),
            SupplyType::Fuser => write!(f, "Fuser"),
        }
    }
}

impl std::str::FromStr for SupplyType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "toner" => Ok(SupplyType::Toner),
            "photoconductor" => Ok(SupplyType::Photoconductor),
            "fuser" | "fuser-unit" | "fuser_unit" => Ok(SupplyType::Fuser),
            _ => Err(ValidationError::NotAllowed {
                field: "supply".to_string(),
                allowed: SupplyType::ALL
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Printer
// =============================================================================

/// A printer in the fleet. Many printers may share one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Printer {
    /// Unique identifier, as written on the device label.
    pub name: String,
    /// Model name; stock is kept per model.
    pub model: String,
}

impl Printer {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Printer {
            name: name.into(),
            model: model.into(),
        }
    }
}

// =============================================================================
// Usage Event
// =============================================================================

/// One recorded counter reading with its derived page count.
///
/// Append-only: created by the reconciliation flow, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UsageEvent {
    /// Sequence number, strictly increasing in creation order.
    pub id: i64,
    pub printer: String,
    /// Printer model at event time (frozen).
    pub model: String,
    pub supply: SupplyType,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub time: NaiveTime,
    pub user: String,
    pub counter_current: i64,
    /// `counter_current` of the previous reading for this printer/supply, or 0.
    pub counter_previous: i64,
    /// `counter_current - counter_previous`; negative after a meter reset.
    pub pages_consumed: i64,
}

impl UsageEvent {
    /// Returns true if this event belongs to the printer/supply pair.
    #[inline]
    pub fn matches(&self, printer: &str, supply: SupplyType) -> bool {
        self.printer == printer && self.supply == supply
    }

    /// Date shown to operators (`DD-MM-YYYY`).
    pub fn display_date(&self) -> String {
        self.date.format("%d-%m-%Y").to_string()
    }
}

// =============================================================================
// Stock
// =============================================================================

/// Key of a stock entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockKey {
    pub model: String,
    pub supply: SupplyType,
}

impl StockKey {
    pub fn new(model: impl Into<String>, supply: SupplyType) -> Self {
        StockKey {
            model: model.into(),
            supply,
        }
    }
}

impl std::fmt::Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.model, self.supply)
    }
}

/// Units on hand for one (model, supply) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockEntry {
    pub model: String,
    pub supply: SupplyType,
    /// Never negative; decrements clamp at zero.
    pub quantity: i64,
}

impl StockEntry {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.model.clone(), self.supply)
    }
}

/// Direction of a manual stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockAction {
    /// Goods received.
    Increase,
    /// Goods removed outside the consumption flow (clamped at zero).
    Decrease,
}

impl std::fmt::Display for StockAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockAction::Increase => write!(f, "increase"),
            StockAction::Decrease => write!(f, "decrease"),
        }
    }
}

impl std::str::FromStr for StockAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "increase" | "in" => Ok(StockAction::Increase),
            "decrease" | "out" => Ok(StockAction::Decrease),
            _ => Err(ValidationError::NotAllowed {
                field: "action".to_string(),
                allowed: vec!["increase".to_string(), "decrease".to_string()],
            }),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A new counter reading submitted by an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionReport {
    pub printer: String,
    pub supply: SupplyType,
    pub counter_current: i64,
    pub user: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// A manual stock correction; creates no usage event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub model: String,
    pub supply: SupplyType,
    pub action: StockAction,
    pub amount: i64,
}

// =============================================================================
// Listing
// =============================================================================

/// Column used to order the usage history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Printer,
    /// `(date, time)` composite.
    #[default]
    Date,
    Supply,
    /// As recorded; direction is ignored.
    Insertion,
}

impl SortKey {
    /// Parses a query parameter; anything unsupported means insertion order.
    pub fn from_query(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "printer" => SortKey::Printer,
            "date" => SortKey::Date,
            "supply" => SortKey::Supply,
            _ => SortKey::Insertion,
        }
    }
}

/// Sort direction for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl SortDirection {
    /// Parses a query parameter; only `asc` selects ascending order.
    pub fn from_query(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

/// Policy for picking the "previous" reading of a printer/supply pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterLookup {
    /// Most recently appended matching event.
    #[default]
    LatestAppended,
    /// First matching event in append order (legacy behaviour).
    FirstRecorded,
}

impl std::fmt::Display for CounterLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CounterLookup::LatestAppended => write!(f, "latest_appended"),
            CounterLookup::FirstRecorded => write!(f, "first_recorded"),
        }
    }
}

impl std::str::FromStr for CounterLookup {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest_appended" | "latest" => Ok(CounterLookup::LatestAppended),
            "first_recorded" | "first" => Ok(CounterLookup::FirstRecorded),
            _ => Err(ValidationError::NotAllowed {
                field: "counter_lookup".to_string(),
                allowed: vec![
                    "latest_appended".to_string(),
                    "first_recorded".to_string(),
                ],
            }),
        }
    }
}

/// One page of a sorted listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole listing, not of this page.
    pub total_count: usize,
    pub page_index: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Number of pages needed for `total_count` items.
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }

    /// Returns true if a later page has items.
    pub fn has_next(&self) -> bool {
        (self.page_index + 1) * self.page_size < self.total_count
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
