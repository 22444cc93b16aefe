//! # supply-core: Pure Ledger Logic for Printer Supplies
//!
//! Tracks consumable usage (toner, photoconductor, fuser) per printer from
//! page-counter readings, and units on hand per printer model.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Supply Ledger Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    supply-desk (CLI)                            │   │
//! │  │    report ──► adjust ──► history ──► stock ──► audit            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            supply-db (engine, store, SQLite)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ supply-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  catalog  │  │   usage   │  │   stock   │  │ reconcile │  │   │
//! │  │   │ printers  │  │  counter  │  │ quantity  │  │   plan    │  │   │
//! │  │   │thresholds │  │   chain   │  │  clamps   │  │   audit   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (SupplyType, UsageEvent, StockEntry, ...)
//! - [`catalog`] - Printer fleet, operators, thresholds
//! - [`usage`] - Usage ledger, sorting, pagination
//! - [`stock`] - Stock ledger and low-stock alerts
//! - [`reconcile`] - Consumption planning and audit
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{NaiveDate, NaiveTime};
//! use supply_core::catalog::{Catalog, CatalogConfig};
//! use supply_core::reconcile::{apply_consumption, plan_consumption};
//! use supply_core::{ConsumptionReport, CounterLookup, Printer, StockLedger, SupplyType, UsageLedger};
//!
//! let catalog = Catalog::from_config(CatalogConfig {
//!     printers: vec![Printer::new("IMPADM01", "Lexmark MX711")],
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut usage = UsageLedger::new();
//! let mut stock = StockLedger::new();
//! stock.initialize(&catalog);
//!
//! let report = ConsumptionReport {
//!     printer: "IMPADM01".to_string(),
//!     supply: SupplyType::Toner,
//!     counter_current: 1500,
//!     user: "Bruno".to_string(),
//!     date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
//!     time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//! };
//!
//! let plan = plan_consumption(&catalog, &usage, &stock, &report, CounterLookup::default()).unwrap();
//! apply_consumption(&mut usage, &mut stock, &plan).unwrap();
//!
//! assert_eq!(plan.event.pages_consumed, 1500);
//! assert_eq!(stock.get("Lexmark MX711", SupplyType::Toner).unwrap(), 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod reconcile;
pub mod stock;
pub mod types;
pub mod usage;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{Catalog, CatalogConfig, Thresholds};
pub use error::{CoreError, CoreResult, ValidationError};
pub use reconcile::{AuditReport, ConsumptionPlan};
pub use stock::StockLedger;
pub use types::*;
pub use usage::UsageLedger;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size of the usage history when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 5;
