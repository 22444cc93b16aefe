//! # Repository Module
//!
//! SQL for the two ledger tables.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SqliteLedgerStore                                                      │
//! │       │                                                                 │
//! │       ├── UsageRepository  ──► usage_events  (append-only)             │
//! │       │   ├── list_all() / load_all(executor)                          │
//! │       │   └── insert(executor, event)                                  │
//! │       │                                                                 │
//! │       └── StockRepository  ──► stock_entries (model, supply) PK        │
//! │           ├── list_all() / load_all(executor) / get()                  │
//! │           ├── upsert / update_quantity (executor-generic)              │
//! │           └── insert_missing(entries)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`usage::UsageRepository`] - Usage history
//! - [`stock::StockRepository`] - Units on hand

pub mod stock;
pub mod usage;
