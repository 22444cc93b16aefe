//! # supply-db: Persistence & Reconciliation
//!
//! SQLite storage for the usage and stock ledgers, and the engine that
//! writes to both.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Supply Ledger Data Flow                          │
//! │                                                                         │
//! │  supply-desk command (report, adjust, history, ...)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     supply-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │    engine     │──►│     store     │──►│  repository  │    │   │
//! │  │   │ write lock,   │   │ LedgerStore   │   │ usage, stock │    │   │
//! │  │   │ plan + commit │   │ sqlite/memory │   │ SQL          │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────┬───────┘    │   │
//! │  │                                                   │            │   │
//! │  │   ┌───────────────┐   ┌───────────────┐          │            │   │
//! │  │   │    pool       │   │  migrations   │◄─────────┘            │   │
//! │  │   └───────────────┘   └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  supplies.db (SQLite, WAL)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use supply_db::{Database, DbConfig, EngineSettings, ReconciliationEngine};
//!
//! let db = Database::new(DbConfig::new("supplies.db")).await?;
//! let engine = ReconciliationEngine::new(catalog, db.ledger_store(), EngineSettings::default())?;
//! engine.initialize().await?;
//! let event = engine.record_consumption(&report).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{EngineSettings, ReconciliationEngine, StockOverview, UsageQuery};
pub use error::{DbError, DbResult, EngineError, EngineResult};
pub use pool::{Database, DbConfig};
pub use store::{LedgerSnapshot, LedgerStore, LedgerWrite, MemoryLedgerStore, SqliteLedgerStore};

pub use repository::stock::StockRepository;
pub use repository::usage::UsageRepository;
