//! # Error Types
//!
//! Domain-specific error types for supply-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  supply-core errors (this file)                                        │
//! │  ├── CoreError        - Ledger rule failures (missing stock key, ...)  │
//! │  └── ValidationError  - Input rejected before any mutation             │
//! │                                                                         │
//! │  supply-db errors (separate crate)                                     │
//! │  └── DbError          - Persistence failures                           │
//! │                                                                         │
//! │  supply-desk errors (CLI)                                              │
//! │  └── ApiError         - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::SupplyType;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No stock entry exists for the key.
    ///
    /// ## When This Occurs
    /// Every catalog model × supply pair is initialized at startup, so this
    /// points at a catalog/initialization mismatch (e.g. an adjustment for a
    /// model that no printer uses).
    #[error("Stock entry not found: {model} / {supply}")]
    StockEntryNotFound { model: String, supply: SupplyType },

    /// The catalog itself is inconsistent.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a StockEntryNotFound error.
    pub fn stock_not_found(model: impl Into<String>, supply: SupplyType) -> Self {
        CoreError::StockEntryNotFound {
            model: model.into(),
            supply,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised before any ledger is touched, so a rejected request
/// never leaves partial state behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a date that is not YYYY-MM-DD).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Reference to something the catalog does not know.
    #[error("Unknown {field}: '{value}'")]
    Unknown { field: String, value: String },

    /// Duplicate value (e.g. two printers with one name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Creates an Unknown error.
    pub fn unknown(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::Unknown {
            field: field.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
