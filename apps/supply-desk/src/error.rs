//! # API Error Type
//!
//! Unified error type for every command.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in supply-desk                            │
//! │                                                                         │
//! │  Command Function → Result<T, ApiError>                                │
//! │         │                                                               │
//! │         ├── ValidationError ──────────────► VALIDATION_ERROR           │
//! │         ├── CoreError::StockEntryNotFound ─► NOT_FOUND                  │
//! │         ├── DbError ───────── (logged) ────► DATABASE_ERROR             │
//! │         └── ConfigError ───────────────────► VALIDATION_ERROR / INTERNAL│
//! │                                                                         │
//! │  stdout: { "code": "NOT_FOUND", "message": "..." }   non-zero exit      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Database details go to the log, never to stdout.

use serde::Serialize;
use supply_core::CoreError;
use supply_db::{DbError, EngineError};
use ts_rs::TS;

use crate::config::ConfigError;

/// Error printed when a command fails.
///
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "Validation error: Unknown printer: 'IMP404'"
/// }
/// ```
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// Stock entry or record absent
    NotFound,

    /// Rejected input; nothing was written
    ValidationError,

    /// Persistence failed; nothing was written
    DatabaseError,

    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self.code {
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::DatabaseError => 4,
            ErrorCode::Internal => 1,
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                tracing::error!(%field, %value, "Unique constraint violated");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ConstraintViolation(e) => {
                tracing::error!("Constraint violation: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::StockEntryNotFound { model, supply } => {
                ApiError::not_found("Stock entry", &format!("{} / {}", model, supply))
            }
            CoreError::InvalidCatalog(_) | CoreError::Validation(_) => {
                ApiError::validation(err.to_string())
            }
        }
    }
}

impl From<supply_core::ValidationError> for ApiError {
    fn from(err: supply_core::ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Domain(e) => e.into(),
            EngineError::Persistence(e) => e.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Catalog(e) => e.into(),
            other @ ConfigError::NoDataDir => ApiError::internal(other.to_string()),
            other => ApiError::validation(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal(format!("Failed to encode output: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use supply_core::{SupplyType, ValidationError};

    #[test]
    fn test_codes_serialize_screaming_snake_case() {
        let err = ApiError::validation("counter must not be negative");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "counter must not be negative");
    }

    #[test]
    fn test_domain_mapping() {
        let err: ApiError = EngineError::Domain(CoreError::stock_not_found(
            "HP M750",
            SupplyType::Toner,
        ))
        .into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Stock entry not found: HP M750 / Toner");

        let err: ApiError = ValidationError::unknown("printer", "IMP404").into();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_database_details_are_hidden() {
        let err: ApiError =
            EngineError::Persistence(DbError::QueryFailed("no such table: x".into())).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("no such table"));
        assert_eq!(err.exit_code(), 4);
    }
}
