//! # Validation Module
//!
//! Input validation for consumption reports and stock adjustments.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI (clap)                                                   │
//! │  └── Presence of arguments                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Numeric parsing (counter, amount, page)                           │
//! │  ├── Date/time formats                                                 │
//! │  └── Range rules (counter ≥ 0, amount ≥ 0)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Catalog (printer/user/model must be known)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (CHECK quantity >= 0, PRIMARY KEY)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here runs before a ledger is touched.

use chrono::{NaiveDate, NaiveTime};

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest printer, model or user name accepted.
pub const MAX_NAME_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a free-text identifier (printer name, model, user).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use supply_core::validation::validate_name;
///
/// assert!(validate_name("printer", "IMPADM01").is_ok());
/// assert!(validate_name("printer", "  ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a meter counter reading.
///
/// Counters are cumulative page counts, so only negative values are
/// rejected. A reading lower than the previous one is still accepted by the
/// ledger (meter reset).
pub fn validate_counter(counter: i64) -> ValidationResult<()> {
    if counter < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "counter".to_string(),
        });
    }
    Ok(())
}

/// Parses and validates a counter typed by an operator.
///
/// ## Example
/// ```rust
/// use supply_core::validation::parse_counter;
///
/// assert_eq!(parse_counter(" 1500 ").unwrap(), 1500);
/// assert!(parse_counter("15OO").is_err());
/// assert!(parse_counter("-3").is_err());
/// ```
pub fn parse_counter(raw: &str) -> ValidationResult<i64> {
    let counter = parse_integer("counter", raw)?;
    validate_counter(counter)?;
    Ok(counter)
}

/// Validates a manual adjustment amount. Zero is a no-op and allowed.
pub fn validate_amount(amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Parses and validates an adjustment amount.
pub fn parse_amount(raw: &str) -> ValidationResult<i64> {
    let amount = parse_integer("amount", raw)?;
    validate_amount(amount)?;
    Ok(amount)
}

/// Validates a configured page size.
pub fn validate_page_size(page_size: usize) -> ValidationResult<()> {
    if page_size == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page_size".to_string(),
        });
    }
    Ok(())
}

/// Parses a page index query parameter.
///
/// Listing parameters never fail a request: garbage or negative input
/// falls back to the first page.
pub fn parse_page_index(raw: &str) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(index) if index > 0 => index,
        _ => 0,
    }
}

fn parse_integer(field: &str, raw: &str) -> ValidationResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

// =============================================================================
// Date/Time Validators
// =============================================================================

/// Parses a report date in ISO form (`YYYY-MM-DD`).
pub fn parse_date(raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

/// Parses a report time (`HH:MM` or `HH:MM:SS`).
pub fn parse_time(raw: &str) -> ValidationResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidFormat {
            field: "time".to_string(),
            reason: "expected HH:MM or HH:MM:SS".to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
