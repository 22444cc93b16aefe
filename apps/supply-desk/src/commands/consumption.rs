//! # Consumption Commands
//!
//! Turns an operator's counter reading into a usage event.
//!
//! ## Report Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      supply-desk report                                 │
//! │                                                                         │
//! │  ReportRequest (raw strings)                                           │
//! │       │  parse supply, counter, date, time (local clock if omitted)    │
//! │       ▼                                                                 │
//! │  ConsumptionReport                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  engine.record_consumption()  ──► one event + one unit of stock        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UsageEventDto (camelCase JSON)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use supply_core::validation::{parse_counter, parse_date, parse_time};
use supply_core::{ConsumptionReport, SupplyType, UsageEvent};
use supply_db::{LedgerStore, ReconciliationEngine};

use crate::error::ApiError;

/// Usage event DTO for display.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UsageEventDto {
    pub id: i64,
    pub printer: String,
    pub model: String,
    pub supply: SupplyType,
    /// ISO date (`YYYY-MM-DD`)
    pub date: String,
    /// Operator-facing date (`DD-MM-YYYY`)
    pub display_date: String,
    pub time: String,
    pub user: String,
    pub counter_current: i64,
    pub counter_previous: i64,
    /// Negative after a counter reset
    pub pages_consumed: i64,
}

impl From<UsageEvent> for UsageEventDto {
    fn from(e: UsageEvent) -> Self {
        UsageEventDto {
            display_date: e.display_date(),
            date: e.date.format("%Y-%m-%d").to_string(),
            time: e.time.format("%H:%M:%S").to_string(),
            id: e.id,
            printer: e.printer,
            model: e.model,
            supply: e.supply,
            user: e.user,
            counter_current: e.counter_current,
            counter_previous: e.counter_previous,
            pages_consumed: e.pages_consumed,
        }
    }
}

/// A counter reading as typed by the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub printer: String,
    pub supply: String,
    pub counter: String,
    pub user: String,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl ReportRequest {
    /// Parses the raw fields. Missing date or time is taken from `now`.
    pub fn parse(&self, now: NaiveDateTime) -> Result<ConsumptionReport, ApiError> {
        let supply: SupplyType = self.supply.parse()?;
        let counter_current = parse_counter(&self.counter)?;
        let date = match &self.date {
            Some(raw) => parse_date(raw)?,
            None => now.date(),
        };
        let time = match &self.time {
            Some(raw) => parse_time(raw)?,
            None => now.time(),
        };

        Ok(ConsumptionReport {
            printer: self.printer.trim().to_string(),
            supply,
            counter_current,
            user: self.user.trim().to_string(),
            date,
            time,
        })
    }
}

/// Records a counter reading.
///
/// ## Returns
/// The stored event, including the derived previous counter and pages.
///
/// ## Errors
/// - `VALIDATION_ERROR` - unknown printer/user, bad counter/date/time
/// - `NOT_FOUND` - no stock entry for the printer's model
/// - `DATABASE_ERROR` - nothing was written
pub async fn record_consumption<S: LedgerStore>(
    engine: &ReconciliationEngine<S>,
    request: &ReportRequest,
) -> Result<UsageEventDto, ApiError> {
    let report = request.parse(Local::now().naive_local())?;
    debug!(printer = %report.printer, supply = %report.supply, "Recording consumption");

    let event = engine.record_consumption(&report).await?;
    Ok(UsageEventDto::from(event))
}
