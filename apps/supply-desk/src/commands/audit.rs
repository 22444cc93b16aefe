//! # Audit Commands
//!
//! Consistency check of both ledgers against the current catalog.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  supply-desk audit [--repair]                                           │
//! │                                                                         │
//! │  missing stock entries ──► repairable (created with quantity 0)        │
//! │  unknown printers      ──► reported                                    │
//! │  model mismatches      ──► reported (history is immutable)             │
//! │  counter-chain breaks  ──► reported                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use supply_core::reconcile::AuditReport;
use supply_db::{LedgerStore, ReconciliationEngine};

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditDto {
    /// True if missing stock entries were created first.
    pub repaired: bool,
    pub clean: bool,
    #[ts(type = "number")]
    pub issue_count: usize,
    pub report: AuditReport,
}

/// Runs the audit, optionally repairing what can be repaired.
pub async fn run_audit<S: LedgerStore>(
    engine: &ReconciliationEngine<S>,
    repair: bool,
) -> Result<AuditDto, ApiError> {
    let report = if repair {
        info!("Repairing ledgers before audit");
        engine.repair().await?
    } else {
        engine.audit().await?
    };

    Ok(AuditDto {
        repaired: repair,
        clean: report.is_clean(),
        issue_count: report.issue_count(),
        report,
    })
}
