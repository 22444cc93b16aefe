//! # Stock Commands
//!
//! Stock overview, low-stock alerts, manual adjustments and initialization.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use supply_core::validation::parse_amount;
use supply_core::{Catalog, StockAction, StockAdjustment, StockEntry, StockKey, SupplyType};
use supply_db::{LedgerStore, ReconciliationEngine, StockOverview};

use crate::error::ApiError;

/// One stock entry with its alert state.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockEntryDto {
    pub model: String,
    pub supply: SupplyType,
    pub quantity: i64,
    pub threshold: i64,
    /// `quantity < threshold`
    pub low: bool,
}

impl StockEntryDto {
    fn new(entry: StockEntry, catalog: &Catalog) -> Self {
        let threshold = catalog.threshold(entry.supply);
        StockEntryDto {
            low: entry.quantity < threshold,
            threshold,
            model: entry.model,
            supply: entry.supply,
            quantity: entry.quantity,
        }
    }
}

/// Full stock map plus the keys needing reorder.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockDto {
    pub entries: Vec<StockEntryDto>,
    pub alerts: Vec<StockKey>,
}

impl StockDto {
    fn new(overview: StockOverview, catalog: &Catalog) -> Self {
        StockDto {
            entries: overview
                .entries
                .into_iter()
                .map(|e| StockEntryDto::new(e, catalog))
                .collect(),
            alerts: overview.alerts,
        }
    }
}

/// Result of `init`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InitDto {
    /// Pairs created with quantity 0; empty when already initialized.
    pub created: Vec<StockKey>,
}

/// A manual adjustment as typed by the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustRequest {
    pub model: String,
    pub supply: String,
    pub action: String,
    pub amount: String,
}

impl AdjustRequest {
    pub fn parse(&self) -> Result<StockAdjustment, ApiError> {
        let supply: SupplyType = self.supply.parse()?;
        let action: StockAction = self.action.parse()?;
        let amount = parse_amount(&self.amount)?;
        Ok(StockAdjustment {
            model: self.model.trim().to_string(),
            supply,
            action,
            amount,
        })
    }
}

/// Ensures every catalog model × supply has a stock entry.
pub async fn initialize<S: LedgerStore>(
    engine: &ReconciliationEngine<S>,
) -> Result<InitDto, ApiError> {
    let created = engine.initialize().await?;
    Ok(InitDto { created })
}

/// Gets every stock entry with its threshold.
pub async fn get_stock<S: LedgerStore>(
    engine: &ReconciliationEngine<S>,
) -> Result<StockDto, ApiError> {
    let overview = engine.stock_overview().await?;
    Ok(StockDto::new(overview, engine.catalog()))
}

/// Gets only the entries below their threshold.
pub async fn get_alerts<S: LedgerStore>(
    engine: &ReconciliationEngine<S>,
) -> Result<Vec<StockEntryDto>, ApiError> {
    let stock = get_stock(engine).await?;
    Ok(stock.entries.into_iter().filter(|e| e.low).collect())
}

/// Applies a manual increase or decrease.
///
/// ## Errors
/// - `VALIDATION_ERROR` - negative or malformed amount, bad supply/action
/// - `NOT_FOUND` - no entry for the model and supply
pub async fn adjust_stock<S: LedgerStore>(
    engine: &ReconciliationEngine<S>,
    request: &AdjustRequest,
) -> Result<StockEntryDto, ApiError> {
    let adjustment = request.parse()?;
    let entry = engine.adjust_stock(&adjustment).await?;
    Ok(StockEntryDto::new(entry, engine.catalog()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{test_engine, MX711};
    use crate::error::ErrorCode;

    fn adjust(action: &str, amount: &str) -> AdjustRequest {
        AdjustRequest {
            model: MX711.to_string(),
            supply: "toner".to_string(),
            action: action.to_string(),
            amount: amount.to_string(),
        }
    }

    #[tokio::test]
    async fn test_adjust_and_alerts() {
        let engine = test_engine().await;

        let alerts = get_alerts(&engine).await.unwrap();
        assert_eq!(alerts.len(), engine.catalog().stock_keys().len());

        let entry = adjust_stock(&engine, &adjust("increase", "3")).await.unwrap();
        assert_eq!(entry.quantity, 3);
        assert_eq!(entry.threshold, 3);
        assert!(!entry.low);

        let entry = adjust_stock(&engine, &adjust("out", "1")).await.unwrap();
        assert_eq!(entry.quantity, 2);
        assert!(entry.low);

        let stock = get_stock(&engine).await.unwrap();
        assert!(stock.alerts.contains(&StockKey::new(MX711, SupplyType::Toner)));
    }

    #[tokio::test]
    async fn test_adjust_errors() {
        let engine = test_engine().await;

        let err = adjust_stock(&engine, &adjust("increase", "-2")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = adjust_stock(&engine, &adjust("steal", "2")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let unknown = AdjustRequest {
            model: "Epson".into(),
            ..adjust("increase", "2")
        };
        let err = adjust_stock(&engine, &unknown).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_initialize_twice() {
        let engine = test_engine().await;
        assert!(initialize(&engine).await.unwrap().created.is_empty());
    }
}
