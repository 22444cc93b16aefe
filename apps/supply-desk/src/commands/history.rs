//! # History Commands
//!
//! Paginated, sorted usage history. Listing parameters never fail: unknown
//! sort keys fall back to insertion order, bad pages to the first page.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use supply_db::{LedgerStore, ReconciliationEngine, UsageQuery};

use super::consumption::UsageEventDto;
use crate::error::ApiError;

/// Raw listing parameters. `None` takes the configured default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<String>,
}

impl HistoryRequest {
    /// Resolves the query against the configured listing defaults.
    pub fn to_query(&self, defaults: &UsageQuery) -> UsageQuery {
        let mut query = UsageQuery::from_params(
            self.sort.as_deref(),
            self.direction.as_deref(),
            self.page.as_deref(),
        );
        if self.sort.is_none() {
            query.sort_key = defaults.sort_key;
        }
        if self.direction.is_none() {
            query.direction = defaults.direction;
        }
        query
    }
}

/// One page of usage history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UsagePageDto {
    pub items: Vec<UsageEventDto>,
    #[ts(type = "number")]
    pub total_count: usize,
    #[ts(type = "number")]
    pub page_index: usize,
    #[ts(type = "number")]
    pub page_size: usize,
    #[ts(type = "number")]
    pub page_count: usize,
    pub has_next: bool,
}

/// Lists one page of the usage history.
pub async fn list_usage<S: LedgerStore>(
    engine: &ReconciliationEngine<S>,
    request: &HistoryRequest,
    defaults: &UsageQuery,
) -> Result<UsagePageDto, ApiError> {
    let query = request.to_query(defaults);
    let page = engine.usage_page(&query).await?;

    Ok(UsagePageDto {
        page_count: page.page_count(),
        has_next: page.has_next(),
        total_count: page.total_count,
        page_index: page.page_index,
        page_size: page.page_size,
        items: page.items.into_iter().map(UsageEventDto::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::consumption::{record_consumption, ReportRequest};
    use crate::commands::tests::test_engine;
    use supply_core::{SortDirection, SortKey};

    fn history(sort: Option<&str>, direction: Option<&str>, page: Option<&str>) -> HistoryRequest {
        HistoryRequest {
            sort: sort.map(String::from),
            direction: direction.map(String::from),
            page: page.map(String::from),
        }
    }

    #[test]
    fn test_defaults_apply_only_when_missing() {
        let defaults = UsageQuery {
            sort_key: SortKey::Printer,
            direction: SortDirection::Asc,
            page_index: 0,
        };

        let query = history(None, None, Some("3")).to_query(&defaults);
        assert_eq!(query.sort_key, SortKey::Printer);
        assert_eq!(query.direction, SortDirection::Asc);
        assert_eq!(query.page_index, 3);

        let query = history(Some("weight"), Some("desc"), Some("x")).to_query(&defaults);
        assert_eq!(query.sort_key, SortKey::Insertion);
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(query.page_index, 0);
    }

    #[tokio::test]
    async fn test_list_usage_pages() {
        let engine = test_engine().await;
        for (i, printer) in ["IMP_HALL01", "IMPADM01", "IMP_HALL01"].iter().enumerate() {
            let req = ReportRequest {
                printer: printer.to_string(),
                supply: "fuser".to_string(),
                counter: (100 * (i + 1)).to_string(),
                user: "Kelcey".to_string(),
                date: Some(format!("2024-02-0{}", i + 1)),
                time: None,
            };
            record_consumption(&engine, &req).await.unwrap();
        }

        let defaults = UsageQuery::default();
        let page = list_usage(&engine, &history(Some("printer"), Some("asc"), None), &defaults)
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.page_count, 1);
        assert!(!page.has_next);
        assert_eq!(page.items[0].printer, "IMPADM01");

        let newest = list_usage(&engine, &HistoryRequest::default(), &defaults)
            .await
            .unwrap();
        assert_eq!(newest.items[0].display_date, "03-02-2024");
        assert_eq!(newest.items[0].counter_previous, 100);

        let past_end = list_usage(&engine, &history(None, None, Some("4")), &defaults)
            .await
            .unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_count, 3);
    }
}
