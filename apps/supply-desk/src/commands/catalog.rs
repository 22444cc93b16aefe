//! Catalog view: the fleet, known operators and thresholds.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use supply_core::{Catalog, Printer};

/// Low-stock thresholds per supply type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ThresholdsDto {
    pub toner: i64,
    pub photoconductor: i64,
    pub fuser: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogDto {
    pub printers: Vec<Printer>,
    /// Distinct models; stock is kept per model.
    pub models: Vec<String>,
    /// Empty means any operator may report.
    pub users: Vec<String>,
    pub thresholds: ThresholdsDto,
}

impl From<&Catalog> for CatalogDto {
    fn from(catalog: &Catalog) -> Self {
        let thresholds = catalog.thresholds();
        CatalogDto {
            printers: catalog.printers().to_vec(),
            models: catalog.models().into_iter().map(String::from).collect(),
            users: catalog.users().to_vec(),
            thresholds: ThresholdsDto {
                toner: thresholds.toner,
                photoconductor: thresholds.photoconductor,
                fuser: thresholds.fuser,
            },
        }
    }
}

pub fn get_catalog(catalog: &Catalog) -> CatalogDto {
    CatalogDto::from(catalog)
}
