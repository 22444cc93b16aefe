//! # Catalog
//!
//! Static reference data: the printer fleet, known operators and low-stock
//! thresholds. Loaded once at startup from configuration.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Catalog                                      │
//! │                                                                         │
//! │  printers ───► IMPADM01   → Lexmark MX711                              │
//! │                IMP_HALL01 → Brother MFC-L6902 ┐ shared model,          │
//! │                IMP_HALL02 → Brother MFC-L6902 ┘ shared stock           │
//! │                                                                         │
//! │  models × SupplyType::ALL ───► stock keys initialized at startup       │
//! │                                                                         │
//! │  thresholds ───► toner 3 │ photoconductor 2 │ fuser 1                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Printer, StockKey, SupplyType};
use crate::validation::{validate_name, ValidationResult};

// =============================================================================
// Thresholds
// =============================================================================

/// Low-stock threshold per supply type.
///
/// An entry is "low" when its quantity is strictly below the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_toner")]
    pub toner: i64,
    #[serde(default = "default_photoconductor")]
    pub photoconductor: i64,
    #[serde(default = "default_fuser")]
    pub fuser: i64,
}

fn default_toner() -> i64 {
    3
}

fn default_photoconductor() -> i64 {
    2
}

fn default_fuser() -> i64 {
    1
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            toner: default_toner(),
            photoconductor: default_photoconductor(),
            fuser: default_fuser(),
        }
    }
}

impl Thresholds {
    /// Threshold for a supply type.
    pub fn get(&self, supply: SupplyType) -> i64 {
        match supply {
            SupplyType::Toner => self.toner,
            SupplyType::Photoconductor => self.photoconductor,
            SupplyType::Fuser => self.fuser,
        }
    }
}

// =============================================================================
// Catalog Config
// =============================================================================

/// Raw catalog section as it appears in the configuration file.
///
/// ```toml
/// [catalog]
/// users = ["Bruno", "Paulo"]
///
/// [[catalog.printers]]
/// name = "IMPADM01"
/// model = "Lexmark MX711"
///
/// [catalog.thresholds]
/// toner = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub printers: Vec<Printer>,

    /// Operators allowed to report readings. Empty means anyone.
    #[serde(default)]
    pub users: Vec<String>,

    #[serde(default)]
    pub thresholds: Thresholds,
}

// =============================================================================
// Catalog
// =============================================================================

/// Validated, read-only reference data.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    printers: Vec<Printer>,
    users: Vec<String>,
    thresholds: Thresholds,

    #[serde(skip)]
    model_by_printer: BTreeMap<String, String>,
}

impl Catalog {
    /// Builds a catalog, rejecting inconsistent reference data.
    ///
    /// ## Rules
    /// - At least one printer
    /// - Printer names unique and non-empty, models non-empty
    /// - User names non-empty and unique
    /// - Thresholds ≥ 0
    pub fn from_config(config: CatalogConfig) -> CoreResult<Self> {
        if config.printers.is_empty() {
            return Err(CoreError::InvalidCatalog(
                "no printers configured".to_string(),
            ));
        }

        let mut model_by_printer = BTreeMap::new();
        let mut printers = Vec::with_capacity(config.printers.len());
        for printer in config.printers {
            validate_name("printer", &printer.name)?;
            validate_name("model", &printer.model)?;

            let printer = Printer::new(printer.name.trim(), printer.model.trim());
            if model_by_printer.contains_key(&printer.name) {
                return Err(ValidationError::Duplicate {
                    field: "printer".to_string(),
                    value: printer.name,
                }
                .into());
            }
            model_by_printer.insert(printer.name.clone(), printer.model.clone());
            printers.push(printer);
        }

        let mut seen_users = BTreeSet::new();
        let mut users = Vec::with_capacity(config.users.len());
        for user in config.users {
            validate_name("user", &user)?;
            let user = user.trim().to_string();
            if !seen_users.insert(user.clone()) {
                return Err(ValidationError::Duplicate {
                    field: "user".to_string(),
                    value: user,
                }
                .into());
            }
            users.push(user);
        }

        for supply in SupplyType::ALL {
            if config.thresholds.get(supply) < 0 {
                return Err(CoreError::InvalidCatalog(format!(
                    "threshold for {} must not be negative",
                    supply
                )));
            }
        }

        Ok(Catalog {
            printers,
            users,
            thresholds: config.thresholds,
            model_by_printer,
        })
    }

    /// Printers in configuration order.
    pub fn printers(&self) -> &[Printer] {
        &self.printers
    }

    /// Known operators in configuration order.
    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Low-stock threshold for a supply type.
    pub fn threshold(&self, supply: SupplyType) -> i64 {
        self.thresholds.get(supply)
    }

    /// Model of a printer, if the printer is known.
    pub fn model_of(&self, printer: &str) -> Option<&str> {
        self.model_by_printer.get(printer).map(String::as_str)
    }

    /// Model of a printer, or a validation error for unknown printers.
    pub fn resolve_model(&self, printer: &str) -> ValidationResult<&str> {
        self.model_of(printer)
            .ok_or_else(|| ValidationError::unknown("printer", printer))
    }

    /// Distinct models, sorted.
    pub fn models(&self) -> BTreeSet<&str> {
        self.printers.iter().map(|p| p.model.as_str()).collect()
    }

    /// Returns true if at least one printer has this model.
    pub fn has_model(&self, model: &str) -> bool {
        self.printers.iter().any(|p| p.model == model)
    }

    /// Every (model, supply) pair that must have a stock entry.
    pub fn stock_keys(&self) -> Vec<StockKey> {
        self.models()
            .into_iter()
            .flat_map(|model| {
                SupplyType::ALL
                    .into_iter()
                    .map(move |supply| StockKey::new(model, supply))
            })
            .collect()
    }

    /// Checks that an operator may submit readings.
    pub fn check_user(&self, user: &str) -> ValidationResult<()> {
        validate_name("user", user)?;
        if !self.users.is_empty() && !self.users.iter().any(|u| u == user.trim()) {
            return Err(ValidationError::unknown("user", user));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
