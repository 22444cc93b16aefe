//! # Desk Configuration
//!
//! Loads `supplies.toml`: the catalog plus database, listing and ledger
//! settings.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SUPPLY_DB_PATH=/srv/supplies.db                                    │
//! │     SUPPLY_PAGE_SIZE=10                                                │
//! │     SUPPLY_COUNTER_LOOKUP=first_recorded                               │
//! │                                                                         │
//! │  2. TOML Config File, first of:                                        │
//! │     --config <path>                                                    │
//! │     $SUPPLY_CONFIG                                                     │
//! │     ~/.config/supply-desk/supplies.toml (Linux)                        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     page_size 5, sort by date desc, latest_appended lookup             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/supply-desk/supplies.db"
//!
//! [listing]
//! page_size = 5
//! sort = "date"
//! direction = "desc"
//!
//! [ledger]
//! counter_lookup = "latest_appended"
//!
//! [catalog]
//! users = ["Bruno", "Paulo"]
//!
//! [[catalog.printers]]
//! name = "IMPADM01"
//! model = "Lexmark MX711"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use supply_core::validation::validate_page_size;
use supply_core::{Catalog, CatalogConfig, CoreError, CounterLookup, SortDirection, SortKey};
use supply_db::{EngineSettings, UsageQuery};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SUPPLY_CONFIG";

const CONFIG_FILE: &str = "supplies.toml";
const DB_FILE: &str = "supplies.db";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Catalog(#[from] CoreError),

    #[error("No home directory available for config and data files")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// `[listing]` section: defaults for the usage history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub sort: SortKey,

    #[serde(default)]
    pub direction: SortDirection,
}

fn default_page_size() -> usize {
    supply_core::DEFAULT_PAGE_SIZE
}

impl Default for ListingSettings {
    fn default() -> Self {
        ListingSettings {
            page_size: default_page_size(),
            sort: SortKey::default(),
            direction: SortDirection::default(),
        }
    }
}

/// `[ledger]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    #[serde(default)]
    pub counter_lookup: CounterLookup,
}

// =============================================================================
// App Config
// =============================================================================

/// Complete desk configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub listing: ListingSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, `SUPPLY_CONFIG`, platform dir)
    /// 3. Environment variables
    ///
    /// ## Errors
    /// - `NotFound` if no config file exists; the catalog cannot default
    /// - `Parse` / `Invalid` / `Catalog` on bad content
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let path = config_path
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoDataDir)?;

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses one config file without overrides or validation.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration, including the catalog.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_page_size(self.listing.page_size).map_err(CoreError::from)?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        self.catalog()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a variable lookup.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SUPPLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(size) = lookup("SUPPLY_PAGE_SIZE") {
            match size.trim().parse::<usize>() {
                Ok(size) => self.listing.page_size = size,
                Err(_) => warn!(value = %size, "Invalid SUPPLY_PAGE_SIZE in environment"),
            }
        }

        if let Some(lookup_policy) = lookup("SUPPLY_COUNTER_LOOKUP") {
            match lookup_policy.parse::<CounterLookup>() {
                Ok(policy) => {
                    debug!(policy = %policy, "Overriding counter lookup from environment");
                    self.ledger.counter_lookup = policy;
                }
                Err(_) => warn!(value = %lookup_policy, "Unknown SUPPLY_COUNTER_LOOKUP in environment"),
            }
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "supply", "supply-desk")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    // =========================================================================
    // Derived Values
    // =========================================================================

    /// Builds the validated catalog.
    pub fn catalog(&self) -> ConfigResult<Catalog> {
        Ok(Catalog::from_config(self.catalog.clone())?)
    }

    /// Database file, falling back to the platform data directory.
    ///
    /// - **Linux**: `~/.local/share/supply-desk/supplies.db`
    /// - **macOS**: `~/Library/Application Support/org.supply.supply-desk/supplies.db`
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join(DB_FILE))
            .ok_or(ConfigError::NoDataDir)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            counter_lookup: self.ledger.counter_lookup,
            page_size: self.listing.page_size,
        }
    }

    /// First page with the configured sort order.
    pub fn default_query(&self) -> UsageQuery {
        UsageQuery {
            sort_key: self.listing.sort,
            direction: self.listing.direction,
            page_index: 0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use supply_core::SupplyType;

    const SAMPLE: &str = include_str!("../../../config/supplies.toml");

    #[test]
    fn test_sample_config_parses() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        config.validate().unwrap();

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.printers().len(), 5);
        assert_eq!(catalog.model_of("IMP_HALL02"), Some("Brother MFC-L6902"));
        assert_eq!(catalog.models().len(), 4);
        assert_eq!(catalog.threshold(SupplyType::Toner), 3);
        assert_eq!(config.listing.page_size, 5);
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config = AppConfig::from_toml(
            r#"
            [[catalog.printers]]
            name = "P1"
            model = "M1"
            "#,
        )
        .unwrap();

        assert_eq!(config.database, DatabaseSettings::default());
        assert_eq!(config.listing.page_size, 5);
        assert_eq!(config.listing.sort, SortKey::Date);
        assert_eq!(config.listing.direction, SortDirection::Desc);
        assert_eq!(config.ledger.counter_lookup, CounterLookup::LatestAppended);
        assert!(config.catalog.users.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        let vars: HashMap<&str, &str> = [
            ("SUPPLY_DB_PATH", "/tmp/ledger.db"),
            ("SUPPLY_PAGE_SIZE", "12"),
            ("SUPPLY_COUNTER_LOOKUP", "first_recorded"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/ledger.db"));
        assert_eq!(config.engine_settings().page_size, 12);
        assert_eq!(
            config.engine_settings().counter_lookup,
            CounterLookup::FirstRecorded
        );
    }

    #[test]
    fn test_bad_override_is_ignored() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        config.apply_overrides(|key| match key {
            "SUPPLY_PAGE_SIZE" => Some("many".to_string()),
            "SUPPLY_COUNTER_LOOKUP" => Some("newest".to_string()),
            _ => None,
        });
        assert_eq!(config.listing.page_size, 5);
        assert_eq!(config.ledger.counter_lookup, CounterLookup::LatestAppended);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        config.listing.page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Catalog(_))));

        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let empty = AppConfig::default();
        assert!(matches!(empty.validate(), Err(ConfigError::Catalog(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file(Path::new("/nonexistent/supplies.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_default_query_follows_listing() {
        let config = AppConfig::from_toml(
            r#"
            [listing]
            sort = "printer"
            direction = "asc"

            [[catalog.printers]]
            name = "P1"
            model = "M1"
            "#,
        )
        .unwrap();
        let query = config.default_query();
        assert_eq!(query.sort_key, SortKey::Printer);
        assert_eq!(query.direction, SortDirection::Asc);
        assert_eq!(query.page_index, 0);
    }
}
