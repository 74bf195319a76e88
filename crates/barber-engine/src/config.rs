//! # Engine Configuration
//!
//! Configuration management for the recording and aggregation engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BARBER_DB_PATH=/var/lib/barber/barber.db                           │
//! │     BARBER_AGGREGATION=incremental                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/barber-pos/barber.toml (Linux)                           │
//! │     ~/Library/Application Support/com.barber.pos/barber.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     23% VAT, 20% commission, query-time aggregation, local zone        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/barber/barber.db"
//! max_connections = 5
//! durable = true
//!
//! [pricing]
//! vat_rate_bps = 2300
//! commission_rate_bps = 2000
//!
//! [aggregation]
//! strategy = "query_time"   # query_time | incremental
//! timezone = "local"        # utc | local | +01:00
//!
//! [catalog]
//! path = "/etc/barber/catalog.toml"   # optional, built-in catalog otherwise
//! ```

use barber_core::pricing::PricingConfig;
use barber_core::{CatalogSeed, ReferenceZone, DEFAULT_COMMISSION_RATE_BPS, DEFAULT_VAT_RATE_BPS};
use barber_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

/// In-memory database marker for `[database] path`.
pub const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Aggregation Strategy
// =============================================================================

/// How summaries are computed. Both give identical answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// Scan the window's records on every request.
    #[default]
    QueryTime,

    /// Keep running totals, updated on every committed record.
    Incremental,
}

impl std::fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationStrategy::QueryTime => write!(f, "query_time"),
            AggregationStrategy::Incremental => write!(f, "incremental"),
        }
    }
}

impl std::str::FromStr for AggregationStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "query_time" | "scan" => Ok(AggregationStrategy::QueryTime),
            "incremental" | "running" => Ok(AggregationStrategy::Incremental),
            other => Err(ConfigError::Invalid(format!(
                "Unknown aggregation strategy: '{}'. Valid options: query_time, incremental",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// FULL synchronous when true.
    #[serde(default = "default_true")]
    pub durable: bool,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "barber", "pos")
        .map(|dirs| dirs.data_dir().join("barber.db"))
        .unwrap_or_else(|| PathBuf::from("barber.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            durable: true,
        }
    }
}

impl DatabaseSettings {
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }

    /// Pool configuration for these settings.
    pub fn to_db_config(&self) -> DbConfig {
        if self.is_in_memory() {
            return DbConfig::in_memory();
        }
        DbConfig::new(&self.path)
            .max_connections(self.max_connections)
            .durable(self.durable)
    }
}

/// `[pricing]`, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default = "default_vat_rate")]
    pub vat_rate_bps: u32,

    #[serde(default = "default_commission_rate")]
    pub commission_rate_bps: u32,
}

fn default_vat_rate() -> u32 {
    DEFAULT_VAT_RATE_BPS
}

fn default_commission_rate() -> u32 {
    DEFAULT_COMMISSION_RATE_BPS
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            vat_rate_bps: default_vat_rate(),
            commission_rate_bps: default_commission_rate(),
        }
    }
}

impl PricingSettings {
    pub fn to_pricing_config(&self) -> PricingConfig {
        PricingConfig::from_bps(self.vat_rate_bps, self.commission_rate_bps)
    }
}

/// `[aggregation]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSettings {
    #[serde(default)]
    pub strategy: AggregationStrategy,

    /// Zone in which "today" and "this week" are evaluated.
    #[serde(default = "default_timezone")]
    pub timezone: ReferenceZone,
}

fn default_timezone() -> ReferenceZone {
    ReferenceZone::Local
}

impl Default for AggregationSettings {
    fn default() -> Self {
        AggregationSettings {
            strategy: AggregationStrategy::default(),
            timezone: default_timezone(),
        }
    }
}

/// `[catalog]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// TOML catalog file. The built-in catalog is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub aggregation: AggregationSettings,

    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl EngineConfig {
    /// Defaults with an in-memory database and UTC windows (for testing).
    pub fn in_memory() -> Self {
        EngineConfig {
            database: DatabaseSettings {
                path: PathBuf::from(IN_MEMORY_PATH),
                ..Default::default()
            },
            aggregation: AggregationSettings {
                timezone: ReferenceZone::Utc,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Sets the aggregation strategy.
    pub fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.aggregation.strategy = strategy;
        self
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (barber.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file without overrides or validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        self.pricing
            .to_pricing_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("pricing: {}", e)))?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `BARBER_*` overrides from `lookup`. Unparseable values are
    /// logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("BARBER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(bps) = lookup("BARBER_VAT_RATE_BPS") {
            match bps.parse::<u32>() {
                Ok(v) => self.pricing.vat_rate_bps = v,
                Err(_) => warn!(value = %bps, "Ignoring invalid BARBER_VAT_RATE_BPS"),
            }
        }

        if let Some(bps) = lookup("BARBER_COMMISSION_RATE_BPS") {
            match bps.parse::<u32>() {
                Ok(v) => self.pricing.commission_rate_bps = v,
                Err(_) => warn!(value = %bps, "Ignoring invalid BARBER_COMMISSION_RATE_BPS"),
            }
        }

        if let Some(strategy) = lookup("BARBER_AGGREGATION") {
            match strategy.parse() {
                Ok(parsed) => {
                    debug!(strategy = %strategy, "Overriding aggregation strategy from environment");
                    self.aggregation.strategy = parsed;
                }
                Err(_) => warn!(strategy = %strategy, "Unknown aggregation strategy in environment"),
            }
        }

        if let Some(zone) = lookup("BARBER_TIMEZONE") {
            match zone.parse() {
                Ok(parsed) => self.aggregation.timezone = parsed,
                Err(_) => warn!(zone = %zone, "Unknown timezone in environment"),
            }
        }

        if let Some(path) = lookup("BARBER_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "barber", "pos")
            .map(|dirs| dirs.config_dir().join("barber.toml"))
    }

    /// The catalog to load: the configured file, or the built-in default.
    pub fn catalog_seed(&self) -> Result<CatalogSeed, ConfigError> {
        match &self.catalog.path {
            Some(path) => load_catalog_seed(path),
            None => Ok(CatalogSeed::default()),
        }
    }
}

/// Reads a TOML catalog file.
pub fn load_catalog_seed(path: &Path) -> Result<CatalogSeed, ConfigError> {
    info!(?path, "Loading catalog file");
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.pricing.vat_rate_bps, 2300);
        assert_eq!(config.pricing.commission_rate_bps, 2000);
        assert_eq!(config.aggregation.strategy, AggregationStrategy::QueryTime);
        assert_eq!(config.aggregation.timezone, ReferenceZone::Local);
        assert!(config.catalog.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "query_time".parse::<AggregationStrategy>().unwrap(),
            AggregationStrategy::QueryTime
        );
        assert_eq!(
            "Incremental".parse::<AggregationStrategy>().unwrap(),
            AggregationStrategy::Incremental
        );
        assert!("cached".parse::<AggregationStrategy>().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = temp_file(
            "barber.toml",
            r#"
            [aggregation]
            strategy = "incremental"
            timezone = "+01:00"

            [database]
            path = "/tmp/shop.db"
            "#,
        );

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.aggregation.strategy, AggregationStrategy::Incremental);
        assert_eq!(config.aggregation.timezone.to_string(), "+01:00");
        assert_eq!(config.database.path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.pricing.vat_rate_bps, 2300);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("BARBER_DB_PATH", ":memory:"),
            ("BARBER_VAT_RATE_BPS", "600"),
            ("BARBER_COMMISSION_RATE_BPS", "not-a-number"),
            ("BARBER_AGGREGATION", "incremental"),
            ("BARBER_TIMEZONE", "utc"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert!(config.database.is_in_memory());
        assert_eq!(config.pricing.vat_rate_bps, 600);
        assert_eq!(config.pricing.commission_rate_bps, 2000);
        assert_eq!(config.aggregation.strategy, AggregationStrategy::Incremental);
        assert_eq!(config.aggregation.timezone, ReferenceZone::Utc);
    }

    #[test]
    fn test_validation() {
        let mut config = EngineConfig::in_memory();
        assert!(config.validate().is_ok());

        config.pricing.vat_rate_bps = 10_001;
        assert!(config.validate().is_err());

        config.pricing.vat_rate_bps = 2300;
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::in_memory().with_strategy(AggregationStrategy::Incremental);
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[pricing]"));
        assert!(rendered.contains("strategy = \"incremental\""));

        let parsed: EngineConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_catalog_file() {
        let path = temp_file(
            "catalog.toml",
            r#"
            [[services]]
            id = "kids-cut"
            name = "Corte Infantil"
            base_price_cents = 2000

            [[barbers]]
            id = "ana"
            name = "Ana Reis"
            "#,
        );

        let mut config = EngineConfig::in_memory();
        config.catalog.path = Some(path.clone());
        let seed = config.catalog_seed().unwrap();
        assert_eq!(seed.services.len(), 1);
        assert!(seed.products.is_empty());
        assert_eq!(seed.barbers[0].name, "Ana Reis");

        std::fs::remove_file(path).ok();

        config.catalog.path = None;
        assert_eq!(config.catalog_seed().unwrap(), CatalogSeed::default());
    }
}
