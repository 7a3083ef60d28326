//! Configuration management for the GTM administration server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with GTM__ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration, used by the postgres store backend
    pub database: DatabaseConfig,

    /// Document store configuration
    pub store: StoreConfig,

    /// Report settings
    pub reports: ReportsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// How many times a conflicting stock transaction is attempted
    pub transaction_max_attempts: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportsConfig {
    /// Printed as the report title
    pub business_name: String,

    /// Sale price over cost assumed for lines without a product
    pub estimated_markup: Decimal,

    /// Products at or below this stock count as low stock; unset disables it
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("GTM__ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost:5432/gtm_admin")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("store.backend", "postgres")?
            .set_default("store.transaction_max_attempts", 5)?
            .set_default("reports.business_name", "GTM GRANDOLI TALLER MECÁNICO")?
            .set_default("reports.estimated_markup", "1.5")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (GTM__ prefix)
            .add_source(
                Environment::with_prefix("GTM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Configuration for tests and local tooling: in-memory store, defaults
    pub fn in_memory() -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 0,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                transaction_max_attempts: 5,
            },
            reports: ReportsConfig {
                business_name: "GTM GRANDOLI TALLER MECÁNICO".to_string(),
                estimated_markup: shared::report::default_estimated_markup(),
                low_stock_threshold: None,
            },
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.store.transaction_max_attempts == 0 {
            return Err(ConfigError::Message(
                "store.transaction_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.reports.estimated_markup <= Decimal::ZERO {
            return Err(ConfigError::Message(
                "reports.estimated_markup must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
