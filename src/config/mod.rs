//! Application configuration.
//!
//! Non-secret settings come from an optional `config.toml`; secrets and
//! deployment overrides come from the environment (a `.env` file is loaded by
//! the binary before [`load_app_configuration`] runs).

/// Billing and pagination settings
pub mod billing;
/// Database connection and schema creation
pub mod database;
/// Payment gateway settings and credentials
pub mod gateway;

pub use billing::{BillingConfig, PaginationConfig};
pub use database::DatabaseConfig;
pub use gateway::{GatewayConfig, GatewayCredentials};

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Config file looked up when `LEGAL_DESK_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Deployment environment. Controls whether diagnostics are exposed in errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development: error bodies include internal detail
    Development,
    /// Everything else
    #[default]
    Production,
}

impl std::str::FromStr for Environment {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(Error::Config {
                message: format!("Unknown environment '{other}'"),
            }),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Entity store settings
    pub database: DatabaseConfig,
    /// Platform fee and currency
    pub billing: BillingConfig,
    /// List endpoint paging limits
    pub pagination: PaginationConfig,
    /// Payment gateway adapter settings
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse config.toml: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `DATABASE_URL`, `APP_ENV`, `GATEWAY_KEY_ID` and `GATEWAY_KEY_SECRET`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(environment) = std::env::var("APP_ENV") {
            self.environment = environment.parse()?;
        }
        self.gateway.credentials = GatewayCredentials::from_env();
        Ok(())
    }

    /// Checks cross-field constraints of every section.
    pub fn validate(&self) -> Result<()> {
        self.billing.validate()?;
        self.pagination.validate()?;
        self.gateway.validate()
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    AppConfig::from_toml_str(&contents)
}

/// Loads the configuration file (if present), then applies environment overrides.
///
/// The file path is taken from `LEGAL_DESK_CONFIG`, falling back to
/// [`DEFAULT_CONFIG_PATH`]. A missing file is not an error; defaults are used.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("LEGAL_DESK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    let mut config = if Path::new(&path).exists() {
        load_config(&path)?
    } else {
        info!("No configuration file at {path}, using defaults");
        AppConfig::default()
    };

    config.apply_env_overrides()?;
    config.validate()?;

    info!(
        environment = ?config.environment,
        fee_percentage = %config.billing.platform_fee_percentage,
        gateway_configured = config.gateway.credentials.is_some(),
        "Application configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            environment = "development"

            [database]
            url = "sqlite://data/test.sqlite"

            [billing]
            platform_fee_percentage = 12.5
            currency = "INR"

            [pagination]
            default_limit = 20
            max_limit = 50

            [gateway]
            provider = "razorpay"
            timeout_secs = 5
        "#;

        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database.url, "sqlite://data/test.sqlite");
        assert_eq!(config.billing.platform_fee_percentage, Decimal::new(125, 1));
        assert_eq!(config.pagination.default_limit, 20);
        assert_eq!(config.pagination.max_limit, 50);
        assert_eq!(config.gateway.timeout_secs, 5);
        assert!(config.gateway.credentials.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.billing.platform_fee_percentage, Decimal::TEN);
        assert_eq!(config.billing.currency, "INR");
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
        assert_eq!(config.gateway.timeout_secs, 10);
    }

    #[test]
    fn test_out_of_range_fee_is_rejected() {
        let result = AppConfig::from_toml_str("[billing]\nplatform_fee_percentage = 150.0\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "DEV".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("staging".parse::<Environment>().is_err());
    }
}
