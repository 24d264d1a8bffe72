//! Billing and pagination settings.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Platform commission and settlement currency.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Share of every payment kept by the platform, in percent
    pub platform_fee_percentage: Decimal,
    /// ISO 4217 code used for all payments
    pub currency: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            platform_fee_percentage: Decimal::TEN,
            currency: "INR".to_string(),
        }
    }
}

impl BillingConfig {
    /// Fee must be within 0..=100 and the currency a three-letter uppercase code.
    pub fn validate(&self) -> Result<()> {
        if !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&self.platform_fee_percentage) {
            return Err(Error::Config {
                message: format!(
                    "platform_fee_percentage must be between 0 and 100, got {}",
                    self.platform_fee_percentage
                ),
            });
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(Error::Config {
                message: format!("currency must be an ISO 4217 code, got '{}'", self.currency),
            });
        }

        Ok(())
    }
}

/// Page size limits for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the caller gives none
    pub default_limit: u64,
    /// Largest page size a caller may request
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl PaginationConfig {
    /// Requires `1 <= default_limit <= max_limit`.
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 || self.max_limit < self.default_limit {
            return Err(Error::Config {
                message: format!(
                    "pagination limits must satisfy 1 <= default_limit ({}) <= max_limit ({})",
                    self.default_limit, self.max_limit
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_validation() {
        let mut config = BillingConfig::default();
        assert!(config.validate().is_ok());

        config.currency = "inr".to_string();
        assert!(config.validate().is_err());

        config.currency = "RUPEE".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fee_percentage_bounds() {
        let mut config = BillingConfig::default();

        config.platform_fee_percentage = Decimal::ZERO;
        assert!(config.validate().is_ok());

        config.platform_fee_percentage = Decimal::ONE_HUNDRED;
        assert!(config.validate().is_ok());

        config.platform_fee_percentage = Decimal::NEGATIVE_ONE;
        assert!(config.validate().is_err());

        config.platform_fee_percentage = Decimal::new(1001, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pagination_validation() {
        assert!(PaginationConfig::default().validate().is_ok());
        assert!(
            PaginationConfig {
                default_limit: 0,
                max_limit: 10
            }
            .validate()
            .is_err()
        );
        assert!(
            PaginationConfig {
                default_limit: 20,
                max_limit: 10
            }
            .validate()
            .is_err()
        );
    }
}
