//! Payment gateway configuration.
//!
//! The key id and key secret are read from `GATEWAY_KEY_ID` and
//! `GATEWAY_KEY_SECRET` only; they are never part of `config.toml`.

use crate::entities::payment::GatewayProvider;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Gateway adapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Processor recorded on every payment
    pub provider: GatewayProvider,
    /// Upper bound on a single order-creation call
    pub timeout_secs: u64,
    /// Shared credentials, loaded from the environment
    #[serde(skip)]
    pub credentials: Option<GatewayCredentials>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: GatewayProvider::Razorpay,
            timeout_secs: 10,
            credentials: None,
        }
    }
}

impl GatewayConfig {
    /// Timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// A zero timeout would fail every order.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::Config {
                message: "gateway.timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Key pair shared with the payment processor.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayCredentials {
    /// Public key identifier
    pub key_id: String,
    /// Secret used to sign and verify payment confirmations
    pub key_secret: String,
}

impl GatewayCredentials {
    /// Builds credentials, returning `None` when either half is blank.
    #[must_use]
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Option<Self> {
        let key_id = key_id.into();
        let key_secret = key_secret.into();
        if key_id.trim().is_empty() || key_secret.trim().is_empty() {
            return None;
        }
        Some(Self { key_id, key_secret })
    }

    /// Reads `GATEWAY_KEY_ID` and `GATEWAY_KEY_SECRET`.
    ///
    /// Returns `None` unless both are set and non-empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        match (
            std::env::var("GATEWAY_KEY_ID"),
            std::env::var("GATEWAY_KEY_SECRET"),
        ) {
            (Ok(key_id), Ok(key_secret)) => Self::new(key_id, key_secret),
            _ => None,
        }
    }
}

// Keeps the secret out of logs.
impl fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_blank_credentials_are_rejected() {
        assert!(GatewayCredentials::new("", "secret").is_none());
        assert!(GatewayCredentials::new("rzp_test", "   ").is_none());
        assert!(GatewayCredentials::new("rzp_test", "secret").is_some());
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let credentials = GatewayCredentials::new("rzp_test", "top-secret").unwrap();
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("rzp_test"));
        assert!(!rendered.contains("top-secret"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = GatewayConfig {
            timeout_secs: 0,
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(GatewayConfig::default().timeout(), Duration::from_secs(10));
    }
}
