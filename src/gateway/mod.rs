//! Payment gateway adapter seam.
//!
//! The billing core talks to the processor only through [`PaymentGateway`].
//! Amounts cross this boundary in major units (`Decimal` rupees); conversion to the
//! processor's integer minor units happens here and nowhere else.

/// HMAC-SHA256 payment confirmation signatures
pub mod signature;
/// In-process gateway used offline and in tests
pub mod sandbox;

pub use sandbox::SandboxGateway;

use crate::entities::payment::GatewayProvider;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// Order creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    /// Amount in major units
    pub amount: Decimal,
    /// ISO 4217 currency code
    pub currency: String,
    /// Merchant-side reference; repeating it returns the same order
    pub receipt: String,
}

/// Order as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Processor-assigned order id
    pub order_id: String,
    /// Amount in minor units (paise)
    pub amount_minor: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Receipt the order was created with
    pub receipt: String,
}

/// Confirmation data the client returns after checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCheck {
    /// Order id the payment belongs to
    pub order_id: String,
    /// Processor-assigned payment id
    pub payment_id: String,
    /// Hex-encoded HMAC-SHA256 of `order_id|payment_id`
    pub signature: String,
}

/// A payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Processor recorded on payments created through this adapter.
    fn provider(&self) -> GatewayProvider;

    /// Creates an order at the processor.
    ///
    /// Fails with [`Error::ServiceUnavailable`] when the processor cannot be
    /// reached or credentials are missing.
    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder>;

    /// Verifies a payment confirmation. `Ok(false)` means the signature does not
    /// match; `Err` means verification could not be performed.
    fn verify_signature(&self, check: &SignatureCheck) -> Result<bool>;
}

/// Converts a major-unit amount to integer minor units, rounding to the nearest paisa.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|minor| minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|minor| minor.to_i64())
        .filter(|minor| *minor >= 1)
        .ok_or(Error::InvalidAmount { amount })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::from(1500)).unwrap(), 150_000);
        assert_eq!(to_minor_units(Decimal::new(30, 2)).unwrap(), 30);
        assert_eq!(to_minor_units(Decimal::new(19999, 3)).unwrap(), 2000);
        assert_eq!(to_minor_units(Decimal::new(1005, 3)).unwrap(), 101);
        assert!(matches!(
            to_minor_units(Decimal::ZERO),
            Err(Error::InvalidAmount { .. })
        ));
        assert!(to_minor_units(Decimal::from(-5)).is_err());
        assert!(to_minor_units(Decimal::new(1, 3)).is_err());
        assert!(to_minor_units(Decimal::MAX).is_err());
    }
}
