//! In-process payment gateway.
//!
//! Behaves like a hosted processor with test keys: orders are created locally,
//! repeated receipts return the original order, and confirmations are signed
//! with the configured key secret. It can be switched offline to exercise the
//! unavailable path.

use super::{GatewayOrder, OrderRequest, PaymentGateway, SignatureCheck, signature, to_minor_units};
use crate::config::{GatewayConfig, GatewayCredentials};
use crate::entities::payment::GatewayProvider;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Local stand-in for a hosted processor.
#[derive(Debug)]
pub struct SandboxGateway {
    provider: GatewayProvider,
    credentials: Option<GatewayCredentials>,
    orders: Mutex<HashMap<String, GatewayOrder>>,
    offline: AtomicBool,
}

impl SandboxGateway {
    /// Creates a Razorpay-flavoured sandbox with the given keys.
    #[must_use]
    pub fn new(credentials: Option<GatewayCredentials>) -> Self {
        Self {
            provider: GatewayProvider::Razorpay,
            credentials,
            orders: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Creates a sandbox from the gateway section of the configuration.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            provider: config.provider,
            ..Self::new(config.credentials.clone())
        }
    }

    /// Simulates the processor becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Signs a confirmation the way the processor's checkout would.
    pub fn sign_payment(&self, order_id: &str, payment_id: &str) -> Result<String> {
        signature::sign(&self.credentials()?.key_secret, order_id, payment_id)
    }

    /// Number of distinct orders created so far.
    pub async fn order_count(&self) -> usize {
        self.orders.lock().await.len()
    }

    fn credentials(&self) -> Result<&GatewayCredentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| Error::unavailable("Payment gateway credentials are not configured"))
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    fn provider(&self) -> GatewayProvider {
        self.provider
    }

    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder> {
        let credentials = self.credentials()?;
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::unavailable("Payment gateway is unreachable"));
        }
        let amount_minor = to_minor_units(request.amount)?;

        let mut orders = self.orders.lock().await;
        if let Some(existing) = orders.get(&request.receipt) {
            debug!(
                receipt = %request.receipt,
                order_id = %existing.order_id,
                "Returning existing order"
            );
            return Ok(existing.clone());
        }

        let order = GatewayOrder {
            order_id: format!("order_{:016x}", rand::random::<u64>()),
            amount_minor,
            currency: request.currency,
            receipt: request.receipt.clone(),
        };
        debug!(
            key_id = %credentials.key_id,
            order_id = %order.order_id,
            amount_minor,
            "Sandbox order created"
        );
        orders.insert(request.receipt, order.clone());
        Ok(order)
    }

    fn verify_signature(&self, check: &SignatureCheck) -> Result<bool> {
        signature::verify(&self.credentials()?.key_secret, check)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal::Decimal;

    fn gateway() -> SandboxGateway {
        SandboxGateway::new(GatewayCredentials::new("rzp_test_key", "test_secret"))
    }

    fn request(receipt: &str) -> OrderRequest {
        OrderRequest {
            amount: Decimal::from(1500),
            currency: "INR".to_string(),
            receipt: receipt.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_order_is_idempotent_per_receipt() -> Result<()> {
        let gateway = gateway();
        let first = gateway.create_order(request("RCT-1")).await?;
        let again = gateway.create_order(request("RCT-1")).await?;
        let other = gateway.create_order(request("RCT-2")).await?;

        assert_eq!(first, again);
        assert_ne!(first.order_id, other.order_id);
        assert_eq!(first.amount_minor, 150_000);
        assert_eq!(gateway.order_count().await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_offline_gateway_is_unavailable() {
        let gateway = gateway();
        gateway.set_offline(true);
        let result = gateway.create_order(request("RCT-1")).await;
        assert!(matches!(result, Err(Error::ServiceUnavailable { .. })));
        assert_eq!(gateway.order_count().await, 0);

        gateway.set_offline(false);
        assert!(gateway.create_order(request("RCT-1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_credentials_are_unavailable() {
        let gateway = SandboxGateway::new(None);
        let result = gateway.create_order(request("RCT-1")).await;
        assert!(matches!(result, Err(Error::ServiceUnavailable { .. })));

        let check = SignatureCheck {
            order_id: "order_1".to_string(),
            payment_id: "pay_1".to_string(),
            signature: "00".to_string(),
        };
        assert!(matches!(
            gateway.verify_signature(&check),
            Err(Error::ServiceUnavailable { .. })
        ));
    }

    #[test]
    fn test_signed_payment_verifies() {
        let gateway = gateway();
        let signature = gateway.sign_payment("order_1", "pay_1").unwrap();
        let check = SignatureCheck {
            order_id: "order_1".to_string(),
            payment_id: "pay_1".to_string(),
            signature,
        };
        assert!(gateway.verify_signature(&check).unwrap());
    }
}
