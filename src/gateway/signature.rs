//! Payment confirmation signatures.
//!
//! A confirmation is authentic when its signature equals
//! `hex(HMAC-SHA256(key_secret, "{order_id}|{payment_id}"))`. Comparison is
//! constant-time over the decoded bytes.

use super::SignatureCheck;
use crate::errors::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, order_id: &str, payment_id: &str) -> Result<Vec<u8>> {
    if secret.is_empty() {
        return Err(Error::unavailable("Gateway key secret is not configured"));
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::unavailable(format!("Gateway key secret is unusable: {e}")))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Returns the hex signature the processor would send for this payment.
pub fn sign(secret: &str, order_id: &str, payment_id: &str) -> Result<String> {
    mac_for(secret, order_id, payment_id).map(hex::encode)
}

/// Checks a confirmation against `secret`.
pub fn verify(secret: &str, check: &SignatureCheck) -> Result<bool> {
    let expected = mac_for(secret, &check.order_id, &check.payment_id)?;
    let Ok(provided) = hex::decode(check.signature.trim()) else {
        return Ok(false);
    };
    if provided.len() != expected.len() {
        return Ok(false);
    }
    Ok(expected.as_slice().ct_eq(provided.as_slice()).into())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn check(signature: String) -> SignatureCheck {
        SignatureCheck {
            order_id: "order_abc".to_string(),
            payment_id: "pay_123".to_string(),
            signature,
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let signature = sign("secret", "order_abc", "pay_123").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify("secret", &check(signature)).unwrap());
    }

    #[test]
    fn test_tampered_signatures_fail() {
        let signature = sign("secret", "order_abc", "pay_123").unwrap();

        let mut flipped = signature.clone().into_bytes();
        flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
        let flipped = String::from_utf8(flipped).unwrap();
        assert!(!verify("secret", &check(flipped)).unwrap());

        assert!(!verify("other-secret", &check(signature.clone())).unwrap());
        assert!(!verify("secret", &check("not-hex".to_string())).unwrap());
        assert!(!verify("secret", &check(signature[..32].to_string())).unwrap());

        let mut other_payment = check(signature);
        other_payment.payment_id = "pay_124".to_string();
        assert!(!verify("secret", &other_payment).unwrap());
    }

    #[test]
    fn test_missing_secret_is_unavailable() {
        let result = verify("", &check("00".to_string()));
        assert!(matches!(result, Err(Error::ServiceUnavailable { .. })));
    }
}
