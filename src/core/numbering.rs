//! Human-readable identifiers for cases, transactions, invoices and gateway receipts.
//!
//! Every identifier embeds a process-wide sequence that wraps at 10 000, so any
//! 10 000 consecutive identifiers of one kind are pairwise distinct regardless of
//! clock resolution. The unique constraints on the backing columns catch
//! collisions between processes; callers retry up to [`MAX_NUMBERING_ATTEMPTS`]
//! times on a unique-constraint violation.

use chrono::{DateTime, Datelike, Utc};
use sea_orm::{DbErr, SqlErr};
use std::sync::atomic::{AtomicU64, Ordering};

/// Attempts made to insert a row with a freshly generated number.
pub const MAX_NUMBERING_ATTEMPTS: usize = 5;

/// Prefix of every case number.
pub const CASE_NUMBER_PREFIX: &str = "NS";

const SEQUENCE_SPAN: u64 = 10_000;

/// Produces identifiers. Implementations must be safe to share across tasks.
pub trait NumberGenerator: Send + Sync {
    /// `NS-{year}-{13 digits}`
    fn case_number(&self, now: DateTime<Utc>) -> String;
    /// `TXN{epoch millis}{8 digits}`
    fn transaction_id(&self, now: DateTime<Utc>) -> String;
    /// `INV-{yyyymm}-{8 digits}`
    fn invoice_number(&self, now: DateTime<Utc>) -> String;
    /// `RCT-{epoch millis}-{10 digits}`, sent to the gateway when creating an order.
    fn receipt(&self, now: DateTime<Utc>) -> String;
}

/// Time + sequence + random suffix generator.
#[derive(Debug, Default)]
pub struct SequencedNumbers {
    sequence: AtomicU64,
}

impl SequencedNumbers {
    /// Creates a generator whose sequence starts at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) % SEQUENCE_SPAN
    }
}

impl NumberGenerator for SequencedNumbers {
    fn case_number(&self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis().rem_euclid(1_000_000);
        format!(
            "{CASE_NUMBER_PREFIX}-{}-{millis:06}{:04}{:03}",
            now.year(),
            self.next_sequence(),
            rand::random::<u64>() % 1_000
        )
    }

    fn transaction_id(&self, now: DateTime<Utc>) -> String {
        format!(
            "TXN{}{:04}{:04}",
            now.timestamp_millis(),
            self.next_sequence(),
            rand::random::<u64>() % 10_000
        )
    }

    fn invoice_number(&self, now: DateTime<Utc>) -> String {
        format!(
            "INV-{}{:02}-{:04}{:04}",
            now.year(),
            now.month(),
            self.next_sequence(),
            rand::random::<u64>() % 10_000
        )
    }

    fn receipt(&self, now: DateTime<Utc>) -> String {
        format!(
            "RCT-{}-{:04}{:06}",
            now.timestamp_millis(),
            self.next_sequence(),
            rand::random::<u64>() % 1_000_000
        )
    }
}

fn all_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Checks the `NS-{yyyy}-{13 digits}` shape.
#[must_use]
pub fn is_case_number(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("NS-") else {
        return false;
    };
    match rest.split_once('-') {
        Some((year, tail)) => all_digits(year, 4) && all_digits(tail, 13),
        None => false,
    }
}

/// Checks the `TXN{digits}` shape.
#[must_use]
pub fn is_transaction_id(value: &str) -> bool {
    value
        .strip_prefix("TXN")
        .is_some_and(|digits| digits.len() > 8 && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Checks the `INV-{yyyymm}-{8 digits}` shape.
#[must_use]
pub fn is_invoice_number(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("INV-") else {
        return false;
    };
    match rest.split_once('-') {
        Some((period, tail)) => all_digits(period, 6) && all_digits(tail, 8),
        None => false,
    }
}

/// Checks the `RCT-{millis}-{10 digits}` shape.
#[must_use]
pub fn is_receipt(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("RCT-") else {
        return false;
    };
    match rest.split_once('-') {
        Some((millis, tail)) => {
            !millis.is_empty()
                && millis.bytes().all(|b| b.is_ascii_digit())
                && all_digits(tail, 10)
        }
        None => false,
    }
}

/// True when an insert or update failed on a unique constraint.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_formats() {
        let numbers = SequencedNumbers::new();
        let now = fixed_now();

        let case_number = numbers.case_number(now);
        assert!(case_number.starts_with("NS-2026-"), "{case_number}");
        assert!(is_case_number(&case_number), "{case_number}");

        let txn = numbers.transaction_id(now);
        assert!(txn.starts_with(&format!("TXN{}", now.timestamp_millis())));
        assert!(is_transaction_id(&txn), "{txn}");

        let invoice = numbers.invoice_number(now);
        assert!(invoice.starts_with("INV-202603-"), "{invoice}");
        assert!(is_invoice_number(&invoice), "{invoice}");

        let receipt = numbers.receipt(now);
        assert!(receipt.starts_with(&format!("RCT-{}-", now.timestamp_millis())));
        assert!(is_receipt(&receipt), "{receipt}");
    }

    #[test]
    fn test_receipts_from_separate_generators_differ() {
        let now = fixed_now();
        let first = SequencedNumbers::new();
        let second = SequencedNumbers::new();

        // Same millisecond, same sequence position; only the random suffix separates them.
        let a = first.receipt(now);
        let b = second.receipt(now);
        assert_eq!(a[..a.len() - 6], b[..b.len() - 6]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_validators_reject_malformed_values() {
        assert!(!is_case_number("NS-2026-123"));
        assert!(!is_case_number("XX-2026-1234567890123"));
        assert!(!is_case_number("NS-26-1234567890123"));
        assert!(!is_transaction_id("TXN"));
        assert!(!is_transaction_id("TXN12ab5678901"));
        assert!(!is_invoice_number("INV-2026-12345678"));
        assert!(!is_invoice_number("INV-202603-1234"));
        assert!(!is_receipt("RCT-1780000000000-0001"));
        assert!(!is_receipt("RCT--0001123456"));
    }

    #[test]
    fn test_ten_thousand_case_numbers_within_one_millisecond_are_distinct() {
        let numbers = SequencedNumbers::new();
        let now = fixed_now();

        let case_numbers: HashSet<String> =
            (0..10_000).map(|_| numbers.case_number(now)).collect();
        assert_eq!(case_numbers.len(), 10_000);

        let transaction_ids: HashSet<String> =
            (0..10_000).map(|_| numbers.transaction_id(now)).collect();
        assert_eq!(transaction_ids.len(), 10_000);

        let invoices: HashSet<String> =
            (0..10_000).map(|_| numbers.invoice_number(now)).collect();
        assert_eq!(invoices.len(), 10_000);
    }

    #[test]
    fn test_unique_violation_detection() {
        assert!(!is_unique_violation(&DbErr::Custom("boom".to_string())));
        assert!(!is_unique_violation(&DbErr::RecordNotFound(
            "missing".to_string()
        )));
    }
}
