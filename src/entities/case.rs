//! Case entity - a legal matter filed by one client and handled by at most one advocate.
//!
//! The billing sub-record of a case (`estimated_fee`, `agreed_fee`, `paid_amount`,
//! `payment_status`) lives in the same row. `version` is bumped on every write and
//! serves as the optimistic-concurrency token for conditional updates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Case database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cases")]
pub struct Model {
    /// Unique identifier for the case
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable number, e.g. `NS-2026-4821930042817`
    #[sea_orm(unique)]
    pub case_number: String,
    /// Short title, at most 200 characters
    pub title: String,
    /// Free-text account of the matter
    pub description: String,
    /// Client who filed the case
    #[sea_orm(indexed)]
    pub client_id: String,
    /// Advocate handling the case, set once on acceptance
    #[sea_orm(indexed)]
    pub advocate_id: Option<String>,
    /// Area of law
    pub case_type: CaseType,
    /// Optional finer classification
    pub sub_category: Option<String>,
    /// Lifecycle state
    pub status: CaseStatus,
    /// How quickly the client needs help
    pub urgency: Urgency,
    /// Incident report the case was opened from, if any
    pub related_incident: Option<String>,
    /// Fee quoted by the advocate on acceptance
    pub estimated_fee: Option<Decimal>,
    /// Fee agreed with the client
    pub agreed_fee: Option<Decimal>,
    /// Sum of completed payments less refunds
    pub paid_amount: Decimal,
    /// Settlement state of the case's fees
    pub payment_status: BillingStatus,
    /// When the case was filed
    pub filed_at: DateTimeUtc,
    /// First time the case entered `accepted`
    pub accepted_at: Option<DateTimeUtc>,
    /// First time the case entered `resolved`
    pub resolved_at: Option<DateTimeUtc>,
    /// First time the case entered `closed`
    pub closed_at: Option<DateTimeUtc>,
    /// Incremented on every write
    pub version: i32,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Case and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Timeline entries
    #[sea_orm(has_many = "super::case_update::Entity")]
    Updates,
    /// Uploaded documents
    #[sea_orm(has_many = "super::case_document::Entity")]
    Documents,
    /// AI analysis, when one has been produced
    #[sea_orm(has_one = "super::case_analysis::Entity")]
    Analysis,
    /// Payments made against the case
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::case_update::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Updates.def()
    }
}

impl Related<super::case_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::case_analysis::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Analysis.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Lifecycle state of a case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Filed, waiting for an advocate
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Taken on by an advocate
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Declined while pending; never acquires an advocate
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Advocate is actively working the case
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Outcome reached
    #[sea_orm(string_value = "resolved")]
    Resolved,
    /// Archived
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl CaseStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::InProgress,
        Self::Resolved,
        Self::Closed,
    ];

    /// Stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Whether a case in this status must have an assigned advocate.
    #[must_use]
    pub const fn requires_advocate(self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::InProgress | Self::Resolved | Self::Closed
        )
    }

    /// Comma-separated list of every valid value, for error messages.
    #[must_use]
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|status| status.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = crate::errors::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| crate::errors::Error::InvalidArgument {
                message: format!("Invalid status. Must be one of: {}", Self::valid_values()),
            })
    }
}

/// Area of law a case falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    /// Civil dispute
    #[sea_orm(string_value = "civil")]
    Civil,
    /// Criminal matter
    #[sea_orm(string_value = "criminal")]
    Criminal,
    /// Marriage, custody, inheritance
    #[sea_orm(string_value = "family")]
    Family,
    /// Land, tenancy, registration
    #[sea_orm(string_value = "property")]
    Property,
    /// Consumer protection
    #[sea_orm(string_value = "consumer")]
    Consumer,
    /// Employment
    #[sea_orm(string_value = "labour")]
    Labour,
    /// Company law
    #[sea_orm(string_value = "corporate")]
    Corporate,
    /// Fundamental rights
    #[sea_orm(string_value = "constitutional")]
    Constitutional,
    /// Information technology offences
    #[sea_orm(string_value = "cyber")]
    Cyber,
    /// Anything else
    #[sea_orm(string_value = "other")]
    Other,
}

/// Urgency requested by the client.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// No deadline pressure
    #[sea_orm(string_value = "low")]
    Low,
    /// Default
    #[default]
    #[sea_orm(string_value = "medium")]
    Medium,
    /// Needs attention soon
    #[sea_orm(string_value = "high")]
    High,
    /// Immediate risk
    #[sea_orm(string_value = "critical")]
    Critical,
}

/// Settlement state of a case's fees.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    /// Nothing paid yet
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Some money remains after a refund
    #[sea_orm(string_value = "partial")]
    Partial,
    /// A payment has been captured
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Everything paid has been returned
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in CaseStatus::ALL {
            assert_eq!(status.as_str().parse::<CaseStatus>().ok(), Some(status));
        }
    }

    #[test]
    fn test_unknown_status_lists_valid_values() {
        let err = "archived".parse::<CaseStatus>().unwrap_err();
        let message = err.to_string();
        for status in CaseStatus::ALL {
            assert!(message.contains(status.as_str()), "missing {status}");
        }
    }

    #[test]
    fn test_advocate_bearing_statuses() {
        assert!(!CaseStatus::Pending.requires_advocate());
        assert!(!CaseStatus::Rejected.requires_advocate());
        assert!(CaseStatus::Accepted.requires_advocate());
        assert!(CaseStatus::InProgress.requires_advocate());
        assert!(CaseStatus::Resolved.requires_advocate());
        assert!(CaseStatus::Closed.requires_advocate());
    }
}
