//! Payment entity - money moving from a client to an advocate through a gateway.
//!
//! `platform_fee` and `advocate_amount` are derived once, when the payment is
//! inserted, and are never recomputed. `invoice_number` is assigned once, on
//! the transition to `completed`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable id, e.g. `TXN178044120000000420017`
    #[sea_orm(unique)]
    pub transaction_id: String,
    /// Paying client
    #[sea_orm(indexed)]
    pub client_id: String,
    /// Receiving advocate
    #[sea_orm(indexed)]
    pub advocate_id: String,
    /// Case being paid for; `None` for standalone consultations
    #[sea_orm(indexed)]
    pub case_id: Option<i64>,
    /// Amount in major currency units
    pub amount: Decimal,
    /// ISO 4217 currency code
    pub currency: String,
    /// What the payment is for
    pub payment_type: PaymentType,
    /// Free-text note from the client
    pub description: Option<String>,
    /// Lifecycle state
    pub status: PaymentStatus,
    /// Processor handling the payment
    pub gateway_provider: GatewayProvider,
    /// Order handle issued by the gateway
    #[sea_orm(unique)]
    pub gateway_order_id: String,
    /// Payment handle reported by the gateway on success
    pub gateway_payment_id: Option<String>,
    /// Signature that was verified on success
    pub gateway_signature: Option<String>,
    /// Commission rate applied, in percent
    pub platform_fee_percentage: Decimal,
    /// Commission kept by the platform
    pub platform_fee: Decimal,
    /// Amount owed to the advocate
    pub advocate_amount: Decimal,
    /// Invoice number, assigned on completion
    #[sea_orm(unique)]
    pub invoice_number: Option<String>,
    /// When the payment was verified
    pub paid_at: Option<DateTimeUtc>,
    /// When the payment was refunded
    pub refunded_at: Option<DateTimeUtc>,
    /// Why it was refunded
    pub refund_reason: Option<String>,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A payment may belong to one case
    #[sea_orm(
        belongs_to = "super::case::Entity",
        from = "Column::CaseId",
        to = "super::case::Column::Id"
    )]
    Case,
}

impl Related<super::case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Case.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Lifecycle state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Order created, waiting for the client to pay
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Gateway has the payment in flight
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Signature verified and money captured
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Gateway reported a failure
    #[sea_orm(string_value = "failed")]
    Failed,
    /// Money returned to the client
    #[sea_orm(string_value = "refunded")]
    Refunded,
    /// Abandoned by the client before payment
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl PaymentStatus {
    /// States from which a verified signature may complete the payment.
    #[must_use]
    pub const fn awaits_capture(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

/// Purpose of a payment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// One-off consultation
    #[default]
    #[sea_orm(string_value = "consultation")]
    Consultation,
    /// Fee for handling a case
    #[sea_orm(string_value = "case_fee")]
    CaseFee,
    /// Advance retainer
    #[sea_orm(string_value = "retainer")]
    Retainer,
    /// Drafting or review of documents
    #[sea_orm(string_value = "document_fee")]
    DocumentFee,
    /// Court charges passed through
    #[sea_orm(string_value = "court_fee")]
    CourtFee,
    /// Anything else
    #[sea_orm(string_value = "other")]
    Other,
}

/// Payment processor a payment went through.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum GatewayProvider {
    /// Razorpay hosted checkout
    #[default]
    #[sea_orm(string_value = "razorpay")]
    Razorpay,
    /// Stripe
    #[sea_orm(string_value = "stripe")]
    Stripe,
    /// Paytm
    #[sea_orm(string_value = "paytm")]
    Paytm,
    /// Direct UPI
    #[sea_orm(string_value = "upi")]
    Upi,
    /// Bank transfer
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    /// Cash
    #[sea_orm(string_value = "cash")]
    Cash,
}
