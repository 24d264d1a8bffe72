//! Billing engine - Payment intents, gateway reconciliation and advocate earnings.
//!
//! A payment is created `pending` against a gateway order and completed only by
//! a confirmation whose HMAC signature verifies. Completion, invoice numbering
//! and the credit to the linked case happen in one database transaction, and
//! the status transition is a compare-and-swap, so a confirmation delivered
//! twice credits the case once.
//!
//! Amounts are exact decimals in major units, rounded to the paisa. The platform
//! fee and the advocate's share are derived once, when the payment is created,
//! and always add up to the amount.

use super::actor::Actor;
use super::case::{self, BillingCredit, BillingRefund};
use super::context::AppContext;
use super::numbering::{MAX_NUMBERING_ATTEMPTS, is_unique_violation};
use crate::entities::payment::{self, PaymentStatus, PaymentType};
use crate::entities::{Payment, PaymentColumn};
use crate::errors::{Error, Result};
use crate::gateway::{GatewayOrder, OrderRequest, SignatureCheck};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Rounds a major-unit amount to two decimal places, halves away from zero.
#[must_use]
pub fn round_to_paisa(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// How a payment is divided between platform and advocate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeSplit {
    /// Platform commission
    pub platform_fee: Decimal,
    /// Amount owed to the advocate
    pub advocate_amount: Decimal,
}

/// Divides `amount` between the platform and the advocate.
///
/// The platform fee is `amount * percentage / 100` rounded to the paisa; the
/// advocate receives the exact remainder, so the two parts always sum to
/// `amount`.
///
/// # Arguments
/// * `amount` - Payment amount in major units
/// * `percentage` - Platform commission, `0..=100`
#[must_use]
pub fn split_fee(amount: Decimal, percentage: Decimal) -> FeeSplit {
    let platform_fee = round_to_paisa(amount * (percentage / Decimal::ONE_HUNDRED));
    FeeSplit {
        platform_fee,
        advocate_amount: amount - platform_fee,
    }
}

/// Input for [`create_order`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    /// Amount in major units
    pub amount: Decimal,
    /// Advocate being paid
    pub advocate_id: String,
    /// Case the payment is for, if any
    pub case_id: Option<i64>,
    /// Defaults to consultation
    pub payment_type: Option<PaymentType>,
    /// Free-text note
    pub description: Option<String>,
}

/// Result of [`create_order`]: the gateway order the client pays against, and
/// the pending payment that references it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedOrder {
    /// Order as created at the gateway
    pub order: GatewayOrder,
    /// Persisted payment in `pending`
    pub payment: payment::Model,
}

/// Confirmation returned by the gateway checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPayment {
    /// Gateway order id
    pub order_id: String,
    /// Gateway payment id
    pub payment_id: String,
    /// Hex HMAC-SHA256 of `order_id|payment_id`
    pub signature: String,
}

/// Result of [`verify_payment`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedPayment {
    /// Payment after verification
    pub payment: payment::Model,
    /// False when the payment had already been completed by this confirmation
    pub newly_completed: bool,
}

/// An advocate's completed payments and what they earned from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Earnings {
    /// Sum of `advocate_amount` over completed payments
    pub total_earnings: Decimal,
    /// Completed payments, newest first
    pub payments: Vec<payment::Model>,
}

/// Loads a payment by id.
pub async fn find_payment<C: ConnectionTrait>(db: &C, payment_id: i64) -> Result<payment::Model> {
    Payment::find_by_id(payment_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Payment", payment_id))
}

/// Loads a payment by its gateway order id.
pub async fn find_payment_by_order<C: ConnectionTrait>(
    db: &C,
    order_id: &str,
) -> Result<payment::Model> {
    debug!(order_id, "Looking up payment by gateway order");
    Payment::find()
        .filter(PaymentColumn::GatewayOrderId.eq(order_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Payment", order_id))
}

/// Creates a gateway order and a pending payment for it.
///
/// The order is created first, bounded by the configured gateway timeout; the
/// payment is persisted only once the order exists.
///
/// # Arguments
/// * `ctx` - Application context
/// * `actor` - The paying client
/// * `request` - Amount, payee and optional case
///
/// # Returns
/// The gateway order the client checks out against, and the pending payment
///
/// # Errors
/// * [`Error::Forbidden`] - the actor is not a client, or the case is not theirs
/// * [`Error::InvalidAmount`] - the amount is not positive once rounded to the paisa
/// * [`Error::InvalidArgument`] - no advocate, or not the case's advocate
/// * [`Error::NotFound`] - the referenced case does not exist
/// * [`Error::ServiceUnavailable`] - the gateway failed, timed out or has no
///   credentials; no payment is left behind
/// * [`Error::Conflict`] - no unique transaction id could be allocated, or the
///   gateway returned an order another payment already holds
pub async fn create_order(
    ctx: &AppContext,
    actor: &Actor,
    request: NewPayment,
) -> Result<CreatedOrder> {
    let client_id = match actor {
        Actor::Client(id) => id,
        Actor::Advocate(_) => return Err(Error::forbidden("Only clients can make payments")),
    };

    let amount = round_to_paisa(request.amount);
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount {
            amount: request.amount,
        });
    }

    let advocate_id = request.advocate_id.trim();
    if advocate_id.is_empty() {
        return Err(Error::invalid("Advocate is required for a payment"));
    }

    if let Some(case_id) = request.case_id {
        let case = case::find_case(&ctx.database, case_id).await?;
        if case.client_id != *client_id {
            return Err(Error::forbidden("You can only pay for your own cases"));
        }
        if case
            .advocate_id
            .as_deref()
            .is_some_and(|assigned| assigned != advocate_id)
        {
            return Err(Error::invalid(
                "Payment advocate does not match the advocate assigned to the case",
            ));
        }
    }

    let now = ctx.now();
    let split = split_fee(amount, ctx.billing.platform_fee_percentage);
    let order_request = OrderRequest {
        amount,
        currency: ctx.billing.currency.clone(),
        receipt: ctx.numbers.receipt(now),
    };

    let order = tokio::time::timeout(ctx.gateway_timeout, ctx.gateway.create_order(order_request))
        .await
        .map_err(|_| {
            warn!(timeout = ?ctx.gateway_timeout, "Gateway order creation timed out");
            Error::unavailable("Payment gateway timed out")
        })?
        .inspect_err(|e| warn!(error = %e, "Gateway order creation failed"))?;

    for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
        let transaction_id = ctx.numbers.transaction_id(now);
        let model = payment::ActiveModel {
            transaction_id: Set(transaction_id.clone()),
            client_id: Set(client_id.clone()),
            advocate_id: Set(advocate_id.to_string()),
            case_id: Set(request.case_id),
            amount: Set(amount),
            currency: Set(ctx.billing.currency.clone()),
            payment_type: Set(request.payment_type.unwrap_or_default()),
            description: Set(request.description.clone()),
            status: Set(PaymentStatus::Pending),
            gateway_provider: Set(ctx.gateway.provider()),
            gateway_order_id: Set(order.order_id.clone()),
            gateway_payment_id: Set(None),
            gateway_signature: Set(None),
            platform_fee_percentage: Set(ctx.billing.platform_fee_percentage),
            platform_fee: Set(split.platform_fee),
            advocate_amount: Set(split.advocate_amount),
            invoice_number: Set(None),
            paid_at: Set(None),
            refunded_at: Set(None),
            refund_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(&ctx.database).await {
            Ok(payment) => {
                info!(
                    payment_id = payment.id,
                    transaction_id = %payment.transaction_id,
                    order_id = %order.order_id,
                    %amount,
                    "Payment order created"
                );
                return Ok(CreatedOrder { order, payment });
            }
            Err(err) if is_unique_violation(&err) => {
                let order_taken = Payment::find()
                    .filter(PaymentColumn::GatewayOrderId.eq(order.order_id.as_str()))
                    .count(&ctx.database)
                    .await?
                    > 0;
                if order_taken {
                    warn!(order_id = %order.order_id, "Gateway order already has a payment");
                    return Err(Error::conflict(
                        "Gateway returned an order that already belongs to another payment",
                    ));
                }
                warn!(attempt, %transaction_id, "Transaction id collision, retrying");
            }
            Err(err) => {
                warn!(
                    order_id = %order.order_id,
                    error = %err,
                    "Gateway order left without a payment"
                );
                return Err(err.into());
            }
        }
    }

    warn!(order_id = %order.order_id, "Gateway order left without a payment");
    Err(Error::conflict("Could not allocate a unique transaction id"))
}

/// Outcome for a confirmation that arrives after the payment left `pending`.
fn settled_outcome(payment: payment::Model, payment_id: &str) -> Result<VerifiedPayment> {
    if payment.status == PaymentStatus::Completed
        && payment.gateway_payment_id.as_deref() == Some(payment_id)
    {
        debug!(payment_id = payment.id, "Confirmation already applied");
        return Ok(VerifiedPayment {
            payment,
            newly_completed: false,
        });
    }
    warn!(
        payment_id = payment.id,
        status = ?payment.status,
        "Confirmation for a settled payment refused"
    );
    Err(Error::conflict(format!(
        "Payment cannot be verified in status {:?}",
        payment.status
    )))
}

/// Completes a payment from a signed gateway confirmation.
///
/// On success the payment becomes `completed`, receives its invoice number and
/// credits the linked case, all in one transaction. Re-delivery of an applied
/// confirmation succeeds without a second credit.
///
/// # Arguments
/// * `ctx` - Application context
/// * `actor` - The client who created the payment
/// * `request` - Order id, gateway payment id and signature from checkout
///
/// # Errors
/// * [`Error::InvalidArgument`] - a confirmation field is blank, or the
///   signature does not match; the payment is left untouched
/// * [`Error::Forbidden`] - the actor did not create the payment
/// * [`Error::NotFound`] - no payment has this order id
/// * [`Error::Conflict`] - the payment was settled by another confirmation or
///   is cancelled, failed or refunded
/// * [`Error::ServiceUnavailable`] - the gateway has no credentials
pub async fn verify_payment(
    ctx: &AppContext,
    actor: &Actor,
    request: VerifyPayment,
) -> Result<VerifiedPayment> {
    let client_id = match actor {
        Actor::Client(id) => id,
        Actor::Advocate(_) => return Err(Error::forbidden("Only clients can verify payments")),
    };
    if [&request.order_id, &request.payment_id, &request.signature]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(Error::invalid("Payment verification data missing"));
    }

    let payment = find_payment_by_order(&ctx.database, &request.order_id).await?;
    if payment.client_id != *client_id {
        return Err(Error::forbidden("You can only verify your own payments"));
    }

    let check = SignatureCheck {
        order_id: request.order_id.clone(),
        payment_id: request.payment_id.clone(),
        signature: request.signature.clone(),
    };
    if !ctx.gateway.verify_signature(&check)? {
        warn!(payment_id = payment.id, order_id = %request.order_id, "Invalid payment signature");
        return Err(Error::invalid("Invalid payment signature"));
    }

    if !payment.status.awaits_capture() {
        return settled_outcome(payment, &request.payment_id);
    }

    let now = ctx.now();
    for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
        let invoice_number = ctx.numbers.invoice_number(now);
        let txn = ctx.database.begin().await?;

        let change = payment::ActiveModel {
            status: Set(PaymentStatus::Completed),
            gateway_payment_id: Set(Some(request.payment_id.clone())),
            gateway_signature: Set(Some(request.signature.clone())),
            invoice_number: Set(Some(invoice_number.clone())),
            paid_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        };
        let updated = Payment::update_many()
            .set(change)
            .filter(PaymentColumn::Id.eq(payment.id))
            .filter(
                PaymentColumn::Status.is_in([PaymentStatus::Pending, PaymentStatus::Processing]),
            )
            .exec(&txn)
            .await;

        let result = match updated {
            Ok(result) => result,
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                warn!(attempt, %invoice_number, "Invoice number collision, retrying");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        if result.rows_affected == 0 {
            txn.rollback().await?;
            let latest = find_payment(&ctx.database, payment.id).await?;
            return settled_outcome(latest, &request.payment_id);
        }

        if let Some(case_id) = payment.case_id {
            case::apply_billing_credit(
                &txn,
                &BillingCredit {
                    case_id,
                    amount: payment.amount,
                    transaction_id: payment.transaction_id.clone(),
                    at: now,
                },
            )
            .await?;
        }
        txn.commit().await?;

        info!(
            payment_id = payment.id,
            transaction_id = %payment.transaction_id,
            %invoice_number,
            "Payment completed"
        );
        return Ok(VerifiedPayment {
            payment: find_payment(&ctx.database, payment.id).await?,
            newly_completed: true,
        });
    }

    Err(Error::conflict("Could not allocate a unique invoice number"))
}

/// Refunds a completed payment and debits the linked case.
///
/// Only the advocate who received the payment may refund it. The refund is
/// recorded locally; the case becomes `partial` while other payments remain
/// and `refunded` once nothing does.
///
/// # Errors
/// * [`Error::Forbidden`] - the actor is not the receiving advocate
/// * [`Error::NotFound`] - the payment does not exist
/// * [`Error::Conflict`] - the payment is not `completed`
pub async fn refund_payment(
    ctx: &AppContext,
    actor: &Actor,
    payment_id: i64,
    reason: Option<String>,
) -> Result<payment::Model> {
    let advocate_id = match actor {
        Actor::Advocate(id) => id,
        Actor::Client(_) => {
            return Err(Error::forbidden("Only the receiving advocate can refund a payment"));
        }
    };

    let payment = find_payment(&ctx.database, payment_id).await?;
    if payment.advocate_id != *advocate_id {
        return Err(Error::forbidden("Only the receiving advocate can refund a payment"));
    }
    if payment.status != PaymentStatus::Completed {
        return Err(Error::conflict("Only completed payments can be refunded"));
    }

    let now = ctx.now();
    let txn = ctx.database.begin().await?;
    let result = Payment::update_many()
        .set(payment::ActiveModel {
            status: Set(PaymentStatus::Refunded),
            refunded_at: Set(Some(now)),
            refund_reason: Set(reason),
            updated_at: Set(now),
            ..Default::default()
        })
        .filter(PaymentColumn::Id.eq(payment_id))
        .filter(PaymentColumn::Status.eq(PaymentStatus::Completed))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(Error::conflict("Only completed payments can be refunded"));
    }

    if let Some(case_id) = payment.case_id {
        case::apply_billing_refund(
            &txn,
            &BillingRefund {
                case_id,
                amount: payment.amount,
                transaction_id: payment.transaction_id.clone(),
                at: now,
            },
        )
        .await?;
    }
    txn.commit().await?;

    info!(payment_id, amount = %payment.amount, "Payment refunded");
    find_payment(&ctx.database, payment_id).await
}

/// Cancels a pending payment. Only the paying client may cancel.
///
/// # Errors
/// [`Error::Conflict`] once the payment has left `pending`.
pub async fn cancel_payment(
    ctx: &AppContext,
    actor: &Actor,
    payment_id: i64,
) -> Result<payment::Model> {
    let client_id = match actor {
        Actor::Client(id) => id,
        Actor::Advocate(_) => return Err(Error::forbidden("Only the paying client can cancel")),
    };

    let payment = find_payment(&ctx.database, payment_id).await?;
    if payment.client_id != *client_id {
        return Err(Error::forbidden("Only the paying client can cancel"));
    }

    let result = Payment::update_many()
        .set(payment::ActiveModel {
            status: Set(PaymentStatus::Cancelled),
            updated_at: Set(ctx.now()),
            ..Default::default()
        })
        .filter(PaymentColumn::Id.eq(payment_id))
        .filter(PaymentColumn::Status.eq(PaymentStatus::Pending))
        .exec(&ctx.database)
        .await?;

    if result.rows_affected == 0 {
        warn!(payment_id, status = ?payment.status, "Cancel refused");
        return Err(Error::conflict("Only pending payments can be cancelled"));
    }

    info!(payment_id, "Payment cancelled");
    find_payment(&ctx.database, payment_id).await
}

/// Lists the caller's payments, newest first.
pub async fn list_payments(ctx: &AppContext, actor: &Actor) -> Result<Vec<payment::Model>> {
    let select = match actor {
        Actor::Client(id) => Payment::find().filter(PaymentColumn::ClientId.eq(id.as_str())),
        Actor::Advocate(id) => Payment::find().filter(PaymentColumn::AdvocateId.eq(id.as_str())),
    };
    select
        .order_by_desc(PaymentColumn::CreatedAt)
        .order_by_desc(PaymentColumn::Id)
        .all(&ctx.database)
        .await
        .map_err(Into::into)
}

/// Totals the calling advocate's completed payments.
///
/// Payments are returned most recently paid first.
///
/// # Errors
/// [`Error::Forbidden`] for clients.
pub async fn get_earnings(ctx: &AppContext, actor: &Actor) -> Result<Earnings> {
    let advocate_id = match actor {
        Actor::Advocate(id) => id,
        Actor::Client(_) => return Err(Error::forbidden("Only advocates have earnings")),
    };

    let payments = Payment::find()
        .filter(PaymentColumn::AdvocateId.eq(advocate_id.as_str()))
        .filter(PaymentColumn::Status.eq(PaymentStatus::Completed))
        .order_by_desc(PaymentColumn::PaidAt)
        .order_by_desc(PaymentColumn::Id)
        .all(&ctx.database)
        .await?;

    let total_earnings: Decimal = payments.iter().map(|p| p.advocate_amount).sum();
    debug!(advocate_id = %advocate_id, %total_earnings, "Earnings computed");

    Ok(Earnings {
        total_earnings,
        payments,
    })
}
