//! Case lifecycle engine - Handles filing, acceptance, status changes and reads.
//!
//! Every transition is a conditional update (`UPDATE ... WHERE id = ? AND <guard>`)
//! run in one database transaction with its timeline entry, so a transition and
//! the record of it are applied together or not at all. A guard that no longer
//! holds at write time (zero rows affected) is reported as [`Error::Conflict`].
//!
//! The billing sub-record (`paid_amount`, `payment_status`) is written here
//! only through [`apply_billing_credit`] and [`apply_billing_refund`], which the
//! billing engine calls on its own transaction.

use super::actor::Actor;
use super::analysis;
use super::billing::round_to_paisa;
use super::context::AppContext;
use super::numbering::{MAX_NUMBERING_ATTEMPTS, is_unique_violation};
use super::pagination::{Page, PageRequest};
use crate::entities::case::{BillingStatus, CaseStatus, CaseType, Urgency};
use crate::entities::case_document::DocumentKind;
use crate::entities::case_update::ActorKind;
use crate::entities::{
    Case, CaseColumn, CaseDocument, CaseDocumentColumn, CaseUpdate, CaseUpdateColumn, case,
    case_analysis, case_document, case_update,
};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Longest accepted case title, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Number of cases returned in [`CaseStats::recent`].
pub const RECENT_CASES: u64 = 5;

/// Input for [`create_case`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCase {
    /// Short title
    pub title: String,
    /// Free-text account of the matter
    pub description: String,
    /// Area of law
    pub case_type: CaseType,
    /// Defaults to medium
    pub urgency: Option<Urgency>,
    /// Finer classification
    pub sub_category: Option<String>,
    /// Incident report this case was opened from
    pub related_incident: Option<String>,
}

impl NewCase {
    /// A case with default urgency and no optional fields.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        case_type: CaseType,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            case_type,
            urgency: None,
            sub_category: None,
            related_incident: None,
        }
    }

    /// Sets the urgency.
    #[must_use]
    pub const fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }
}

/// Input for [`add_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    /// Where the file is stored
    pub url: String,
    /// Document category
    pub kind: DocumentKind,
    /// Original file name
    pub filename: String,
    /// Optional note from the uploader
    pub description: Option<String>,
}

/// Filter for [`list_cases`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseQuery {
    /// Only cases in this status
    pub status: Option<CaseStatus>,
    /// Page and size
    pub page: PageRequest,
}

/// A case with its timeline, documents and analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseDetail {
    /// The case row
    pub case: case::Model,
    /// Timeline, oldest first
    pub updates: Vec<case_update::Model>,
    /// Uploaded documents, oldest first
    pub documents: Vec<case_document::Model>,
    /// AI analysis, when one has been stored
    pub analysis: Option<case_analysis::Model>,
}

/// Per-status case counts, each defaulting to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Waiting for an advocate
    pub pending: u64,
    /// Taken on
    pub accepted: u64,
    /// Declined
    pub rejected: u64,
    /// Being worked
    pub in_progress: u64,
    /// Outcome reached
    pub resolved: u64,
    /// Archived
    pub closed: u64,
    /// Sum of all of the above
    pub total: u64,
}

impl StatusCounts {
    /// Count for one status.
    #[must_use]
    pub const fn get(&self, status: CaseStatus) -> u64 {
        match status {
            CaseStatus::Pending => self.pending,
            CaseStatus::Accepted => self.accepted,
            CaseStatus::Rejected => self.rejected,
            CaseStatus::InProgress => self.in_progress,
            CaseStatus::Resolved => self.resolved,
            CaseStatus::Closed => self.closed,
        }
    }

    const fn slot(&mut self, status: CaseStatus) -> &mut u64 {
        match status {
            CaseStatus::Pending => &mut self.pending,
            CaseStatus::Accepted => &mut self.accepted,
            CaseStatus::Rejected => &mut self.rejected,
            CaseStatus::InProgress => &mut self.in_progress,
            CaseStatus::Resolved => &mut self.resolved,
            CaseStatus::Closed => &mut self.closed,
        }
    }
}

/// Dashboard summary returned by [`case_stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseStats {
    /// Counts per status
    pub counts: StatusCounts,
    /// Most recently updated cases, newest first
    pub recent: Vec<case::Model>,
}

/// A completed payment to be added to a case's billing record.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingCredit {
    /// Case being paid for
    pub case_id: i64,
    /// Amount received, in major units
    pub amount: Decimal,
    /// Transaction id of the payment
    pub transaction_id: String,
    /// When the payment completed
    pub at: DateTime<Utc>,
}

/// A refunded payment to be removed from a case's billing record.
pub type BillingRefund = BillingCredit;

fn validate_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn validate_fee(fee: Decimal) -> Result<Decimal> {
    let rounded = round_to_paisa(fee);
    if rounded <= Decimal::ZERO {
        return Err(Error::InvalidAmount { amount: fee });
    }
    Ok(rounded)
}

fn authorize_party(actor: &Actor, case: &case::Model) -> Result<()> {
    let allowed = match actor {
        Actor::Client(id) => case.client_id == *id,
        Actor::Advocate(id) => case.advocate_id.as_deref() == Some(id.as_str()),
    };
    if allowed {
        Ok(())
    } else {
        Err(Error::forbidden("You don't have access to this case"))
    }
}

fn assigned_advocate<'a>(actor: &'a Actor, case: &case::Model) -> Result<&'a str> {
    match actor {
        Actor::Advocate(id) if case.advocate_id.as_deref() == Some(id.as_str()) => Ok(id),
        Actor::Advocate(_) | Actor::Client(_) => Err(Error::forbidden(
            "Only the assigned advocate can update this case",
        )),
    }
}

fn ensure_decidable(case: &case::Model, action: &str) -> Result<()> {
    if case.status != CaseStatus::Pending {
        return Err(Error::conflict(format!("Only pending cases can be {action}")));
    }
    if case.advocate_id.is_some() {
        return Err(Error::conflict("This case already has an assigned advocate"));
    }
    Ok(())
}

fn scoped(actor: &Actor) -> Select<Case> {
    match actor {
        Actor::Client(id) => Case::find().filter(CaseColumn::ClientId.eq(id.as_str())),
        Actor::Advocate(id) => Case::find().filter(CaseColumn::AdvocateId.eq(id.as_str())),
    }
}

/// Loads a case by id.
pub async fn find_case<C: ConnectionTrait>(db: &C, case_id: i64) -> Result<case::Model> {
    debug!(case_id, "Loading case");
    Case::find_by_id(case_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Case", case_id))
}

async fn append_update<C: ConnectionTrait>(
    db: &C,
    case_id: i64,
    message: String,
    status: CaseStatus,
    author: (Option<String>, ActorKind),
    at: DateTime<Utc>,
) -> Result<case_update::Model> {
    let (actor_id, actor_kind) = author;
    let update = case_update::ActiveModel {
        case_id: Set(case_id),
        message: Set(message),
        status: Set(status),
        actor_id: Set(actor_id),
        actor_kind: Set(actor_kind),
        created_at: Set(at),
        ..Default::default()
    };
    update.insert(db).await.map_err(Into::into)
}

/// Writes `change` only if the case still has the version it was read with.
async fn write_if_unchanged<C: ConnectionTrait>(
    db: &C,
    current: &case::Model,
    change: case::ActiveModel,
) -> Result<()> {
    let result = Case::update_many()
        .set(change)
        .col_expr(CaseColumn::Version, Expr::col(CaseColumn::Version).add(1))
        .filter(CaseColumn::Id.eq(current.id))
        .filter(CaseColumn::Version.eq(current.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!(case_id = current.id, version = current.version, "Stale case write rejected");
        return Err(Error::conflict(
            "Case was modified concurrently, please retry",
        ));
    }
    Ok(())
}

/// Files a new case for the calling client.
///
/// The case starts `pending` with no advocate and a system-authored timeline
/// entry. When an analyzer is configured, enrichment is dispatched on a
/// detached task after the case is committed.
///
/// # Arguments
/// * `ctx` - Application context
/// * `actor` - Must be a client; becomes the case owner
/// * `new_case` - Title, description, type and optional details
///
/// # Errors
/// * [`Error::Forbidden`] - the actor is an advocate
/// * [`Error::InvalidArgument`] - blank title or description, or a title over
///   [`MAX_TITLE_LENGTH`] characters
/// * [`Error::Conflict`] - no unique case number after [`MAX_NUMBERING_ATTEMPTS`] tries
pub async fn create_case(
    ctx: &AppContext,
    actor: &Actor,
    new_case: NewCase,
) -> Result<case::Model> {
    let client_id = match actor {
        Actor::Client(id) => id,
        Actor::Advocate(_) => return Err(Error::forbidden("Only clients can create cases")),
    };

    let title = validate_text(&new_case.title, "Title")?;
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(Error::invalid(format!(
            "Title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    let description = validate_text(&new_case.description, "Description")?;

    let now = ctx.now();
    for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
        let case_number = ctx.numbers.case_number(now);
        let txn = ctx.database.begin().await?;

        let model = case::ActiveModel {
            case_number: Set(case_number.clone()),
            title: Set(title.clone()),
            description: Set(description.clone()),
            client_id: Set(client_id.clone()),
            advocate_id: Set(None),
            case_type: Set(new_case.case_type),
            sub_category: Set(new_case.sub_category.clone()),
            status: Set(CaseStatus::Pending),
            urgency: Set(new_case.urgency.unwrap_or_default()),
            related_incident: Set(new_case.related_incident.clone()),
            estimated_fee: Set(None),
            agreed_fee: Set(None),
            paid_amount: Set(Decimal::ZERO),
            payment_status: Set(BillingStatus::Pending),
            filed_at: Set(now),
            accepted_at: Set(None),
            resolved_at: Set(None),
            closed_at: Set(None),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = match model.insert(&txn).await {
            Ok(created) => created,
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                warn!(attempt, %case_number, "Case number collision, retrying");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        append_update(
            &txn,
            created.id,
            "Case created successfully".to_string(),
            CaseStatus::Pending,
            (Some(client_id.clone()), ActorKind::System),
            now,
        )
        .await?;
        txn.commit().await?;

        info!(
            case_id = created.id,
            case_number = %created.case_number,
            client_id = %client_id,
            "Case created"
        );
        // Never awaited by the creator.
        drop(analysis::spawn_case_enrichment(
            ctx,
            created.id,
            created.description.clone(),
        ));
        return Ok(created);
    }

    Err(Error::conflict("Could not allocate a unique case number"))
}

/// Guarded transition out of `pending`, shared by accept and reject.
async fn decide(
    ctx: &AppContext,
    case_id: i64,
    advocate_id: &str,
    change: case::ActiveModel,
    action: &str,
    message: String,
    status: CaseStatus,
) -> Result<case::Model> {
    let current = find_case(&ctx.database, case_id).await?;
    if let Err(err) = ensure_decidable(&current, action) {
        warn!(case_id, advocate_id, status = %current.status, "Case cannot be {action}");
        return Err(err);
    }

    let now = ctx.now();
    let txn = ctx.database.begin().await?;
    let result = Case::update_many()
        .set(change)
        .col_expr(CaseColumn::Version, Expr::col(CaseColumn::Version).add(1))
        .filter(CaseColumn::Id.eq(case_id))
        .filter(CaseColumn::Status.eq(CaseStatus::Pending))
        .filter(CaseColumn::AdvocateId.is_null())
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        txn.rollback().await?;
        warn!(case_id, advocate_id, "Lost race to decide case");
        let latest = find_case(&ctx.database, case_id).await?;
        ensure_decidable(&latest, action)?;
        return Err(Error::conflict("Case was modified concurrently, please retry"));
    }

    append_update(
        &txn,
        case_id,
        message,
        status,
        (Some(advocate_id.to_string()), ActorKind::Advocate),
        now,
    )
    .await?;
    txn.commit().await?;

    info!(case_id, advocate_id, status = %status, "Case {action}");
    find_case(&ctx.database, case_id).await
}

/// Assigns the calling advocate to a pending, unassigned case.
///
/// Exactly one of several concurrent accepts succeeds. An optional estimated
/// fee is rounded to the paisa and recorded on the case.
///
/// # Arguments
/// * `ctx` - Application context
/// * `actor` - The accepting advocate
/// * `case_id` - Case to accept
/// * `estimated_fee` - Quote for the client, if any
///
/// # Errors
/// * [`Error::Forbidden`] - the actor is a client
/// * [`Error::InvalidAmount`] - the fee is not positive
/// * [`Error::NotFound`] - no such case
/// * [`Error::Conflict`] - the case is not pending, already has an advocate,
///   or another advocate accepted it first
pub async fn accept_case(
    ctx: &AppContext,
    actor: &Actor,
    case_id: i64,
    estimated_fee: Option<Decimal>,
) -> Result<case::Model> {
    let advocate_id = match actor {
        Actor::Advocate(id) => id,
        Actor::Client(_) => return Err(Error::forbidden("Only advocates can accept cases")),
    };
    let estimated_fee = estimated_fee.map(validate_fee).transpose()?;

    let now = ctx.now();
    let mut change = case::ActiveModel {
        advocate_id: Set(Some(advocate_id.clone())),
        status: Set(CaseStatus::Accepted),
        accepted_at: Set(Some(now)),
        payment_status: Set(BillingStatus::Pending),
        updated_at: Set(now),
        ..Default::default()
    };
    if let Some(fee) = estimated_fee {
        change.estimated_fee = Set(Some(fee));
    }

    decide(
        ctx,
        case_id,
        advocate_id,
        change,
        "accepted",
        format!("Case accepted by advocate {advocate_id}"),
        CaseStatus::Accepted,
    )
    .await
}

/// Declines a pending case. A rejected case never acquires an advocate.
///
/// # Errors
/// [`Error::Forbidden`] for clients, [`Error::Conflict`] once the case has left
/// `pending`.
pub async fn reject_case(
    ctx: &AppContext,
    actor: &Actor,
    case_id: i64,
    reason: Option<String>,
) -> Result<case::Model> {
    let advocate_id = match actor {
        Actor::Advocate(id) => id,
        Actor::Client(_) => return Err(Error::forbidden("Only advocates can reject cases")),
    };

    let message = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "Case rejected by advocate".to_string());

    let change = case::ActiveModel {
        status: Set(CaseStatus::Rejected),
        updated_at: Set(ctx.now()),
        ..Default::default()
    };

    decide(
        ctx,
        case_id,
        advocate_id,
        change,
        "rejected",
        message,
        CaseStatus::Rejected,
    )
    .await
}

/// Moves an assigned case to another status.
///
/// `status` is parsed here so that an unknown value reports every valid one.
/// An assigned case can never return to `pending` or `rejected`. Lifecycle
/// dates are set the first time their status is entered and never overwritten.
///
/// # Arguments
/// * `ctx` - Application context
/// * `actor` - The assigned advocate
/// * `case_id` - Case to update
/// * `status` - Target status name, e.g. `"in_progress"`
/// * `message` - Timeline note; a default is written when blank
///
/// # Errors
/// * [`Error::NotFound`] - no such case
/// * [`Error::Forbidden`] - the actor is not the assigned advocate
/// * [`Error::InvalidArgument`] - unknown status
/// * [`Error::Conflict`] - the target requires no advocate, or the case changed
///   since it was read
pub async fn update_status(
    ctx: &AppContext,
    actor: &Actor,
    case_id: i64,
    status: &str,
    message: Option<String>,
) -> Result<case::Model> {
    let current = find_case(&ctx.database, case_id).await?;
    let advocate_id = assigned_advocate(actor, &current)?;
    let target: CaseStatus = status.parse()?;

    if !target.requires_advocate() {
        warn!(case_id, from = %current.status, to = %target, "Refused status regression");
        return Err(Error::conflict(format!(
            "An assigned case cannot be moved to {target}"
        )));
    }

    let now = ctx.now();
    let mut change = case::ActiveModel {
        status: Set(target),
        updated_at: Set(now),
        ..Default::default()
    };
    match target {
        CaseStatus::Accepted if current.accepted_at.is_none() => {
            change.accepted_at = Set(Some(now));
        }
        CaseStatus::Resolved if current.resolved_at.is_none() => {
            change.resolved_at = Set(Some(now));
        }
        CaseStatus::Closed if current.closed_at.is_none() => change.closed_at = Set(Some(now)),
        _ => {}
    }

    let message = message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Status updated to {target}"));

    let txn = ctx.database.begin().await?;
    write_if_unchanged(&txn, &current, change).await?;
    append_update(
        &txn,
        case_id,
        message,
        target,
        (Some(advocate_id.to_string()), ActorKind::Advocate),
        now,
    )
    .await?;
    txn.commit().await?;

    info!(case_id, from = %current.status, to = %target, "Case status updated");
    find_case(&ctx.database, case_id).await
}

/// Records the fee agreed between client and assigned advocate.
///
/// # Errors
/// [`Error::Forbidden`] unless the actor is the assigned advocate, and
/// [`Error::InvalidAmount`] for a fee that is not positive.
pub async fn set_agreed_fee(
    ctx: &AppContext,
    actor: &Actor,
    case_id: i64,
    fee: Decimal,
) -> Result<case::Model> {
    let current = find_case(&ctx.database, case_id).await?;
    let advocate_id = assigned_advocate(actor, &current)?;
    let fee = validate_fee(fee)?;

    let now = ctx.now();
    let change = case::ActiveModel {
        agreed_fee: Set(Some(fee)),
        updated_at: Set(now),
        ..Default::default()
    };

    let txn = ctx.database.begin().await?;
    write_if_unchanged(&txn, &current, change).await?;
    append_update(
        &txn,
        case_id,
        format!("Agreed fee set to {fee:.2}"),
        current.status,
        (Some(advocate_id.to_string()), ActorKind::Advocate),
        now,
    )
    .await?;
    txn.commit().await?;

    info!(case_id, %fee, "Agreed fee recorded");
    find_case(&ctx.database, case_id).await
}

/// Attaches a document to a case. Allowed for the owning client and the assigned advocate.
pub async fn add_document(
    ctx: &AppContext,
    actor: &Actor,
    case_id: i64,
    document: NewDocument,
) -> Result<case_document::Model> {
    let current = find_case(&ctx.database, case_id).await?;
    authorize_party(actor, &current)?;
    let url = validate_text(&document.url, "Document URL")?;
    let filename = validate_text(&document.filename, "Filename")?;

    let now = ctx.now();
    let txn = ctx.database.begin().await?;
    let stored = case_document::ActiveModel {
        case_id: Set(case_id),
        url: Set(url),
        kind: Set(document.kind),
        filename: Set(filename),
        description: Set(document.description),
        uploaded_by: Set(actor.id().to_string()),
        uploader_kind: Set(actor.kind()),
        uploaded_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    Case::update_many()
        .set(case::ActiveModel {
            updated_at: Set(now),
            ..Default::default()
        })
        .col_expr(CaseColumn::Version, Expr::col(CaseColumn::Version).add(1))
        .filter(CaseColumn::Id.eq(case_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    info!(case_id, document_id = stored.id, uploader = %actor, "Document added");
    Ok(stored)
}

/// Loads a case with its timeline, documents and analysis.
pub async fn get_case(ctx: &AppContext, actor: &Actor, case_id: i64) -> Result<CaseDetail> {
    let case = find_case(&ctx.database, case_id).await?;
    authorize_party(actor, &case)?;

    let updates = CaseUpdate::find()
        .filter(CaseUpdateColumn::CaseId.eq(case_id))
        .order_by_asc(CaseUpdateColumn::Id)
        .all(&ctx.database)
        .await?;
    let documents = CaseDocument::find()
        .filter(CaseDocumentColumn::CaseId.eq(case_id))
        .order_by_asc(CaseDocumentColumn::Id)
        .all(&ctx.database)
        .await?;
    let analysis = analysis::get_analysis(&ctx.database, case_id).await?;

    Ok(CaseDetail {
        case,
        updates,
        documents,
        analysis,
    })
}

async fn fetch_page(
    ctx: &AppContext,
    select: Select<Case>,
    request: PageRequest,
) -> Result<Page<case::Model>> {
    let window = request.resolve(&ctx.pagination)?;
    let total = select.clone().count(&ctx.database).await?;
    let items = select
        .order_by_desc(CaseColumn::CreatedAt)
        .order_by_desc(CaseColumn::Id)
        .offset(window.offset)
        .limit(window.limit)
        .all(&ctx.database)
        .await?;
    Ok(Page::new(items, window.page, window.limit, total))
}

/// Lists the caller's cases, newest first.
///
/// Clients see the cases they filed; advocates see the cases assigned to them.
pub async fn list_cases(
    ctx: &AppContext,
    actor: &Actor,
    query: CaseQuery,
) -> Result<Page<case::Model>> {
    let mut select = scoped(actor);
    if let Some(status) = query.status {
        select = select.filter(CaseColumn::Status.eq(status));
    }
    fetch_page(ctx, select, query.page).await
}

/// Lists pending, unassigned cases an advocate could accept, newest first.
pub async fn list_open_cases(
    ctx: &AppContext,
    actor: &Actor,
    request: PageRequest,
) -> Result<Page<case::Model>> {
    match actor {
        Actor::Advocate(_) => {}
        Actor::Client(_) => {
            return Err(Error::forbidden("Only advocates can browse open cases"));
        }
    }
    let select = Case::find()
        .filter(CaseColumn::Status.eq(CaseStatus::Pending))
        .filter(CaseColumn::AdvocateId.is_null());
    fetch_page(ctx, select, request).await
}

/// Per-status counts and the most recently updated cases, scoped to the caller.
pub async fn case_stats(ctx: &AppContext, actor: &Actor) -> Result<CaseStats> {
    let mut counts = StatusCounts::default();
    for status in CaseStatus::ALL {
        let count = scoped(actor)
            .filter(CaseColumn::Status.eq(status))
            .count(&ctx.database)
            .await?;
        *counts.slot(status) = count;
        counts.total += count;
    }

    let recent = scoped(actor)
        .order_by_desc(CaseColumn::UpdatedAt)
        .order_by_desc(CaseColumn::Id)
        .limit(RECENT_CASES)
        .all(&ctx.database)
        .await?;

    Ok(CaseStats { counts, recent })
}

/// Adds a completed payment to the case's billing record.
///
/// Runs on the caller's transaction. `paid_amount` is incremented in SQL so the
/// credit is additive; the caller guarantees it is applied once per payment.
pub async fn apply_billing_credit<C: ConnectionTrait>(
    db: &C,
    credit: &BillingCredit,
) -> Result<()> {
    let current = find_case(db, credit.case_id).await?;

    Case::update_many()
        .set(case::ActiveModel {
            payment_status: Set(BillingStatus::Paid),
            updated_at: Set(credit.at),
            ..Default::default()
        })
        .col_expr(
            CaseColumn::PaidAmount,
            Expr::col(CaseColumn::PaidAmount).add(credit.amount),
        )
        .col_expr(CaseColumn::Version, Expr::col(CaseColumn::Version).add(1))
        .filter(CaseColumn::Id.eq(credit.case_id))
        .exec(db)
        .await?;

    append_update(
        db,
        credit.case_id,
        format!(
            "Payment {} of {:.2} received",
            credit.transaction_id, credit.amount
        ),
        current.status,
        (None, ActorKind::System),
        credit.at,
    )
    .await?;

    info!(case_id = credit.case_id, amount = %credit.amount, "Case credited");
    Ok(())
}

/// Removes a refunded payment from the case's billing record.
///
/// The billing status becomes `refunded` when nothing remains paid and
/// `partial` otherwise.
pub async fn apply_billing_refund<C: ConnectionTrait>(
    db: &C,
    refund: &BillingRefund,
) -> Result<()> {
    let current = find_case(db, refund.case_id).await?;
    let remaining = (current.paid_amount - refund.amount).max(Decimal::ZERO);
    let payment_status = if remaining > Decimal::ZERO {
        BillingStatus::Partial
    } else {
        BillingStatus::Refunded
    };

    let change = case::ActiveModel {
        paid_amount: Set(remaining),
        payment_status: Set(payment_status),
        updated_at: Set(refund.at),
        ..Default::default()
    };
    write_if_unchanged(db, &current, change).await?;

    append_update(
        db,
        refund.case_id,
        format!(
            "Payment {} of {:.2} refunded",
            refund.transaction_id, refund.amount
        ),
        current.status,
        (None, ActorKind::System),
        refund.at,
    )
    .await?;

    info!(case_id = refund.case_id, %remaining, "Case debited");
    Ok(())
}
