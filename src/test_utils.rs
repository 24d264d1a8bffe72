//! Shared test utilities for `LegalDesk`.
//!
//! This module provides an in-memory database, a fully wired [`AppContext`]
//! backed by the sandbox gateway and a fixed clock, and helpers that create
//! cases in common states.

use crate::{
    config::{AppConfig, GatewayCredentials},
    core::{
        Actor, AppContext,
        case::{self, NewCase},
        clock::FixedClock,
    },
    entities::{self, case::CaseType},
    errors::Result,
    gateway::{PaymentGateway, SandboxGateway},
};
use chrono::{TimeZone, Utc};
use sea_orm::{DatabaseConnection, prelude::Decimal};
use std::sync::Arc;

/// Key id used by every test gateway.
pub const TEST_KEY_ID: &str = "rzp_test_key";
/// Key secret used by every test gateway.
pub const TEST_KEY_SECRET: &str = "rzp_test_secret";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Parses a rupee amount such as `"1350.50"`.
#[allow(clippy::unwrap_used)]
pub fn rupees(amount: &str) -> Decimal {
    amount.parse().unwrap()
}

/// Installs a test subscriber so `tracing` output shows with `--nocapture`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("legal_desk=debug")
        .with_test_writer()
        .try_init();
}

/// A context plus concrete handles to the collaborators tests steer.
pub struct TestHarness {
    /// Context passed to core operations
    pub ctx: AppContext,
    /// The gateway behind `ctx.gateway`
    pub gateway: Arc<SandboxGateway>,
    /// The clock behind `ctx.clock`
    pub clock: Arc<FixedClock>,
}

impl TestHarness {
    /// Fresh in-memory database, sandbox gateway with test keys, clock at 2026-03-01 09:00 UTC.
    pub async fn new() -> Result<Self> {
        init_test_tracing();
        let db = setup_test_db().await?;
        Ok(Self::build(
            db,
            GatewayCredentials::new(TEST_KEY_ID, TEST_KEY_SECRET),
        ))
    }

    /// Same as [`TestHarness::new`] but the gateway has no credentials.
    pub async fn without_credentials() -> Result<Self> {
        let db = setup_test_db().await?;
        Ok(Self::build(db, None))
    }

    #[allow(clippy::unwrap_used)]
    fn build(db: DatabaseConnection, credentials: Option<GatewayCredentials>) -> Self {
        let gateway = Arc::new(SandboxGateway::new(credentials));
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        let dyn_gateway: Arc<dyn PaymentGateway> = Arc::clone(&gateway) as _;
        let ctx = AppContext::new(db, dyn_gateway, &AppConfig::default())
            .with_clock(Arc::clone(&clock) as _);

        Self {
            ctx,
            gateway,
            clock,
        }
    }
}

/// Files a test case with sensible defaults.
///
/// # Defaults
/// * title: "Unpaid invoice"
/// * `case_type`: civil
/// * urgency: medium
pub async fn create_test_case(ctx: &AppContext, client_id: &str) -> Result<entities::case::Model> {
    case::create_case(
        ctx,
        &Actor::client(client_id),
        NewCase::new(
            "Unpaid invoice",
            "A supplier has not paid for goods delivered in January",
            CaseType::Civil,
        ),
    )
    .await
}

/// Files a test case and has `advocate_id` accept it.
pub async fn create_accepted_case(
    ctx: &AppContext,
    client_id: &str,
    advocate_id: &str,
    estimated_fee: Option<Decimal>,
) -> Result<entities::case::Model> {
    let filed = create_test_case(ctx, client_id).await?;
    case::accept_case(ctx, &Actor::advocate(advocate_id), filed.id, estimated_fee).await
}
