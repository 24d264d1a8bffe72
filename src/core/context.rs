//! Collaborators shared by every core operation.

use super::analysis::CaseAnalyzer;
use super::clock::{Clock, SystemClock};
use super::numbering::{NumberGenerator, SequencedNumbers};
use crate::config::{AppConfig, BillingConfig, PaginationConfig};
use crate::gateway::PaymentGateway;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

/// Database handle, injectable clock and number generator, gateway adapter,
/// optional analyzer, and the settings the engines read.
///
/// Cheap to clone; every collaborator is reference counted.
#[derive(Clone)]
pub struct AppContext {
    /// Entity store
    pub database: DatabaseConnection,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Case, transaction, invoice and receipt numbers
    pub numbers: Arc<dyn NumberGenerator>,
    /// Payment processor
    pub gateway: Arc<dyn PaymentGateway>,
    /// AI enrichment, if configured
    pub analyzer: Option<Arc<dyn CaseAnalyzer>>,
    /// Platform fee and currency
    pub billing: BillingConfig,
    /// List paging limits
    pub pagination: PaginationConfig,
    /// Upper bound on one gateway order call
    pub gateway_timeout: Duration,
}

impl AppContext {
    /// Builds a context with the system clock, the default number generator
    /// and no analyzer.
    #[must_use]
    pub fn new(
        database: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        config: &AppConfig,
    ) -> Self {
        Self {
            database,
            clock: Arc::new(SystemClock),
            numbers: Arc::new(SequencedNumbers::new()),
            gateway,
            analyzer: None,
            billing: config.billing.clone(),
            pagination: config.pagination,
            gateway_timeout: config.gateway.timeout(),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the number generator.
    #[must_use]
    pub fn with_numbers(mut self, numbers: Arc<dyn NumberGenerator>) -> Self {
        self.numbers = numbers;
        self
    }

    /// Enables AI enrichment of new cases.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn CaseAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Current time from the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("provider", &self.gateway.provider())
            .field("analyzer", &self.analyzer.is_some())
            .field("billing", &self.billing)
            .field("pagination", &self.pagination)
            .field("gateway_timeout", &self.gateway_timeout)
            .finish_non_exhaustive()
    }
}
