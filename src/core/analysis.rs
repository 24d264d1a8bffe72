//! AI enrichment of newly filed cases.
//!
//! Enrichment is fire-and-forget: [`spawn_case_enrichment`] dispatches a
//! detached tokio task and returns immediately. The creator of the case never
//! awaits the task, and a failing analyzer only produces a `warn!` log line.

use super::clock::Clock;
use super::context::AppContext;
use crate::entities::case::Urgency;
use crate::entities::{CaseAnalysis as CaseAnalysisEntity, CaseAnalysisColumn, case_analysis};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Structured analysis of a case description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseInsight {
    /// Primary legal category
    pub category: String,
    /// Short plain-language summary
    pub summary: String,
    /// Urgency the analyzer would assign, as free text
    #[serde(alias = "urgencyLevel")]
    pub suggested_urgency: Option<String>,
    /// Statutes and sections that apply
    pub relevant_laws: Vec<String>,
    /// Recommended actions for the client
    pub next_steps: Vec<String>,
    /// Authorities the client could approach
    pub authorities: Vec<String>,
}

impl CaseInsight {
    /// Maps the free-text urgency onto [`Urgency`], ignoring unknown values.
    #[must_use]
    pub fn urgency(&self) -> Option<Urgency> {
        match self.suggested_urgency.as_deref()?.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            "critical" => Some(Urgency::Critical),
            _ => None,
        }
    }
}

/// Produces an analysis for a case description.
#[async_trait]
pub trait CaseAnalyzer: Send + Sync {
    /// Analyzes `description`.
    async fn analyze(&self, description: &str) -> Result<CaseInsight>;
}

/// Extracts the JSON object from a language-model reply.
///
/// Models often wrap the object in prose or code fences; everything outside the
/// outermost braces is discarded.
pub fn parse_model_reply(reply: &str) -> Result<CaseInsight> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            let insight: CaseInsight = serde_json::from_str(&reply[start..=end])?;
            if insight.category.trim().is_empty() {
                return Err(Error::invalid("Analyzer reply has no category"));
            }
            Ok(insight)
        }
        _ => Err(Error::invalid("Analyzer reply did not contain a JSON object")),
    }
}

/// Runs the analyzer and stores its result for `case_id`.
pub async fn enrich_case<C: ConnectionTrait>(
    db: &C,
    analyzer: &dyn CaseAnalyzer,
    clock: &dyn Clock,
    case_id: i64,
    description: &str,
) -> Result<case_analysis::Model> {
    let insight = analyzer.analyze(description).await?;

    let analysis = case_analysis::ActiveModel {
        case_id: Set(case_id),
        category: Set(insight.category.clone()),
        summary: Set(insight.summary.clone()),
        suggested_urgency: Set(insight.urgency()),
        relevant_laws: Set(serde_json::to_value(&insight.relevant_laws)?),
        next_steps: Set(serde_json::to_value(&insight.next_steps)?),
        authorities: Set(serde_json::to_value(&insight.authorities)?),
        analyzed_at: Set(clock.now()),
        ..Default::default()
    };

    let stored = analysis.insert(db).await?;
    info!(case_id, category = %stored.category, "Case analysis stored");
    Ok(stored)
}

/// Dispatches enrichment of a freshly created case on a detached task.
///
/// Returns `None` when no analyzer is configured. The handle is only useful to
/// tests; callers on the request path drop it.
pub fn spawn_case_enrichment(
    ctx: &AppContext,
    case_id: i64,
    description: String,
) -> Option<JoinHandle<()>> {
    let analyzer = Arc::clone(ctx.analyzer.as_ref()?);
    let db = ctx.database.clone();
    let clock = Arc::clone(&ctx.clock);

    Some(tokio::spawn(async move {
        match enrich_case(&db, analyzer.as_ref(), clock.as_ref(), case_id, &description).await {
            Ok(_) => debug!(case_id, "Case enrichment finished"),
            Err(e) => warn!(
                case_id,
                error = %e,
                "Case enrichment failed, continuing without analysis"
            ),
        }
    }))
}

/// Loads the stored analysis of a case, if any.
pub async fn get_analysis<C: ConnectionTrait>(
    db: &C,
    case_id: i64,
) -> Result<Option<case_analysis::Model>> {
    CaseAnalysisEntity::find()
        .filter(CaseAnalysisColumn::CaseId.eq(case_id))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::actor::Actor;
    use crate::core::case::{self, NewCase};
    use crate::entities::case::CaseType;
    use crate::test_utils::*;

    struct CannedAnalyzer;

    #[async_trait]
    impl CaseAnalyzer for CannedAnalyzer {
        async fn analyze(&self, _description: &str) -> Result<CaseInsight> {
            parse_model_reply(
                r#"Here is the analysis:
                ```json
                {"category":"property","summary":"Deposit withheld by landlord",
                 "urgencyLevel":"High","relevantLaws":["Transfer of Property Act, s.108"],
                 "nextSteps":["Send legal notice"],"authorities":["Rent Controller"]}
                ```"#,
            )
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl CaseAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _description: &str) -> Result<CaseInsight> {
            Err(Error::unavailable("model quota exhausted"))
        }
    }

    fn rent_dispute() -> NewCase {
        NewCase::new(
            "Rent dispute",
            "Landlord is refusing to return my security deposit",
            CaseType::Property,
        )
    }

    #[test]
    fn test_parse_model_reply() {
        let insight = parse_model_reply(
            "```json\n{\"category\":\"civil\",\"summary\":\"s\",\
             \"urgencyLevel\":\"critical\"}\n```",
        )
        .unwrap();
        assert_eq!(insight.category, "civil");
        assert_eq!(insight.urgency(), Some(Urgency::Critical));
        assert!(insight.relevant_laws.is_empty());

        assert!(parse_model_reply("no json here").is_err());
        assert!(parse_model_reply("{\"summary\":\"missing category\"}").is_err());
        assert!(parse_model_reply("{not json}").is_err());
    }

    #[test]
    fn test_unknown_urgency_is_ignored() {
        let insight = CaseInsight {
            suggested_urgency: Some("whenever".to_string()),
            ..CaseInsight::default()
        };
        assert_eq!(insight.urgency(), None);
    }

    #[tokio::test]
    async fn test_enrich_case_stores_analysis() -> Result<()> {
        let harness = TestHarness::new().await?;
        let created =
            case::create_case(&harness.ctx, &Actor::client("client-1"), rent_dispute()).await?;

        let stored = enrich_case(
            &harness.ctx.database,
            &CannedAnalyzer,
            harness.clock.as_ref(),
            created.id,
            &created.description,
        )
        .await?;

        assert_eq!(stored.category, "property");
        assert_eq!(stored.suggested_urgency, Some(Urgency::High));
        assert_eq!(
            stored.next_steps,
            serde_json::json!(["Send legal notice"])
        );
        assert_eq!(stored.analyzed_at, harness.clock.now());

        let loaded = get_analysis(&harness.ctx.database, created.id).await?;
        assert_eq!(loaded, Some(stored));
        Ok(())
    }

    #[tokio::test]
    async fn test_spawned_enrichment_attaches_analysis() -> Result<()> {
        let harness = TestHarness::new().await?;
        let ctx = harness.ctx.clone().with_analyzer(Arc::new(CannedAnalyzer));
        let created = case::create_case(&ctx, &Actor::client("client-1"), rent_dispute()).await?;

        let mut analysis = None;
        for _ in 0..50 {
            analysis = get_analysis(&ctx.database, created.id).await?;
            if analysis.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(analysis.unwrap().category, "property");
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_analyzer_never_fails_case_creation() -> Result<()> {
        let harness = TestHarness::new().await?;
        let ctx = harness.ctx.clone().with_analyzer(Arc::new(FailingAnalyzer));

        let created = case::create_case(&ctx, &Actor::client("client-1"), rent_dispute()).await?;
        let handle = spawn_case_enrichment(&ctx, created.id, created.description.clone()).unwrap();
        handle.await.unwrap();

        assert!(get_analysis(&ctx.database, created.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_no_analyzer_spawns_nothing() -> Result<()> {
        let harness = TestHarness::new().await?;
        assert!(spawn_case_enrichment(&harness.ctx, 1, "text".to_string()).is_none());
        Ok(())
    }
}
