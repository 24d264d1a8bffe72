//! Case analysis entity - the automated legal analysis attached to a case.
//!
//! At most one analysis exists per case. It is written asynchronously after the
//! case is created and may be missing if the analyzer failed or is not configured.

use super::case::Urgency;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Case analysis database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "case_analyses")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Case that was analyzed
    #[sea_orm(unique)]
    pub case_id: i64,
    /// Primary legal category suggested by the analyzer
    pub category: String,
    /// Short plain-language summary
    pub summary: String,
    /// Urgency the analyzer would assign
    pub suggested_urgency: Option<Urgency>,
    /// JSON array of statutes and sections
    pub relevant_laws: Json,
    /// JSON array of recommended actions
    pub next_steps: Json,
    /// JSON array of authorities to approach
    pub authorities: Json,
    /// When the analysis was stored
    pub analyzed_at: DateTimeUtc,
}

/// Defines relationships between `CaseAnalysis` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each analysis belongs to one case
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
