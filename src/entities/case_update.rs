//! Case update entity - one entry of a case's append-only timeline.
//!
//! Entries are inserted together with the state change they describe and are
//! never modified or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Case timeline entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "case_updates")]
pub struct Model {
    /// Unique identifier, also the timeline order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Case this entry belongs to
    #[sea_orm(indexed)]
    pub case_id: i64,
    /// What happened
    pub message: String,
    /// Case status once the change was applied
    pub status: super::case::CaseStatus,
    /// Who caused the change (`None` for purely automatic entries)
    pub actor_id: Option<String>,
    /// Role of the author
    pub actor_kind: ActorKind,
    /// When the entry was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `CaseUpdate` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one case
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

/// Role of whoever authored a timeline entry or uploaded a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// The client who owns the case
    #[sea_orm(string_value = "client")]
    Client,
    /// The advocate assigned to (or deciding on) the case
    #[sea_orm(string_value = "advocate")]
    Advocate,
    /// The platform itself
    #[sea_orm(string_value = "system")]
    System,
}
