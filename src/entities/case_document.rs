//! Case document entity - a reference to a file attached to a case.
//!
//! Only the stored location is kept; uploading the bytes is handled elsewhere.

use super::case_update::ActorKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Case document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "case_documents")]
pub struct Model {
    /// Unique identifier, also the upload order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Case the document is attached to
    #[sea_orm(indexed)]
    pub case_id: i64,
    /// Where the file is stored
    pub url: String,
    /// What the document is
    pub kind: DocumentKind,
    /// Original file name
    pub filename: String,
    /// Optional note from the uploader
    pub description: Option<String>,
    /// Client or advocate who attached it
    pub uploaded_by: String,
    /// Role of the uploader
    pub uploader_kind: ActorKind,
    /// When it was attached
    pub uploaded_at: DateTimeUtc,
}

/// Defines relationships between `CaseDocument` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each document belongs to one case
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

/// Classification of an attached document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Photos, recordings, receipts
    #[sea_orm(string_value = "evidence")]
    Evidence,
    /// Contracts, notices, petitions
    #[sea_orm(string_value = "legal_document")]
    LegalDocument,
    /// Identity proof
    #[sea_orm(string_value = "id_proof")]
    IdProof,
    /// Orders issued by a court
    #[sea_orm(string_value = "court_order")]
    CourtOrder,
    /// Anything else
    #[default]
    #[sea_orm(string_value = "other")]
    Other,
}
