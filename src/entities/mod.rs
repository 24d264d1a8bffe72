//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod case;
pub mod case_analysis;
pub mod case_document;
pub mod case_update;
pub mod payment;

// Re-export specific types to avoid conflicts
pub use case::{Column as CaseColumn, Entity as Case, Model as CaseModel};
pub use case_analysis::{
    Column as CaseAnalysisColumn, Entity as CaseAnalysis, Model as CaseAnalysisModel,
};
pub use case_document::{
    Column as CaseDocumentColumn, Entity as CaseDocument, Model as CaseDocumentModel,
};
pub use case_update::{Column as CaseUpdateColumn, Entity as CaseUpdate, Model as CaseUpdateModel};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
