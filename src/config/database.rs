//! Database configuration for the entity store.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs, including the unique constraints on case numbers, transaction ids,
//! gateway order ids and invoice numbers.

use crate::entities::{Case, CaseAnalysis, CaseDocument, CaseUpdate, Payment};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use serde::Deserialize;
use tracing::info;

/// Location used when neither `config.toml` nor `DATABASE_URL` gives one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/legal_desk.sqlite?mode=rwc";

/// Entity store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SeaORM` connection URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

/// Establishes a connection to the configured database.
pub async fn create_connection(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    info!("Connecting to database");
    Database::connect(&config.url).await.map_err(Into::into)
}

async fn create_entity_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait + Copy,
{
    let builder = db.get_database_backend();

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }
    Ok(())
}

/// Creates all tables (and their secondary indexes) from the entity definitions.
///
/// Parent tables (`cases`) are created before the tables that reference them.
/// Existing tables are left untouched, so this is safe to run on every start.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_entity_table(db, &schema, Case).await?;
    create_entity_table(db, &schema, CaseUpdate).await?;
    create_entity_table(db, &schema, CaseDocument).await?;
    create_entity_table(db, &schema, CaseAnalysis).await?;
    create_entity_table(db, &schema, Payment).await?;

    info!("Tables created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CaseModel, PaymentModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<CaseModel> = Case::find().limit(1).all(&db).await?;
        let _: Vec<PaymentModel> = Payment::find().limit(1).all(&db).await?;
        let _ = CaseUpdate::find().limit(1).all(&db).await?;
        let _ = CaseDocument::find().limit(1).all(&db).await?;
        let _ = CaseAnalysis::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        let _: Vec<CaseModel> = Case::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_connection_from_config() -> Result<()> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        };
        let db = create_connection(&config).await?;
        create_tables(&db).await?;
        let _: Vec<CaseModel> = Case::find().limit(1).all(&db).await?;
        Ok(())
    }
}
