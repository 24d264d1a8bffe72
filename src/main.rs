use dotenvy::dotenv;
use legal_desk::config::{self, database};
use legal_desk::core::AppContext;
use legal_desk::entities::{Case, Payment};
use legal_desk::errors::Result;
use legal_desk::gateway::SandboxGateway;
use sea_orm::{EntityTrait, PaginatorTrait};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection(&app_config.database)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Wire the core
    if app_config.gateway.credentials.is_none() {
        warn!("GATEWAY_KEY_ID / GATEWAY_KEY_SECRET not set; payments will be unavailable");
    }
    let gateway = Arc::new(SandboxGateway::from_config(&app_config.gateway));
    let ctx = AppContext::new(db, gateway, &app_config);

    let cases = Case::find().count(&ctx.database).await?;
    let payments = Payment::find().count(&ctx.database).await?;
    info!(?ctx, cases, payments, "Legal desk core ready");

    Ok(())
}
