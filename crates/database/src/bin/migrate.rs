use anyhow::{anyhow, Context, Result};
use database::Database;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Initialize tracing for CLI output
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!("Starting database migration");

    // Load database config from environment
    let db_config = config::DatabaseConfig::from_env()
        .map_err(|e| anyhow!("Failed to load database config: {e}"))?;
    info!("Database configuration loaded");

    // Connect to database
    let database = Database::from_config(&db_config)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    // Run migrations
    database
        .run_migrations()
        .await
        .context("Failed to run migrations")?;
    info!("Database migrations completed");

    Ok(())
}
