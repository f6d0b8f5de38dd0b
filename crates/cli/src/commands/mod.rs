//! CLI command implementations.

pub mod employee;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Variables checked, in order, for the database connection string.
const DATABASE_URL_VARS: [&str; 2] = ["PORTAL_DATABASE_URL", "DATABASE_URL"];

/// Errors from connecting to the portal database.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Missing environment variable: PORTAL_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read the database URL from the environment (and `.env`).
fn database_url() -> Result<SecretString, ConnectError> {
    dotenvy::dotenv().ok();

    DATABASE_URL_VARS
        .into_iter()
        .find_map(|key| std::env::var(key).ok())
        .map(SecretString::from)
        .ok_or(ConnectError::MissingDatabaseUrl)
}

/// Connect to the portal database.
pub async fn connect() -> Result<PgPool, ConnectError> {
    let url = database_url()?;
    tracing::info!("Connecting to portal database...");
    Ok(kindred_portal::db::create_pool(&url).await?)
}
