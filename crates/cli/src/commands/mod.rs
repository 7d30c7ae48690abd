//! Command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Primary database URL variable, shared with the storefront.
pub const DATABASE_URL_VAR: &str = "PIXEL_VAULT_DATABASE_URL";

/// Errors raised while opening the database.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Neither database URL variable is set.
    #[error("Missing environment variable: {DATABASE_URL_VAR} (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Database URL from `PIXEL_VAULT_DATABASE_URL`, falling back to `DATABASE_URL`.
#[must_use]
pub fn database_url() -> Option<SecretString> {
    std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Open a pool on the storefront database.
///
/// # Errors
///
/// Returns an error if no URL is configured or the connection fails.
pub async fn connect() -> Result<PgPool, ConnectError> {
    let url = database_url().ok_or(ConnectError::MissingDatabaseUrl)?;
    tracing::info!("Connecting to database...");
    Ok(pixel_vault_storefront::db::create_pool(&url).await?)
}
