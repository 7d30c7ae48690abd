//! Admin account management commands.
//!
//! Signup on the site only ever creates customers, so this is the way to get
//! an account that can reach `/admin`.
//!
//! # Usage
//!
//! ```bash
//! PIXEL_VAULT_ADMIN_PASSWORD='...' pv-cli admin create -u admin -e admin@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `PIXEL_VAULT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `PIXEL_VAULT_ADMIN_PASSWORD` - Password for the new account

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use pixel_vault_core::{UserId, UserRole};
use pixel_vault_storefront::services::auth::{AuthError, AuthService, Registration};

use super::ConnectError;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Could not reach the database.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The account was rejected (taken username, weak password, bad email).
    #[error("Could not create admin: {0}")]
    Auth(#[from] AuthError),
}

/// Details of the admin account to create.
pub struct NewAdmin<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
    pub password: &'a SecretString,
}

/// Create a new admin account.
///
/// Applies the same username, email and password rules as signup.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the account is rejected.
pub async fn create_user(account: NewAdmin<'_>) -> Result<UserId, AdminError> {
    let pool = super::connect().await?;

    tracing::info!("Creating admin user: {}", account.username);

    let registration = Registration {
        username: account.username,
        password: account.password.expose_secret(),
        email: account.email,
        phone: account.phone,
        address: account.address,
    };
    let user = AuthService::new(&pool)
        .register(registration, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}, Email: {}",
        user.id,
        user.username,
        user.email
    );

    Ok(user.id)
}
