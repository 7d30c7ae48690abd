//! Authentication service.
//!
//! Username/password signup and login backed by Argon2id hashes.

mod error;
pub mod password;

pub use error::AuthError;
pub use password::{hash_password, validate_password, verify_password};

use std::sync::LazyLock;

use regex::Regex;
use sqlx::PgPool;

use pixel_vault_core::{Email, UserRole};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::user::User;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("Invalid regex"));

/// Registration input as submitted by the signup form.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with the given role.
    ///
    /// The username is checked up front for a friendly error; the unique
    /// constraint on `users.username` decides races between concurrent signups.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername`, `AuthError::WeakPassword` or
    /// `AuthError::InvalidEmail` for malformed input.
    /// Returns `AuthError::UsernameTaken` if the username is registered.
    pub async fn register(
        &self,
        registration: Registration<'_>,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let username = validate_username(registration.username)?;
        validate_password(registration.password)?;
        let email = Email::parse(registration.email)?;

        if self.users.username_exists(username).await? {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(registration.password)?;

        let user = self
            .users
            .create(&NewUser {
                username,
                password_hash: &password_hash,
                email: &email,
                phone: registration.phone.trim(),
                address: registration.address.trim(),
                role,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

/// Trim and check a username.
///
/// # Errors
///
/// Returns `AuthError::InvalidUsername` describing the first rule broken.
pub fn validate_username(username: &str) -> Result<&str, AuthError> {
    let username = username.trim();
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(AuthError::InvalidUsername(format!(
            "must be {MIN_USERNAME_LENGTH}-{MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AuthError::InvalidUsername(
            "may only contain letters, digits, '_', '.' and '-'".to_owned(),
        ));
    }
    Ok(username)
}
