//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Username/password signup and login
//! - `covers` - Cover image storage on the local filesystem
//! - `storefront` - Browse, buy and catalog administration

pub mod auth;
pub mod covers;
pub mod storefront;

use thiserror::Error;

use pixel_vault_core::ValidationError;

use crate::db::{PurchaseError, RepositoryError};
use auth::AuthError;
use covers::CoverError;

pub use covers::{CoverStore, StagedCover};
pub use storefront::{CoverUpload, Profile, StorefrontService};

/// Outcome of a storefront operation that did not succeed.
///
/// Each variant maps to one HTTP status and one user-facing message in
/// `crate::error::AppError`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input was missing or malformed. The message is safe to show.
    #[error("{0}")]
    Validation(String),

    /// The game, order or user does not exist (or is not visible to the caller).
    #[error("not found")]
    NotFound,

    /// Signup with a username that is already registered.
    #[error("username already taken")]
    UsernameTaken,

    /// Purchase of a game with no remaining stock.
    #[error("out of stock")]
    OutOfStock,

    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The caller lacks the admin role.
    #[error("forbidden")]
    Forbidden,

    /// Persistence failed. Never shown to users.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Infrastructure failures behind [`StoreError::Storage`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Cover(CoverError),

    #[error("password hashing failed")]
    PasswordHash,
}

impl StoreError {
    /// Short machine-readable code, used in redirect query strings.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid",
            Self::NotFound => "not_found",
            Self::UsernameTaken => "username_taken",
            Self::OutOfStock => "out_of_stock",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Forbidden => "forbidden",
            Self::Storage(_) => "unavailable",
        }
    }
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Storage(StorageError::Repository(other)),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PurchaseError> for StoreError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::OutOfStock(_) => Self::OutOfStock,
            PurchaseError::NotFound(_) => Self::NotFound,
            PurchaseError::Database(e) => Self::Storage(StorageError::Repository(e.into())),
        }
    }
}

impl From<CoverError> for StoreError {
    fn from(err: CoverError) -> Self {
        if matches!(err, CoverError::Io(_)) {
            return Self::Storage(StorageError::Cover(err));
        }
        Self::Validation(err.to_string())
    }
}

impl From<AuthError> for StoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_) | AuthError::InvalidUsername(_) | AuthError::WeakPassword(_) => {
                Self::Validation(err.to_string())
            }
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::UsernameTaken => Self::UsernameTaken,
            AuthError::Repository(e) => e.into(),
            AuthError::PasswordHash => Self::Storage(StorageError::PasswordHash),
        }
    }
}

#[cfg(test)]
mod tests {
    use pixel_vault_core::GameId;

    use super::*;

    #[test]
    fn test_purchase_errors_map_to_outcomes() {
        let id = GameId::new(3);
        assert!(matches!(
            StoreError::from(PurchaseError::OutOfStock(id)),
            StoreError::OutOfStock
        ));
        assert!(matches!(
            StoreError::from(PurchaseError::NotFound(id)),
            StoreError::NotFound
        ));
        assert!(matches!(
            StoreError::from(PurchaseError::Database(sqlx::Error::RowNotFound)),
            StoreError::Storage(_)
        ));
    }

    #[test]
    fn test_auth_errors_map_to_outcomes() {
        assert!(matches!(
            StoreError::from(AuthError::UsernameTaken),
            StoreError::UsernameTaken
        ));
        assert!(matches!(
            StoreError::from(AuthError::InvalidCredentials),
            StoreError::InvalidCredentials
        ));
        let weak = StoreError::from(AuthError::WeakPassword("too short".to_owned()));
        assert!(matches!(weak, StoreError::Validation(ref msg) if msg.contains("too short")));
        assert!(matches!(
            StoreError::from(AuthError::Repository(RepositoryError::NotFound)),
            StoreError::NotFound
        ));
    }

    #[test]
    fn test_cover_errors_split_between_validation_and_storage() {
        assert!(matches!(
            StoreError::from(CoverError::NotJpeg),
            StoreError::Validation(_)
        ));
        let io = std::io::Error::other("disk full");
        assert!(matches!(
            StoreError::from(CoverError::Io(io)),
            StoreError::Storage(StorageError::Cover(_))
        ));
    }

    #[test]
    fn test_validation_message_is_preserved() {
        let err = StoreError::from(ValidationError::MissingField("name"));
        assert_eq!(err.to_string(), "name is required");
        assert_eq!(err.code(), "invalid");
    }
}
