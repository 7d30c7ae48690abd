//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::StoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A storefront operation did not succeed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error is the server's fault.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Storage(_)) | Self::Session(_) | Self::Template(_)
        )
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) => match err {
                StoreError::Validation(_) => StatusCode::BAD_REQUEST,
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::UsernameTaken | StoreError::OutOfStock => StatusCode::CONFLICT,
                StoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                StoreError::Forbidden => StatusCode::FORBIDDEN,
                StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Never includes storage details.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Store(err) => match err {
                StoreError::Validation(msg) => msg.clone(),
                StoreError::NotFound => "Not found".to_string(),
                StoreError::UsernameTaken => "That username is already taken".to_string(),
                StoreError::OutOfStock => "Sorry, this game is out of stock".to_string(),
                StoreError::InvalidCredentials => "Invalid username or password".to_string(),
                StoreError::Forbidden => "Admins only".to_string(),
                StoreError::Storage(_) => "Internal server error".to_string(),
            },
            Self::Session(_) | Self::Template(_) => "Internal server error".to_string(),
            Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.client_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("order", "Purchased game", Some(&[("game_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::db::RepositoryError;
    use crate::services::StorageError;

    async fn body_of(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_bad_request_is_client_error() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert!(!err.is_server_error());
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Bad request: invalid input");
    }

    #[test]
    fn test_store_error_status_codes() {
        fn status(err: StoreError) -> StatusCode {
            AppError::from(err).status()
        }

        assert_eq!(status(StoreError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(StoreError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(StoreError::UsernameTaken), StatusCode::CONFLICT);
        assert_eq!(status(StoreError::OutOfStock), StatusCode::CONFLICT);
        assert_eq!(status(StoreError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(StoreError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status(StoreError::Storage(StorageError::PasswordHash)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_storage_errors_are_not_exposed() {
        let err = AppError::from(StoreError::Storage(StorageError::Repository(
            RepositoryError::DataCorruption("secret column detail".to_string()),
        )));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_message_is_shown() {
        let err = AppError::from(StoreError::Validation("price must be a number".to_string()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "price must be a number");
    }
}
