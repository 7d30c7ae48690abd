//! Authentication route handlers.
//!
//! Username/password login, signup and logout. A successful signup signs the
//! new customer in immediately.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::MessageQuery;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::StoreError;
use crate::services::auth::Registration;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Signup form data.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// Signup page template.
///
/// Re-rendered with the submitted values (minus passwords) when signup fails.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl SignupTemplate {
    fn with_error(form: SignupForm, error: String) -> Self {
        Self {
            current_user: None,
            error: Some(error),
            username: form.username,
            email: form.email,
            phone: form.phone,
            address: form.address,
        }
    }
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        current_user,
        error: query.error_message(),
        success: query.success_message(),
    }
}

/// Handle login form submission.
///
/// Admins land on the admin panel, customers on the catalog.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let user = match state
        .storefront()
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(StoreError::InvalidCredentials) => {
            tracing::info!(username = %form.username, "Login failed");
            return Ok(Redirect::to("/auth/login?error=invalid_credentials"));
        }
        Err(e) => return Err(e.into()),
    };

    let target = if user.role.is_admin() { "/admin" } else { "/home" };
    sign_in(&session, &user).await?;
    Ok(Redirect::to(target))
}

// =============================================================================
// Signup
// =============================================================================

/// Display the signup page.
pub async fn signup_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    SignupTemplate {
        current_user,
        error: query.error_message().map(str::to_owned),
        username: String::new(),
        email: String::new(),
        phone: String::new(),
        address: String::new(),
    }
}

/// Handle signup form submission.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    if form.password != form.password_confirm {
        let page = SignupTemplate::with_error(form, "Passwords do not match".to_string());
        return Ok((axum::http::StatusCode::BAD_REQUEST, page).into_response());
    }

    let registration = Registration {
        username: &form.username,
        password: &form.password,
        email: &form.email,
        phone: &form.phone,
        address: &form.address,
    };

    match state.storefront().signup(registration).await {
        Ok(user) => {
            sign_in(&session, &user).await?;
            Ok(Redirect::to("/home?success=signed_up").into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            if err.is_server_error() {
                return Err(err);
            }
            tracing::info!(username = %form.username, error = %err, "Signup rejected");
            let status = err.status();
            let page = SignupTemplate::with_error(form, err.client_message());
            Ok((status, page).into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/?success=logged_out")
}

async fn sign_in(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(&user.username));
    tracing::info!(user_id = %user.id, role = %user.role, "User signed in");
    Ok(())
}
