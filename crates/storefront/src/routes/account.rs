//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::Profile;
use crate::state::AppState;

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub current_user: Option<CurrentUser>,
    pub profile: Profile,
}

/// Display account details, the game library and the order history.
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ProfileTemplate> {
    let profile = state.storefront().profile(&user).await?;

    Ok(ProfileTemplate {
        current_user: Some(user),
        profile,
    })
}
