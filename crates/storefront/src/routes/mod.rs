//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Landing page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//!
//! # Catalog
//! GET  /home                      - Catalog, PC games by default
//! GET  /games?platform=           - Catalog, all games or one platform
//! POST /filter                    - Platform picker (redirects to /games)
//! GET  /game/{id}                 - Game detail
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! GET  /auth/signup               - Signup page
//! POST /auth/signup               - Signup action (signs the user in)
//! POST /auth/logout               - Logout action
//!
//! # Orders (requires auth)
//! POST /buy                       - Purchase one unit of a game
//! GET  /orders/{id}               - Order details
//! GET  /profile                   - Account, library and order history
//!
//! # Admin (requires admin role)
//! GET  /admin                     - Catalog management
//! POST /admin/games               - Add a game (multipart, with cover image)
//! POST /admin/games/{id}/delete   - Delete a game
//!
//! # Static
//! GET  /static/*                  - CSS and assets
//! GET  /covers/{key}.jpg          - Cover images
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod games;
pub mod health;
pub mod home;
pub mod orders;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};

use pixel_vault_core::Platform;

use crate::middleware::{
    auth_rate_limiter, request_id_middleware, security_headers_middleware, write_rate_limiter,
};
use crate::state::AppState;

/// Directory holding CSS and other static assets.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Room for the text fields that travel with a cover upload.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

// =============================================================================
// Shared view helpers
// =============================================================================

/// Query parameters for error/success display after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl MessageQuery {
    /// User-facing text for the `error` code, if recognised.
    #[must_use]
    pub fn error_message(&self) -> Option<&'static str> {
        self.error.as_deref().and_then(error_text)
    }

    /// User-facing text for the `success` code, if recognised.
    #[must_use]
    pub fn success_message(&self) -> Option<&'static str> {
        self.success.as_deref().and_then(success_text)
    }
}

fn error_text(code: &str) -> Option<&'static str> {
    Some(match code {
        "invalid_credentials" => "Invalid username or password.",
        "out_of_stock" => "Sorry, this game is out of stock.",
        "not_found" => "That game no longer exists.",
        "forbidden" => "Admins only.",
        "session" => "Your session could not be saved. Please try again.",
        _ => return None,
    })
}

fn success_text(code: &str) -> Option<&'static str> {
    Some(match code {
        "purchased" => "Thanks for your purchase!",
        "signed_up" => "Welcome to Pixel Vault!",
        "logged_out" => "You have been signed out.",
        "game_added" => "Game added to the catalog.",
        "game_deleted" => "Game deleted.",
        _ => return None,
    })
}

/// One entry of the platform picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOption {
    pub code: &'static str,
    pub name: &'static str,
    pub selected: bool,
}

/// The platform picker with `selected` marked.
#[must_use]
pub fn platform_options(selected: Option<Platform>) -> Vec<PlatformOption> {
    Platform::ALL
        .iter()
        .map(|&p| PlatformOption {
            code: p.code(),
            name: p.display_name(),
            selected: selected == Some(p),
        })
        .collect()
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/signup",
            get(auth::signup_page).merge(post(auth::signup).layer(limiter)),
        )
        .route("/logout", post(auth::logout))
}

/// Create the admin routes router.
pub fn admin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route(
            "/games",
            post(admin::add_game)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/games/{id}/delete", post(admin::delete_game))
        .route_layer(write_rate_limiter())
}

/// Create all page routes for the storefront.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing))
        .route("/home", get(home::home))
        .route("/games", get(home::games))
        .route("/filter", post(home::filter))
        .route("/game/{id}", get(games::show))
        .route("/buy", post(orders::buy).layer(write_rate_limiter()))
        .route("/orders/{id}", get(orders::show))
        .route("/profile", get(account::profile))
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes(max_upload_bytes))
}

/// Build the complete application: pages, health checks, static files and
/// the middleware stack.
///
/// The session layer is passed in so tests can use an in-memory store.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let max_upload_bytes = state.config().max_upload_bytes;
    let covers_dir = state.covers().root().to_path_buf();

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes(max_upload_bytes))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .nest_service("/covers", ServeDir::new(covers_dir))
        .layer(sessions)
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
