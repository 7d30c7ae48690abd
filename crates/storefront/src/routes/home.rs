//! Landing page and catalog listing handlers.

use std::collections::HashSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use pixel_vault_core::{GameId, Platform};

use super::{MessageQuery, PlatformOption, platform_options};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, GameWithStock};
use crate::state::AppState;

/// A catalog card.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub item: GameWithStock,
    /// The signed-in user already bought this game.
    pub owned: bool,
}

impl CatalogEntry {
    /// Annotate games with ownership.
    #[must_use]
    pub fn annotate(games: Vec<GameWithStock>, owned: &HashSet<GameId>) -> Vec<Self> {
        games
            .into_iter()
            .map(|item| Self {
                owned: owned.contains(&item.game.id),
                item,
            })
            .collect()
    }
}

/// Catalog query parameters.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub platform: Option<String>,
}

/// Platform picker form.
#[derive(Debug, Deserialize)]
pub struct FilterForm {
    #[serde(default)]
    pub platform: String,
}

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "landing.html")]
pub struct LandingTemplate {
    pub current_user: Option<CurrentUser>,
    pub platforms: Vec<PlatformOption>,
    pub success: Option<&'static str>,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog.html")]
pub struct CatalogTemplate {
    pub current_user: Option<CurrentUser>,
    pub heading: String,
    pub platforms: Vec<PlatformOption>,
    pub entries: Vec<CatalogEntry>,
}

/// Display the landing page.
pub async fn landing(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    LandingTemplate {
        current_user,
        platforms: platform_options(None),
        success: query.success_message(),
    }
}

/// Catalog home: PC games unless another platform is asked for.
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<CatalogTemplate> {
    let platform = parse_platform(query.platform.as_deref())?.unwrap_or(Platform::Pc);
    catalog(&state, current_user, Some(platform)).await
}

/// Catalog listing for all platforms or the one in `?platform=`.
pub async fn games(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<CatalogTemplate> {
    let platform = parse_platform(query.platform.as_deref())?;
    catalog(&state, current_user, platform).await
}

/// Handle the platform picker.
pub async fn filter(Form(form): Form<FilterForm>) -> Result<Redirect> {
    match parse_platform(Some(&form.platform))? {
        Some(platform) => Ok(Redirect::to(&format!("/games?platform={}", platform.code()))),
        None => Ok(Redirect::to("/games")),
    }
}

#[instrument(skip(state, current_user))]
async fn catalog(
    state: &AppState,
    current_user: Option<CurrentUser>,
    platform: Option<Platform>,
) -> Result<CatalogTemplate> {
    let service = state.storefront();
    let games = service.browse(platform).await?;
    let owned = service.owned_game_ids(current_user.as_ref()).await?;

    let heading = platform.map_or_else(
        || "All games".to_owned(),
        |p| format!("{} games", p.display_name()),
    );

    Ok(CatalogTemplate {
        current_user,
        heading,
        platforms: platform_options(platform),
        entries: CatalogEntry::annotate(games, &owned),
    })
}

/// `None` for a missing, blank or `all` value.
fn parse_platform(value: Option<&str>) -> Result<Option<Platform>> {
    match value.map(str::trim) {
        None | Some("" | "all" | "All") => Ok(None),
        Some(name) => name
            .parse::<Platform>()
            .map(Some)
            .map_err(|e| AppError::BadRequest(e.to_string())),
    }
}
