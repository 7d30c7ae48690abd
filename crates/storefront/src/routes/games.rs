//! Game detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};

use pixel_vault_core::GameId;

use super::MessageQuery;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, GameWithStock};
use crate::state::AppState;

/// Game detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "game.html")]
pub struct GameTemplate {
    pub current_user: Option<CurrentUser>,
    pub item: GameWithStock,
    pub owned: bool,
    pub error: Option<&'static str>,
}

/// Display one game with its stock and a buy button.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(id): Path<i32>,
    Query(query): Query<MessageQuery>,
) -> Result<GameTemplate> {
    let service = state.storefront();
    let id = GameId::new(id);
    let item = service.game_detail(id).await?;
    let owned = service
        .owned_game_ids(current_user.as_ref())
        .await?
        .contains(&id);

    Ok(GameTemplate {
        current_user,
        item,
        owned,
        error: query.error_message(),
    })
}
