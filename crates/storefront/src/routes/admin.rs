//! Admin panel: catalog listing, add game with cover upload, delete game.
//!
//! Every handler takes `RequireAdmin`, so customers get 403 and anonymous
//! visitors are sent to the login page before any work happens.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use pixel_vault_core::{GameDraft, GameId};

use super::{MessageQuery, PlatformOption, platform_options};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{CurrentUser, GameWithStock};
use crate::services::{CoverUpload, StoreError};
use crate::state::AppState;

/// Multipart field carrying the cover image.
pub const COVER_FIELD: &str = "cover";

/// Admin panel template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub current_user: Option<CurrentUser>,
    pub games: Vec<GameWithStock>,
    pub platforms: Vec<PlatformOption>,
    /// Values to prefill the add form with after a rejected submission.
    pub draft: GameDraft,
    pub error: Option<String>,
    pub success: Option<&'static str>,
}

/// Display the catalog management page.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> Result<AdminTemplate> {
    let games = state.storefront().admin_list_games(&admin).await?;

    Ok(AdminTemplate {
        current_user: Some(admin),
        games,
        platforms: platform_options(None),
        draft: GameDraft::default(),
        error: query.error_message().map(str::to_owned),
        success: query.success_message(),
    })
}

/// Handle the add game form (multipart).
///
/// Rejected input re-renders the panel with the submitted values and a 400.
#[instrument(skip(state, admin, multipart), fields(admin = %admin.id))]
pub async fn add_game(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<Response> {
    let (draft, cover) = read_game_form(multipart).await?;
    let service = state.storefront();

    match service.admin_add_game(&admin, &draft, &cover).await {
        Ok(id) => {
            let id_text = id.to_string();
            add_breadcrumb("admin", "Game added", Some(&[("game_id", &id_text)]));
            Ok(Redirect::to("/admin?success=game_added").into_response())
        }
        Err(StoreError::Validation(message)) => {
            tracing::info!(error = %message, "Add game rejected");
            let games = service.admin_list_games(&admin).await?;
            let selected = draft.platform.parse().ok();
            let page = AdminTemplate {
                current_user: Some(admin),
                games,
                platforms: platform_options(selected),
                draft,
                error: Some(message),
                success: None,
            };
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle the delete button.
#[instrument(skip(state, admin), fields(admin = %admin.id))]
pub async fn delete_game(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let id = GameId::new(id);

    match state.storefront().admin_delete_game(&admin, id).await {
        Ok(()) => {
            let id_text = id.to_string();
            add_breadcrumb("admin", "Game deleted", Some(&[("game_id", &id_text)]));
            Ok(Redirect::to("/admin?success=game_deleted"))
        }
        Err(StoreError::NotFound) => Ok(Redirect::to("/admin?error=not_found")),
        Err(e) => Err(e.into()),
    }
}

/// Collect the text fields and the cover file from the add game form.
///
/// Unknown fields are ignored. A missing cover yields an empty upload, which
/// the cover store rejects.
async fn read_game_form(mut multipart: Multipart) -> Result<(GameDraft, CoverUpload)> {
    let mut draft = GameDraft::default();
    let mut cover = CoverUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == COVER_FIELD {
            cover.file_name = field.file_name().unwrap_or_default().to_owned();
            cover.bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?
                .to_vec();
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let slot = match name.as_str() {
            "name" => &mut draft.name,
            "details" => &mut draft.details,
            "developer" => &mut draft.developer,
            "publisher" => &mut draft.publisher,
            "platform" => &mut draft.platform,
            "price" => &mut draft.price,
            "stock" => &mut draft.stock,
            _ => continue,
        };
        *slot = value;
    }

    Ok((draft, cover))
}
