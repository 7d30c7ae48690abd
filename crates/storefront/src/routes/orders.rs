//! Purchase and order detail handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use pixel_vault_core::{GameId, OrderId};

use super::MessageQuery;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, OrderDetail};
use crate::services::StoreError;
use crate::state::AppState;

/// Buy button form.
#[derive(Debug, Deserialize)]
pub struct BuyForm {
    pub game_id: i32,
}

/// Order confirmation / detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "order.html")]
pub struct OrderTemplate {
    pub current_user: Option<CurrentUser>,
    pub order_id: OrderId,
    pub date_order: NaiveDate,
    pub buyer: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub lines: Vec<OrderDetail>,
    pub total: String,
    pub success: Option<&'static str>,
}

/// Handle the buy button.
///
/// Refused purchases go back to the game page with an error code.
pub async fn buy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<BuyForm>,
) -> Result<Redirect> {
    let game_id = GameId::new(form.game_id);
    let game_id_text = game_id.to_string();
    add_breadcrumb("order", "Purchase requested", Some(&[("game_id", &game_id_text)]));

    match state.storefront().purchase(&user, game_id).await {
        Ok(order_id) => Ok(Redirect::to(&format!("/orders/{order_id}?success=purchased"))),
        Err(StoreError::OutOfStock) => {
            tracing::info!(game_id = %game_id, user_id = %user.id, "Purchase refused: out of stock");
            Ok(Redirect::to(&format!("/game/{game_id}?error=out_of_stock")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Display an order owned by the signed-in user (any order for admins).
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Query(query): Query<MessageQuery>,
) -> Result<OrderTemplate> {
    let lines = state
        .storefront()
        .order_details(&user, OrderId::new(id))
        .await?;
    let first = lines.first().ok_or(StoreError::NotFound)?;

    Ok(OrderTemplate {
        order_id: first.order_id,
        date_order: first.date_order,
        buyer: first.username.clone(),
        email: first.email.to_string(),
        phone: first.phone.clone(),
        address: first.address.clone(),
        total: order_total(&lines),
        lines,
        current_user: Some(user),
        success: query.success_message(),
    })
}

fn order_total(lines: &[OrderDetail]) -> String {
    let total: Decimal = lines.iter().map(|line| line.price.amount()).sum();
    format!("${total:.2}")
}
