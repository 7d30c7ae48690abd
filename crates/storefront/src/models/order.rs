//! Order ledger domain types.

use chrono::NaiveDate;

use pixel_vault_core::{Email, GameId, OrderId, Platform, Price, UserId};

/// One denormalized line of an order: the order, its buyer and the game bought.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetail {
    pub order_id: OrderId,
    pub date_order: NaiveDate,
    pub user_id: UserId,
    pub username: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub game_id: GameId,
    pub game_name: String,
    pub platform: Platform,
    pub price: Price,
}

/// Summary row for a user's order history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub date_order: NaiveDate,
    pub game_id: GameId,
    pub game_name: String,
    pub platform: Platform,
    pub price: Price,
}
