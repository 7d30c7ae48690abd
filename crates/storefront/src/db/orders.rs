//! Order ledger: orders, order lines and the purchase transaction.

use std::collections::HashSet;

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::instrument;

use pixel_vault_core::{Email, GameId, OrderId, Platform, Price, UserId};

use super::{RepositoryError, violated_constraint};
use crate::models::{Game, OrderDetail, OrderSummary};

/// Foreign key from `order_items.game_id` to `games`.
const ORDER_ITEMS_GAME_FKEY: &str = "order_items_game_id_fkey";

/// Reasons a purchase can be refused.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// The game has no units left.
    #[error("game {0} is out of stock")]
    OutOfStock(GameId),

    /// The game (or its inventory record) does not exist.
    #[error("game {0} not found")]
    NotFound(GameId),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderDetailRow {
    order_id: i32,
    date_order: NaiveDate,
    user_id: i32,
    username: String,
    email: String,
    phone: String,
    address: String,
    game_id: i32,
    game_name: String,
    platform: Platform,
    price: Price,
}

impl TryFrom<OrderDetailRow> for OrderDetail {
    type Error = RepositoryError;

    fn try_from(row: OrderDetailRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            order_id: OrderId::new(row.order_id),
            date_order: row.date_order,
            user_id: UserId::new(row.user_id),
            username: row.username,
            email,
            phone: row.phone,
            address: row.address,
            game_id: GameId::new(row.game_id),
            game_name: row.game_name,
            platform: row.platform,
            price: row.price,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    order_id: i32,
    date_order: NaiveDate,
    game_id: i32,
    game_name: String,
    platform: Platform,
    price: Price,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            order_id: OrderId::new(row.order_id),
            date_order: row.date_order,
            game_id: GameId::new(row.game_id),
            game_name: row.game_name,
            platform: row.platform,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LibraryRow {
    game_id: i32,
    game_name: String,
    details: String,
    developer: String,
    publisher: String,
    platform: Platform,
    price: Price,
}

impl From<LibraryRow> for Game {
    fn from(row: LibraryRow) -> Self {
        Self {
            id: GameId::new(row.game_id),
            name: row.game_name,
            details: row.details,
            developer: row.developer,
            publisher: row.publisher,
            platform: row.platform,
            price: row.price,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for `user_orders` and `order_items`.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Buy one unit of a game for a user.
    ///
    /// Runs [`Self::record_purchase`] inside a transaction and commits only if
    /// every step succeeded.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::OutOfStock` or `PurchaseError::NotFound` when
    /// the purchase is refused, `PurchaseError::Database` on storage failure.
    /// No order, order line or stock change is persisted on error.
    #[instrument(skip(self), fields(user_id = %user_id, game_id = %game_id))]
    pub async fn purchase(&self, user_id: UserId, game_id: GameId) -> Result<OrderId, PurchaseError> {
        let mut tx = self.pool.begin().await?;
        let order_id = Self::record_purchase(&mut *tx, user_id, game_id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, "Purchase recorded");
        Ok(order_id)
    }

    /// The purchase steps, run on a connection that is already inside a
    /// transaction.
    ///
    /// Inserts the order and its line, then decrements stock with a
    /// conditional UPDATE. The row lock taken by that UPDATE serializes
    /// concurrent buyers of the same game; a buyer that waited re-checks
    /// `games_count > 0` against the committed value and affects no rows.
    ///
    /// The caller owns the transaction and must roll it back (or drop it) on
    /// error.
    ///
    /// # Errors
    ///
    /// Same as [`Self::purchase`].
    pub async fn record_purchase(
        conn: &mut PgConnection,
        user_id: UserId,
        game_id: GameId,
    ) -> Result<OrderId, PurchaseError> {
        let order_id: i32 = sqlx::query_scalar(
            "INSERT INTO user_orders (user_id, date_order) VALUES ($1, CURRENT_DATE) RETURNING order_id",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("INSERT INTO order_items (order_id, game_id) VALUES ($1, $2)")
            .bind(order_id)
            .bind(game_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                if violated_constraint(&e) == Some(ORDER_ITEMS_GAME_FKEY) {
                    return PurchaseError::NotFound(game_id);
                }
                PurchaseError::Database(e)
            })?;

        let decremented = sqlx::query(
            r"
            UPDATE game_inventory
            SET games_count = games_count - 1
            WHERE game_id = $1 AND games_count > 0
            ",
        )
        .bind(game_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if decremented == 0 {
            let has_inventory: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM game_inventory WHERE game_id = $1)",
            )
            .bind(game_id)
            .fetch_one(&mut *conn)
            .await?;

            return Err(if has_inventory {
                PurchaseError::OutOfStock(game_id)
            } else {
                PurchaseError::NotFound(game_id)
            });
        }

        Ok(OrderId::new(order_id))
    }

    /// Denormalized rows for one order: order, buyer and each game bought.
    ///
    /// An empty result means the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn details(&self, order_id: OrderId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderDetailRow>(
            r"
            SELECT o.order_id, o.date_order,
                   u.user_id, u.username, u.email, u.phone, u.address,
                   g.game_id, g.game_name, g.platform, g.price
            FROM user_orders o
            JOIN users u ON u.user_id = o.user_id
            JOIN order_items i ON i.order_id = o.order_id
            JOIN games g ON g.game_id = i.game_id
            WHERE o.order_id = $1
            ORDER BY g.game_id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderDetail::try_from).collect()
    }

    /// A user's order history, newest first, one row per order line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.order_id, o.date_order, g.game_id, g.game_name, g.platform, g.price
            FROM user_orders o
            JOIN order_items i ON i.order_id = o.order_id
            JOIN games g ON g.game_id = i.game_id
            WHERE o.user_id = $1
            ORDER BY o.order_id DESC, g.game_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Games a user has bought at least once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owned_games(&self, user_id: UserId) -> Result<Vec<Game>, RepositoryError> {
        let rows = sqlx::query_as::<_, LibraryRow>(
            r"
            SELECT DISTINCT g.game_id, g.game_name, g.details, g.developer,
                   g.publisher, g.platform, g.price
            FROM user_orders o
            JOIN order_items i ON i.order_id = o.order_id
            JOIN games g ON g.game_id = i.game_id
            WHERE o.user_id = $1
            ORDER BY g.game_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Game::from).collect())
    }

    /// IDs of the games a user owns, for "in your library" badges.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owned_game_ids(&self, user_id: UserId) -> Result<HashSet<GameId>, RepositoryError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            r"
            SELECT DISTINCT i.game_id
            FROM user_orders o
            JOIN order_items i ON i.order_id = o.order_id
            WHERE o.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().map(GameId::new).collect())
    }
}
