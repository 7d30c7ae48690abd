//! Catalog repository: games and their inventory records.

use sqlx::PgPool;
use tracing::instrument;

use pixel_vault_core::{GameId, NewGame, Platform, Price, Stock};

use super::RepositoryError;
use crate::models::{Game, GameWithStock};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct GameRow {
    game_id: i32,
    game_name: String,
    details: String,
    developer: String,
    publisher: String,
    platform: Platform,
    price: Price,
    games_count: i32,
}

impl TryFrom<GameRow> for GameWithStock {
    type Error = RepositoryError;

    fn try_from(row: GameRow) -> Result<Self, Self::Error> {
        let stock = Stock::new(row.games_count).map_err(|e| {
            RepositoryError::DataCorruption(format!("game {}: {e}", row.game_id))
        })?;
        Ok(Self {
            game: Game {
                id: GameId::new(row.game_id),
                name: row.game_name,
                details: row.details,
                developer: row.developer,
                publisher: row.publisher,
                platform: row.platform,
                price: row.price,
            },
            stock,
        })
    }
}

const SELECT_GAMES: &str = r"
    SELECT g.game_id, g.game_name, g.details, g.developer, g.publisher,
           g.platform, g.price, COALESCE(i.games_count, 0) AS games_count
    FROM games g
    LEFT JOIN game_inventory i ON i.game_id = g.game_id
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for the catalog (`games` + `game_inventory`).
pub struct GameRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GameRepository<'a> {
    /// Create a new game repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List games with their stock, optionally restricted to one platform.
    ///
    /// Ordered by `game_id` so the catalog renders in a stable order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        platform: Option<Platform>,
    ) -> Result<Vec<GameWithStock>, RepositoryError> {
        let sql = format!(
            "{SELECT_GAMES} WHERE ($1::text IS NULL OR g.platform = $1) ORDER BY g.game_id"
        );
        let rows = sqlx::query_as::<_, GameRow>(&sql)
            .bind(platform.map(Platform::code))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(GameWithStock::try_from).collect()
    }

    /// Get a single game with its stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: GameId) -> Result<Option<GameWithStock>, RepositoryError> {
        let sql = format!("{SELECT_GAMES} WHERE g.game_id = $1");
        let row = sqlx::query_as::<_, GameRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(GameWithStock::try_from).transpose()
    }

    /// Insert a game and its inventory record in one transaction.
    ///
    /// The game must already have passed [`NewGame::validate`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either insert fails; nothing is
    /// persisted in that case.
    #[instrument(skip(self, game), fields(name = %game.name, platform = %game.platform))]
    pub async fn create(&self, game: &NewGame, stock: Stock) -> Result<GameId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO games (game_name, details, developer, publisher, platform, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING game_id
            ",
        )
        .bind(&game.name)
        .bind(&game.details)
        .bind(&game.developer)
        .bind(&game.publisher)
        .bind(game.platform)
        .bind(game.price)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO game_inventory (game_id, games_count) VALUES ($1, $2)")
            .bind(id)
            .bind(stock.count())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(game_id = id, stock = stock.count(), "Game added to catalog");
        Ok(GameId::new(id))
    }

    /// Delete a game together with everything that references it.
    ///
    /// In a single transaction: removes the order lines for the game, removes
    /// orders left without any line, removes the inventory record and finally
    /// the game. Order history for the game is lost.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the game does not exist.
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back in both cases.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: GameId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the game first so in-flight purchases of it finish before the
        // cascade and later ones fail their foreign key check.
        let locked: Option<i32> =
            sqlx::query_scalar("SELECT game_id FROM games WHERE game_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let order_ids: Vec<i32> = sqlx::query_scalar(
            "DELETE FROM order_items WHERE game_id = $1 RETURNING order_id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let orders_removed = sqlx::query(
            r"
            DELETE FROM user_orders o
            WHERE o.order_id = ANY($1)
              AND NOT EXISTS (SELECT 1 FROM order_items i WHERE i.order_id = o.order_id)
            ",
        )
        .bind(order_ids.as_slice())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM game_inventory WHERE game_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM games WHERE game_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        tracing::info!(
            game_id = %id,
            lines_removed = order_ids.len(),
            orders_removed,
            "Game deleted from catalog"
        );
        Ok(())
    }
}
