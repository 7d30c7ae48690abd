//! Storefront orchestration: browse, buy and catalog administration.
//!
//! Handlers call into [`StorefrontService`] rather than the repositories so
//! the two authorization rules (signed in, admin role) and the error mapping
//! to [`StoreError`] live in one place.

use std::collections::HashSet;

use sqlx::PgPool;
use tracing::instrument;

use pixel_vault_core::{GameDraft, GameId, OrderId, Platform, UserRole};

use super::auth::{AuthService, Registration};
use super::covers::CoverStore;
use super::StoreError;
use crate::db::{GameRepository, OrderRepository, UserRepository};
use crate::models::{CurrentUser, Game, GameWithStock, OrderDetail, OrderSummary, User};

/// An uploaded cover image.
#[derive(Debug, Clone, Default)]
pub struct CoverUpload {
    /// Client-supplied file name.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Everything shown on the profile page.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub library: Vec<Game>,
    pub orders: Vec<OrderSummary>,
}

/// Storefront use cases over the catalog, order ledger and users.
pub struct StorefrontService<'a> {
    pool: &'a PgPool,
    covers: &'a CoverStore,
}

impl<'a> StorefrontService<'a> {
    /// Create a new storefront service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, covers: &'a CoverStore) -> Self {
        Self { pool, covers }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Games with stock, optionally for one platform.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the catalog cannot be read.
    pub async fn browse(&self, platform: Option<Platform>) -> Result<Vec<GameWithStock>, StoreError> {
        Ok(GameRepository::new(self.pool).list(platform).await?)
    }

    /// One game with stock.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the game does not exist.
    pub async fn game_detail(&self, id: GameId) -> Result<GameWithStock, StoreError> {
        GameRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Register a customer account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for malformed input and
    /// `StoreError::UsernameTaken` if the username is registered.
    pub async fn signup(&self, registration: Registration<'_>) -> Result<User, StoreError> {
        Ok(AuthService::new(self.pool)
            .register(registration, UserRole::Customer)
            .await?)
    }

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidCredentials` on any mismatch.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, StoreError> {
        Ok(AuthService::new(self.pool).login(username, password).await?)
    }

    /// Account details, owned games and order history.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account no longer exists.
    pub async fn profile(&self, user: &CurrentUser) -> Result<Profile, StoreError> {
        let account = UserRepository::new(self.pool)
            .get_by_id(user.id)
            .await?
            .ok_or(StoreError::NotFound)?;
        let orders = OrderRepository::new(self.pool);

        Ok(Profile {
            user: account,
            library: orders.owned_games(user.id).await?,
            orders: orders.for_user(user.id).await?,
        })
    }

    /// IDs of games the signed-in user owns; empty for anonymous visitors.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the ledger cannot be read.
    pub async fn owned_game_ids(
        &self,
        user: Option<&CurrentUser>,
    ) -> Result<HashSet<GameId>, StoreError> {
        match user {
            Some(user) => Ok(OrderRepository::new(self.pool)
                .owned_game_ids(user.id)
                .await?),
            None => Ok(HashSet::new()),
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Buy one unit of a game.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::OutOfStock` or `StoreError::NotFound` when the
    /// purchase is refused; nothing is recorded in either case.
    pub async fn purchase(&self, user: &CurrentUser, game_id: GameId) -> Result<OrderId, StoreError> {
        Ok(OrderRepository::new(self.pool)
            .purchase(user.id, game_id)
            .await?)
    }

    /// Lines of an order visible to `user`.
    ///
    /// Customers only see their own orders; admins see every order. Orders
    /// belonging to someone else are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the order does not exist or is not
    /// visible to the caller.
    pub async fn order_details(
        &self,
        user: &CurrentUser,
        order_id: OrderId,
    ) -> Result<Vec<OrderDetail>, StoreError> {
        let lines = OrderRepository::new(self.pool).details(order_id).await?;
        let Some(first) = lines.first() else {
            return Err(StoreError::NotFound);
        };
        if first.user_id != user.id && !user.is_admin() {
            tracing::warn!(
                order_id = %order_id,
                requested_by = %user.id,
                "Order requested by a user who does not own it"
            );
            return Err(StoreError::NotFound);
        }
        Ok(lines)
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Full catalog for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Forbidden` unless `user` is an admin.
    pub async fn admin_list_games(&self, user: &CurrentUser) -> Result<Vec<GameWithStock>, StoreError> {
        require_admin(user)?;
        self.browse(None).await
    }

    /// Add a game, its stock and its cover image.
    ///
    /// Input and image are validated before any write. The cover is staged
    /// first and only replaces the file under its key once the catalog insert
    /// has committed, so a failed insert leaves existing covers untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Forbidden` unless `user` is an admin,
    /// `StoreError::Validation` for bad fields or a non-JPEG image and
    /// `StoreError::Storage` if persisting fails.
    #[instrument(skip(self, draft, cover), fields(admin = %user.id, name = %draft.name))]
    pub async fn admin_add_game(
        &self,
        user: &CurrentUser,
        draft: &GameDraft,
        cover: &CoverUpload,
    ) -> Result<GameId, StoreError> {
        require_admin(user)?;
        let (game, stock) = draft.parse()?;
        self.covers.validate_upload(&cover.file_name, &cover.bytes)?;

        let staged = self.covers.stage(&game.cover_key(), &cover.bytes).await?;

        match GameRepository::new(self.pool).create(&game, stock).await {
            Ok(id) => {
                staged.commit().await?;
                Ok(id)
            }
            Err(e) => {
                staged.discard().await;
                Err(e.into())
            }
        }
    }

    /// Delete a game with its inventory, order lines and emptied orders.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Forbidden` unless `user` is an admin and
    /// `StoreError::NotFound` if the game does not exist.
    #[instrument(skip(self), fields(admin = %user.id))]
    pub async fn admin_delete_game(&self, user: &CurrentUser, id: GameId) -> Result<(), StoreError> {
        require_admin(user)?;
        GameRepository::new(self.pool).delete(id).await?;
        Ok(())
    }
}

fn require_admin(user: &CurrentUser) -> Result<(), StoreError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(StoreError::Forbidden)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pixel_vault_core::UserId;
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    fn customer() -> CurrentUser {
        CurrentUser {
            id: UserId::new(2),
            username: "player".to_owned(),
            role: UserRole::Customer,
        }
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pixel_vault_unreachable")
            .unwrap()
    }

    #[test]
    fn test_require_admin() {
        assert!(matches!(require_admin(&customer()), Err(StoreError::Forbidden)));
        let admin = CurrentUser {
            role: UserRole::Admin,
            ..customer()
        };
        assert!(require_admin(&admin).is_ok());
    }

    #[tokio::test]
    async fn test_admin_operations_refuse_customers_before_io() {
        let pool = lazy_pool();
        let covers = CoverStore::new("unused-covers", 1024);
        let service = StorefrontService::new(&pool, &covers);
        let user = customer();

        assert!(matches!(
            service.admin_list_games(&user).await,
            Err(StoreError::Forbidden)
        ));
        assert!(matches!(
            service.admin_delete_game(&user, GameId::new(1)).await,
            Err(StoreError::Forbidden)
        ));
        assert!(matches!(
            service
                .admin_add_game(&user, &GameDraft::default(), &CoverUpload::default())
                .await,
            Err(StoreError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_admin_add_game_validates_before_io() {
        let pool = lazy_pool();
        let covers = CoverStore::new("unused-covers", 1024);
        let service = StorefrontService::new(&pool, &covers);
        let admin = CurrentUser {
            role: UserRole::Admin,
            ..customer()
        };
        let draft = GameDraft {
            name: "Test Game".to_owned(),
            platform: "PC".to_owned(),
            price: "9.99".to_owned(),
            stock: "2".to_owned(),
            ..GameDraft::default()
        };

        let missing_price = GameDraft {
            price: String::new(),
            ..draft.clone()
        };
        assert!(matches!(
            service
                .admin_add_game(&admin, &missing_price, &CoverUpload::default())
                .await,
            Err(StoreError::Validation(_))
        ));

        let png = CoverUpload {
            file_name: "cover.png".to_owned(),
            bytes: b"\x89PNG".to_vec(),
        };
        assert!(matches!(
            service.admin_add_game(&admin, &draft, &png).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_owned_game_ids_empty_for_visitors() {
        let pool = lazy_pool();
        let covers = CoverStore::new("unused-covers", 1024);
        let service = StorefrontService::new(&pool, &covers);
        assert!(service.owned_game_ids(None).await.unwrap().is_empty());
    }
}
