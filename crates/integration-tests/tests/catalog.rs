//! Catalog integration tests: listing, adding games with covers and the
//! delete cascade through inventory and the order ledger.

use sqlx::PgPool;

use pixel_vault_core::{GameId, Platform, Stock, UserRole};
use pixel_vault_integration_tests::{
    JPEG_BYTES, count_rows, game_draft, new_game, seed_game, seed_user, stock_of,
};
use pixel_vault_storefront::db::{GameRepository, OrderRepository, RepositoryError};
use pixel_vault_storefront::services::{CoverStore, CoverUpload, StoreError, StorefrontService};

fn cover() -> CoverUpload {
    CoverUpload {
        file_name: "cover.jpg".to_owned(),
        bytes: JPEG_BYTES.to_vec(),
    }
}

// =============================================================================
// Listing
// =============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_created_game_reads_back_with_stock(pool: PgPool) {
    let games = GameRepository::new(&pool);
    let id = games
        .create(&new_game("Celeste"), Stock::new(2).unwrap())
        .await
        .unwrap();

    let item = games.get(id).await.unwrap().unwrap();
    assert_eq!(item.game.name, "Celeste");
    assert_eq!(item.game.platform, Platform::Pc);
    assert_eq!(item.stock.count(), 2);
    assert!(item.in_stock());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_list_filters_by_platform(pool: PgPool) {
    let games = GameRepository::new(&pool);
    let mut switch_game = new_game("Celeste");
    switch_game.platform = Platform::Switch;
    games
        .create(&switch_game, Stock::new(1).unwrap())
        .await
        .unwrap();
    games
        .create(&new_game("Hades"), Stock::new(1).unwrap())
        .await
        .unwrap();

    assert_eq!(games.list(None).await.unwrap().len(), 2);
    let switch = games.list(Some(Platform::Switch)).await.unwrap();
    assert_eq!(switch.len(), 1);
    assert_eq!(switch[0].game.name, "Celeste");
    assert!(games.list(Some(Platform::Xbox)).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_get_missing_game(pool: PgPool) {
    let item = GameRepository::new(&pool).get(GameId::new(1)).await.unwrap();
    assert!(item.is_none());
}

// =============================================================================
// Admin add
// =============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_admin_adds_game_with_cover(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let covers = CoverStore::new(dir.path(), 1024);
    let admin = seed_user(&pool, "admin", UserRole::Admin).await;
    let service = StorefrontService::new(&pool, &covers);

    let id = service
        .admin_add_game(&admin, &game_draft("Hollow Knight: Silksong", 3), &cover())
        .await
        .unwrap();

    let item = service.game_detail(id).await.unwrap();
    assert_eq!(item.stock.count(), 3);
    assert_eq!(item.game.price.to_string(), "$19.99");
    assert!(covers.exists("Hollow Knight Silksong").await);
    assert_eq!(item.game.cover_url(), "/covers/Hollow Knight Silksong.jpg");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_customer_cannot_add_or_delete(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let covers = CoverStore::new(dir.path(), 1024);
    let customer = seed_user(&pool, "customer", UserRole::Customer).await;
    let game = seed_game(&pool, "Celeste", 1).await;
    let service = StorefrontService::new(&pool, &covers);

    let err = service
        .admin_add_game(&customer, &game_draft("Sneaky", 1), &cover())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));

    let err = service.admin_delete_game(&customer, game).await.unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));

    assert_eq!(count_rows(&pool, "games").await, 1);
    assert!(!covers.exists("Sneaky").await);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_invalid_input_writes_nothing(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let covers = CoverStore::new(dir.path(), 1024);
    let admin = seed_user(&pool, "admin", UserRole::Admin).await;
    let service = StorefrontService::new(&pool, &covers);

    let err = service
        .admin_add_game(&admin, &game_draft("Negative", -1), &cover())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let not_a_jpeg = CoverUpload {
        file_name: "cover.png".to_owned(),
        bytes: b"\x89PNG\r\n".to_vec(),
    };
    let err = service
        .admin_add_game(&admin, &game_draft("Png Cover", 1), &not_a_jpeg)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    assert_eq!(count_rows(&pool, "games").await, 0);
    assert!(!covers.exists("Png Cover").await);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_failed_insert_keeps_shared_cover(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let covers = CoverStore::new(dir.path(), 1024);
    let admin = seed_user(&pool, "admin", UserRole::Admin).await;
    let service = StorefrontService::new(&pool, &covers);

    service
        .admin_add_game(&admin, &game_draft("Celeste", 1), &cover())
        .await
        .unwrap();

    // Every new inventory row now fails, so the next insert rolls back.
    sqlx::query(
        "ALTER TABLE game_inventory ADD CONSTRAINT reject_all CHECK (games_count < 0) NOT VALID",
    )
    .execute(&pool)
    .await
    .unwrap();

    let replacement = CoverUpload {
        file_name: "other.jpg".to_owned(),
        bytes: [JPEG_BYTES, b"other"].concat(),
    };
    let err = service
        .admin_add_game(&admin, &game_draft("Celeste!", 1), &replacement)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)));

    assert_eq!(count_rows(&pool, "games").await, 1);
    let stored = tokio::fs::read(dir.path().join("Celeste.jpg")).await.unwrap();
    assert_eq!(stored, JPEG_BYTES);

    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    assert_eq!(names, vec!["Celeste.jpg".to_owned()]);
}

// =============================================================================
// Delete cascade
// =============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_delete_removes_inventory_lines_and_emptied_orders(pool: PgPool) {
    let doomed = seed_game(&pool, "Doomed", 5).await;
    let kept = seed_game(&pool, "Kept", 5).await;
    let buyer = seed_user(&pool, "buyer", UserRole::Customer).await;
    let orders = OrderRepository::new(&pool);

    let only_doomed = orders.purchase(buyer.id, doomed).await.unwrap();
    let only_kept = orders.purchase(buyer.id, kept).await.unwrap();

    // An order holding both games keeps its other line.
    let mixed = orders.purchase(buyer.id, kept).await.unwrap();
    sqlx::query("INSERT INTO order_items (order_id, game_id) VALUES ($1, $2)")
        .bind(mixed)
        .bind(doomed)
        .execute(&pool)
        .await
        .unwrap();

    GameRepository::new(&pool).delete(doomed).await.unwrap();

    assert!(GameRepository::new(&pool).get(doomed).await.unwrap().is_none());
    assert_eq!(stock_of(&pool, doomed).await, None);
    assert!(orders.details(only_doomed).await.unwrap().is_empty());
    assert_eq!(orders.details(only_kept).await.unwrap().len(), 1);

    let mixed_lines = orders.details(mixed).await.unwrap();
    assert_eq!(mixed_lines.len(), 1);
    assert_eq!(mixed_lines[0].game_id, kept);

    let dangling: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM order_items WHERE game_id NOT IN (SELECT game_id FROM games)",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(dangling, 0);
    assert_eq!(count_rows(&pool, "user_orders").await, 2);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_delete_missing_game(pool: PgPool) {
    let err = GameRepository::new(&pool)
        .delete(GameId::new(77))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_purchase_after_delete_is_not_found(pool: PgPool) {
    let game = seed_game(&pool, "Gone", 5).await;
    let buyer = seed_user(&pool, "buyer", UserRole::Customer).await;
    GameRepository::new(&pool).delete(game).await.unwrap();

    let err = OrderRepository::new(&pool)
        .purchase(buyer.id, game)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        pixel_vault_storefront::db::PurchaseError::NotFound(_)
    ));
    assert_eq!(count_rows(&pool, "user_orders").await, 0);
}
