//! Integration tests for Pixel Vault.
//!
//! Every test gets a fresh database from `#[sqlx::test]` with the storefront
//! migrations applied. The tests are ignored by default because they need a
//! `PostgreSQL` server.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database
//! task db:start
//!
//! # Run integration tests
//! DATABASE_URL=postgres://localhost/pixel_vault cargo test -p pixel-vault-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `purchases` - Inventory guard, concurrent buyers, rollback
//! - `catalog` - Add and delete games, referential integrity
//! - `accounts` - Signup, login, order visibility
//! - `http` - End-to-end flows through the router

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;

use secrecy::SecretString;
use sqlx::PgPool;

use pixel_vault_core::{GameDraft, GameId, NewGame, Platform, Price, Stock, UserRole};
use pixel_vault_storefront::config::StorefrontConfig;
use pixel_vault_storefront::db::GameRepository;
use pixel_vault_storefront::models::CurrentUser;
use pixel_vault_storefront::services::auth::{AuthService, Registration};

/// Path of the storefront migrations relative to this crate.
pub const MIGRATIONS: &str = "../storefront/migrations";

/// Password used for every account created by the helpers.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Smallest file that passes the cover JPEG check.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

/// A valid game named `name` on PC for $9.99.
#[must_use]
pub fn new_game(name: &str) -> NewGame {
    NewGame {
        name: name.to_owned(),
        details: format!("{name} is a game used in tests"),
        developer: "Test Dev".to_owned(),
        publisher: "Test Pub".to_owned(),
        platform: Platform::Pc,
        price: Price::parse("9.99").unwrap(),
    }
}

/// Admin form input for a game.
#[must_use]
pub fn game_draft(name: &str, stock: i32) -> GameDraft {
    GameDraft {
        name: name.to_owned(),
        details: "Added through the admin panel".to_owned(),
        developer: "Test Dev".to_owned(),
        publisher: "Test Pub".to_owned(),
        platform: "PC".to_owned(),
        price: "19.99".to_owned(),
        stock: stock.to_string(),
    }
}

/// Insert a game with `stock` units.
pub async fn seed_game(pool: &PgPool, name: &str, stock: i32) -> GameId {
    GameRepository::new(pool)
        .create(&new_game(name), Stock::new(stock).unwrap())
        .await
        .unwrap()
}

/// Register an account and return its session identity.
pub async fn seed_user(pool: &PgPool, username: &str, role: UserRole) -> CurrentUser {
    let email = format!("{username}@example.com");
    let registration = Registration {
        username,
        password: TEST_PASSWORD,
        email: &email,
        phone: "555-0100",
        address: "1 Test Street",
    };
    let user = AuthService::new(pool)
        .register(registration, role)
        .await
        .unwrap();
    CurrentUser::from(&user)
}

/// Remaining units of a game, or `None` if it has no inventory row.
pub async fn stock_of(pool: &PgPool, game_id: GameId) -> Option<i32> {
    sqlx::query_scalar("SELECT games_count FROM game_inventory WHERE game_id = $1")
        .bind(game_id)
        .fetch_optional(pool)
        .await
        .unwrap()
}

/// Row count of `table`.
pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Storefront configuration for router tests, with covers under `covers_dir`.
#[must_use]
pub fn test_config(covers_dir: PathBuf) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/pixel_vault_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        covers_dir,
        max_upload_bytes: 1024 * 1024,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}
