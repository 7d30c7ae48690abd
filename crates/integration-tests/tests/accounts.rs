//! Account integration tests: signup, login, duplicate usernames and who may
//! see an order.

use futures::future::join;
use sqlx::PgPool;

use pixel_vault_core::{OrderId, UserRole};
use pixel_vault_integration_tests::{TEST_PASSWORD, count_rows, seed_game, seed_user};
use pixel_vault_storefront::services::auth::{AuthError, AuthService, Registration};
use pixel_vault_storefront::services::{CoverStore, StoreError, StorefrontService};

fn registration(username: &str) -> Registration<'_> {
    Registration {
        username,
        password: TEST_PASSWORD,
        email: "player@example.com",
        phone: "",
        address: "",
    }
}

// =============================================================================
// Signup and login
// =============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_signup_then_login(pool: PgPool) {
    let covers = CoverStore::new("unused", 0);
    let service = StorefrontService::new(&pool, &covers);

    let user = service.signup(registration("player_one")).await.unwrap();
    assert_eq!(user.role, UserRole::Customer);
    assert_eq!(user.email.as_str(), "player@example.com");

    let logged_in = service
        .authenticate("player_one", TEST_PASSWORD)
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);

    let err = service
        .authenticate("player_one", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidCredentials));

    let err = service
        .authenticate("nobody", TEST_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidCredentials));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_password_is_stored_hashed(pool: PgPool) {
    seed_user(&pool, "hashed", UserRole::Customer).await;

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE username = $1")
        .bind("hashed")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_ne!(stored, TEST_PASSWORD);
    assert!(stored.starts_with("$argon2id$"));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_username_rejected(pool: PgPool) {
    let auth = AuthService::new(&pool);
    auth.register(registration("taken"), UserRole::Customer)
        .await
        .unwrap();

    let err = auth
        .register(registration("taken"), UserRole::Customer)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UsernameTaken));
    assert_eq!(count_rows(&pool, "users").await, 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_duplicate_signup_creates_one_user(pool: PgPool) {
    let first_pool = pool.clone();
    let second_pool = pool.clone();

    let (first, second) = join(
        async move {
            AuthService::new(&first_pool)
                .register(registration("racer"), UserRole::Customer)
                .await
        },
        async move {
            AuthService::new(&second_pool)
                .register(registration("racer"), UserRole::Customer)
                .await
        },
    )
    .await;

    let created = [first.is_ok(), second.is_ok()];
    assert_eq!(created.iter().filter(|ok| **ok).count(), 1);
    for result in [first, second] {
        if let Err(e) = result {
            assert!(matches!(e, AuthError::UsernameTaken), "unexpected error: {e}");
        }
    }
    assert_eq!(count_rows(&pool, "users").await, 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_signup_validation(pool: PgPool) {
    let auth = AuthService::new(&pool);

    let mut weak = registration("weakling");
    weak.password = "short";
    assert!(matches!(
        auth.register(weak, UserRole::Customer).await,
        Err(AuthError::WeakPassword(_))
    ));

    let mut bad_email = registration("mailless");
    bad_email.email = "not-an-email";
    assert!(matches!(
        auth.register(bad_email, UserRole::Customer).await,
        Err(AuthError::InvalidEmail(_))
    ));

    assert!(matches!(
        auth.register(registration("no spaces"), UserRole::Customer).await,
        Err(AuthError::InvalidUsername(_))
    ));

    assert_eq!(count_rows(&pool, "users").await, 0);
}

// =============================================================================
// Order visibility
// =============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_order_details_visible_to_owner_and_admins_only(pool: PgPool) {
    let covers = CoverStore::new("unused", 0);
    let service = StorefrontService::new(&pool, &covers);
    let game = seed_game(&pool, "Celeste", 3).await;
    let owner = seed_user(&pool, "owner", UserRole::Customer).await;
    let stranger = seed_user(&pool, "stranger", UserRole::Customer).await;
    let admin = seed_user(&pool, "admin", UserRole::Admin).await;

    let order = service.purchase(&owner, game).await.unwrap();

    let lines = service.order_details(&owner, order).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].username, "owner");
    assert_eq!(lines[0].game_name, "Celeste");

    assert_eq!(service.order_details(&admin, order).await.unwrap().len(), 1);

    let err = service.order_details(&stranger, order).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    let err = service
        .order_details(&owner, OrderId::new(order.as_i32() + 100))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_profile_lists_library_and_orders(pool: PgPool) {
    let covers = CoverStore::new("unused", 0);
    let service = StorefrontService::new(&pool, &covers);
    let game = seed_game(&pool, "Hades", 3).await;
    let user = seed_user(&pool, "collector", UserRole::Customer).await;

    let empty = service.profile(&user).await.unwrap();
    assert!(empty.library.is_empty());
    assert!(empty.orders.is_empty());

    service.purchase(&user, game).await.unwrap();
    service.purchase(&user, game).await.unwrap();

    let profile = service.profile(&user).await.unwrap();
    assert_eq!(profile.user.username, "collector");
    assert_eq!(profile.library.len(), 1);
    assert_eq!(profile.orders.len(), 2);
    assert!(service
        .owned_game_ids(Some(&user))
        .await
        .unwrap()
        .contains(&game));
}
