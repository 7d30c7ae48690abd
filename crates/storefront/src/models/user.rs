//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use pixel_vault_core::{Email, UserId, UserRole};

/// A storefront user (domain type).
///
/// The password hash is deliberately absent; it is only read by
/// `UserRepository::get_password_hash` during login.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Contact email.
    pub email: Email,
    /// Contact phone number (free-form, may be empty).
    pub phone: String,
    /// Postal address (free-form, may be empty).
    pub address: String,
    /// Capability level.
    pub role: UserRole,
    /// When the user signed up.
    pub created_at: DateTime<Utc>,
}
