//! Domain models for the storefront.
//!
//! Repository row types stay private to `crate::db`; these are the validated
//! shapes handed to services and templates.

pub mod game;
pub mod order;
pub mod session;
pub mod user;

pub use game::{Game, GameWithStock};
pub use order::{OrderDetail, OrderSummary};
pub use session::{CurrentUser, keys};
pub use user::User;
