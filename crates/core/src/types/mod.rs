//! Core types for Pixel Vault.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod game;
pub mod id;
pub mod platform;
pub mod price;
pub mod role;

pub use email::{Email, EmailError};
pub use game::{GameDraft, NewGame, Stock, ValidationError, cover_key};
pub use id::*;
pub use platform::{Platform, PlatformParseError};
pub use price::{Price, PriceError};
pub use role::{RoleParseError, UserRole};
