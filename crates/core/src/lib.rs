//! Pixel Vault Core - Shared types library.
//!
//! This crate provides common types used across all Pixel Vault components:
//! - `storefront` - Public-facing game store, including the admin panel
//! - `cli` - Command-line tools for migrations, admin users and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, platforms,
//!   roles and validated catalog input

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
