//! GameStore Core - domain types and rules.
//!
//! This crate is shared by every GameStore component:
//! - `gamestore-store` - PostgreSQL repositories and services
//! - `gamestore-storefront` - Public catalog, cart and checkout (port 3000)
//! - `gamestore-admin` - Admin console (port 3001)
//! - `gamestore-cli` - Migrations, admin bootstrap and seeding
//!
//! # Architecture
//!
//! The core crate holds types and pure functions only - no I/O, no database
//! access. Anything that can be decided without a connection (slugs, sale
//! prices, purchase snapshots, stock arithmetic, settings parsing) lives here
//! so it can be unit tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, money and status enums
//! - [`catalog`] - Slugs, sale pricing, rarity and product sorting
//! - [`cart`] - Cart quantity rules
//! - [`purchase`] - Purchase numbers, order snapshots and stock arithmetic
//! - [`settings`] - Typed view over the key-value store settings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod purchase;
pub mod settings;
pub mod types;

pub use types::*;
