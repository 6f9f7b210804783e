//! GameStore Store - PostgreSQL access shared by the storefront, admin and CLI.
//!
//! # Modules
//!
//! - [`db`] - Connection pool, repositories (one per table) and [`db::RepositoryError`]
//! - [`models`] - Rows mapped into domain structs
//! - [`services`] - Password authentication and the purchase workflow
//!
//! Queries are built with `sqlx::query_as` at runtime so the crate builds
//! without a live database; every row type maps into a domain struct via
//! `TryFrom`, which is where corrupt data is caught.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod db;
pub mod models;
pub mod services;

pub use db::{RepositoryError, create_pool};
