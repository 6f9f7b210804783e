//! Storefront-only models. Catalog and purchase types live in `gamestore-store`.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
