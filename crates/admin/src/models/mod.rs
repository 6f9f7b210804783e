//! Admin-only models. Catalog, purchase and user types live in
//! `gamestore-store`.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
