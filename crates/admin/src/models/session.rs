//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use gamestore_core::{Email, UserId};
use gamestore_store::models::User;

/// Session-stored admin identity.
///
/// The admin flag itself is not cached here: it is re-read from the
/// database on every request so a demotion takes effect at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Account's database ID.
    pub id: UserId,
    /// Account's email address.
    pub email: Email,
}

impl From<User> for CurrentAdmin {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
