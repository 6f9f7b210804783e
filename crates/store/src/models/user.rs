//! Account domain types.

use chrono::{DateTime, Utc};

use gamestore_core::{Email, UserId};

/// A shopper or admin account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// A user together with their stored password hash, for sign-in only.
#[derive(Debug, Clone)]
pub struct UserWithHash {
    pub user: User,
    pub password_hash: String,
}
