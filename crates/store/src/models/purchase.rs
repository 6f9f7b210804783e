//! Purchase request domain types.

use chrono::{DateTime, Utc};

use gamestore_core::purchase::{LineItem, PurchaseNumber};
use gamestore_core::{Money, PurchaseId, PurchaseStatus, UserId};

/// A stored purchase request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub id: PurchaseId,
    pub number: PurchaseNumber,
    /// `None` once the buyer's account is gone.
    pub user_id: Option<UserId>,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub status: PurchaseStatus,
    pub chat_notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchase request with the buyer's email, for the admin list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseSummary {
    pub purchase: PurchaseRequest,
    /// "Unknown User" when the account no longer exists.
    pub buyer_email: String,
}
