//! Admin notification type.

use chrono::{DateTime, Utc};

use gamestore_core::{NotificationId, NotificationKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
