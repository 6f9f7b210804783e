//! Status enums for purchases and notifications.

use serde::{Deserialize, Serialize};

/// Lifecycle of a purchase request.
///
/// ```text
/// pending ──► completed
///    │
///    └──────► cancelled
/// ```
///
/// Both `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.purchase_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Waiting for the buyer to pay over chat.
    #[default]
    Pending,
    /// Paid and delivered.
    Completed,
    /// Abandoned; stock has been restored.
    Cancelled,
}

impl PurchaseStatus {
    /// Whether a purchase in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Cancelled)
        )
    }

    /// True for `completed` and `cancelled`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Lowercase label used in the database and templates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid purchase status: {s}")),
        }
    }
}

/// What an admin notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.notification_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewPurchase,
    PurchaseCompleted,
    PurchaseCancelled,
}

impl NotificationKind {
    /// Title shown in the admin notification list.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::NewPurchase => "New Purchase Request",
            Self::PurchaseCompleted => "Purchase Completed",
            Self::PurchaseCancelled => "Purchase Cancelled",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewPurchase => write!(f, "new_purchase"),
            Self::PurchaseCompleted => write!(f, "purchase_completed"),
            Self::PurchaseCancelled => write!(f, "purchase_cancelled"),
        }
    }
}
