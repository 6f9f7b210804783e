//! Display data for admin templates.
//!
//! Handlers load domain types from `gamestore-store` and convert them here,
//! so templates only ever see preformatted strings and flags.

use gamestore_core::purchase::LineItem;
use gamestore_core::settings::StoreSettings;
use gamestore_store::models::{
    Notification, ProductListing, PurchaseSummary, UploadedImage, User,
};

use crate::models::CurrentAdmin;

/// Header, navigation and flash data shared by every admin page.
#[derive(Debug, Clone, Default)]
pub struct AdminLayout {
    pub store_name: String,
    pub admin_email: Option<String>,
    /// Badge next to "Notifications" in the nav.
    pub unread_notifications: i64,
    /// Which nav entry is highlighted.
    pub active: &'static str,
    pub success: Option<String>,
    pub error: Option<String>,
}

impl AdminLayout {
    #[must_use]
    pub fn new(
        settings: &StoreSettings,
        admin: Option<&CurrentAdmin>,
        unread_notifications: i64,
        active: &'static str,
    ) -> Self {
        Self {
            store_name: settings.store_name.clone(),
            admin_email: admin.map(|a| a.email.to_string()),
            unread_notifications,
            active,
            success: None,
            error: None,
        }
    }

    /// Attach `?success=` / `?error=` flash messages.
    #[must_use]
    pub fn with_flash(mut self, success: Option<String>, error: Option<String>) -> Self {
        self.success = success.filter(|s| !s.is_empty());
        self.error = error.filter(|s| !s.is_empty());
        self
    }
}

/// One row of the product table, also used to prefill the edit form.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub subcategory_id: i32,
    /// Plain decimal for form inputs.
    pub price_input: String,
    pub price: String,
    pub sale_price: Option<String>,
    pub sale_percentage: Option<i32>,
    pub stock: i32,
    pub low_stock: bool,
    pub image_url: String,
    /// Pretty-printed JSON for the specifications textarea.
    pub specifications: String,
    pub updated_at: String,
}

impl ProductRow {
    #[must_use]
    pub fn new(listing: &ProductListing, settings: &StoreSettings) -> Self {
        let product = &listing.product;
        let symbol = settings.currency_symbol.as_str();
        let on_sale = product.sale.active;

        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone(),
            category: listing.category_name.clone(),
            subcategory: listing.subcategory_name.clone(),
            subcategory_id: product.subcategory_id.as_i32(),
            price_input: product.price.to_string(),
            price: product.price.display_with(symbol),
            sale_price: product
                .sale
                .price
                .filter(|_| on_sale)
                .map(|p| p.display_with(symbol)),
            sale_percentage: on_sale.then_some(product.sale.percentage),
            stock: product.stock,
            low_stock: settings.is_low_stock(product.stock),
            image_url: product.image_url.clone().unwrap_or_default(),
            specifications: serde_json::to_string_pretty(&product.specifications)
                .unwrap_or_else(|_| "{}".to_owned()),
            updated_at: product.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// A purchase line as staff see it.
#[derive(Debug, Clone)]
pub struct LineItemRow {
    pub product_id: i32,
    pub name: String,
    pub price: String,
    pub quantity: u32,
    pub total: String,
}

impl LineItemRow {
    fn new(item: &LineItem, symbol: &str) -> Self {
        Self {
            product_id: item.product_id.as_i32(),
            name: item.name.clone(),
            price: item.price.display_with(symbol),
            quantity: item.quantity,
            total: item.total.display_with(symbol),
        }
    }
}

/// One purchase request in the fulfilment queue.
#[derive(Debug, Clone)]
pub struct PurchaseRow {
    pub id: i32,
    pub number: String,
    pub buyer: String,
    pub items: Vec<LineItemRow>,
    pub total: String,
    pub status: String,
    pub is_pending: bool,
    pub chat_notified: bool,
    pub created_at: String,
}

impl PurchaseRow {
    #[must_use]
    pub fn new(summary: &PurchaseSummary, symbol: &str) -> Self {
        let purchase = &summary.purchase;
        Self {
            id: purchase.id.as_i32(),
            number: purchase.number.to_string(),
            buyer: summary.buyer_email.clone(),
            items: purchase
                .items
                .iter()
                .map(|i| LineItemRow::new(i, symbol))
                .collect(),
            total: purchase.total.display_with(symbol),
            status: purchase.status.to_string(),
            is_pending: purchase.status == gamestore_core::PurchaseStatus::Pending,
            chat_notified: purchase.chat_notified,
            created_at: purchase.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// One account in the user table.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i32,
    pub email: String,
    pub is_admin: bool,
    /// The signed-in admin's own row, which cannot be demoted.
    pub is_self: bool,
    pub created_at: String,
}

impl UserRow {
    #[must_use]
    pub fn new(user: &User, admin: &CurrentAdmin) -> Self {
        Self {
            id: user.id.as_i32(),
            email: user.email.to_string(),
            is_admin: user.is_admin,
            is_self: user.id == admin.id,
            created_at: user.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: i32,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.as_i32(),
            kind: n.kind.to_string(),
            title: n.title.clone(),
            message: n.message.clone(),
            is_read: n.is_read,
            created_at: n.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageRow {
    pub id: i32,
    pub name: String,
    pub original_name: String,
    pub data_url: String,
    pub mime_type: String,
    pub size: String,
    /// `"W×H"` when target dimensions were given.
    pub dimensions: Option<String>,
    pub created_at: String,
}

impl From<&UploadedImage> for ImageRow {
    fn from(image: &UploadedImage) -> Self {
        let dimensions = match (image.resized_width, image.resized_height) {
            (Some(w), Some(h)) => Some(format!("{w}×{h}")),
            _ => match (image.original_width, image.original_height) {
                (Some(w), Some(h)) => Some(format!("{w}×{h}")),
                _ => None,
            },
        };
        Self {
            id: image.id.as_i32(),
            name: image.name.clone(),
            original_name: image.original_name.clone(),
            data_url: image.data_url.clone(),
            mime_type: image.mime_type.clone(),
            size: human_size(usize::try_from(image.file_size).unwrap_or_default()),
            dimensions,
            created_at: image.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Byte count as B / KB / MB with one decimal.
pub(crate) fn human_size(bytes: usize) -> String {
    let bytes = u32::try_from(bytes).map_or(f64::from(u32::MAX), f64::from);
    if bytes < 1024.0 {
        format!("{bytes} B")
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.1} KB", bytes / 1024.0)
    } else {
        format!("{:.1} MB", bytes / (1024.0 * 1024.0))
    }
}

/// A rarity in the palette editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RarityRow {
    pub name: String,
    pub color: String,
    pub is_first: bool,
    pub is_last: bool,
}

impl RarityRow {
    #[must_use]
    pub fn list(settings: &StoreSettings) -> Vec<Self> {
        let entries = settings.rarities.entries();
        let last = entries.len().saturating_sub(1);
        entries
            .iter()
            .enumerate()
            .map(|(i, (name, color))| Self {
                name: name.clone(),
                color: color.clone(),
                is_first: i == 0,
                is_last: i == last,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use gamestore_core::purchase::PurchaseNumber;
    use gamestore_core::{
        Email, ImageId, Money, ProductId, PurchaseId, PurchaseStatus, UserId,
    };
    use gamestore_store::models::PurchaseRequest;

    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_rarity_rows_mark_ends() {
        let mut map = HashMap::new();
        map.insert(
            "rarity_colors".to_owned(),
            r##"{"common":"#9CA3AF","epic":"#8B5CF6","rare":"#3B82F6"}"##.to_owned(),
        );
        map.insert("rarity_order".to_owned(), r#"["rare","common"]"#.to_owned());
        let rows = RarityRow::list(&StoreSettings::from_map(&map));

        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["rare", "common", "epic"]);
        assert!(rows.first().unwrap().is_first);
        assert!(rows.last().unwrap().is_last);
        assert!(!rows.get(1).unwrap().is_first && !rows.get(1).unwrap().is_last);
    }

    #[test]
    fn test_purchase_row_for_deleted_buyer() {
        let summary = PurchaseSummary {
            purchase: PurchaseRequest {
                id: PurchaseId::new(4),
                number: PurchaseNumber::parse("PUR-1700000000000-ABCDEFGHI").unwrap(),
                user_id: None,
                items: vec![LineItem::new(
                    ProductId::new(1),
                    "Gem Pack",
                    Money::from_cents(499),
                    2,
                )],
                total: Money::from_cents(998),
                status: PurchaseStatus::Pending,
                chat_notified: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            buyer_email: "Unknown User".to_owned(),
        };
        let row = PurchaseRow::new(&summary, "€");
        assert_eq!(row.buyer, "Unknown User");
        assert_eq!(row.total, "€9.98");
        assert!(row.is_pending);
        assert_eq!(row.items.first().unwrap().total, "€9.98");
    }

    #[test]
    fn test_user_row_marks_self() {
        let admin = CurrentAdmin {
            id: UserId::new(1),
            email: Email::parse("boss@gamestore.com").unwrap(),
        };
        let user = User {
            id: UserId::new(1),
            email: Email::parse("boss@gamestore.com").unwrap(),
            is_admin: true,
            created_at: Utc::now(),
        };
        assert!(UserRow::new(&user, &admin).is_self);
    }

    #[test]
    fn test_image_row_prefers_target_dimensions() {
        let image = UploadedImage {
            id: ImageId::new(3),
            name: "1700000000000_ABC123XYZ_logo.png".to_owned(),
            original_name: "logo.png".to_owned(),
            data_url: "data:image/png;base64,AAAA".to_owned(),
            original_width: Some(1024),
            original_height: Some(768),
            resized_width: Some(300),
            resized_height: Some(200),
            file_size: 3,
            mime_type: "image/png".to_owned(),
            created_by: Some(UserId::new(1)),
            created_at: Utc::now(),
        };
        assert_eq!(ImageRow::from(&image).dimensions.as_deref(), Some("300×200"));
    }
}
