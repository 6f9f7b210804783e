//! Display data for templates.
//!
//! Handlers load domain types from `gamestore-store` and convert them here,
//! so templates only ever see preformatted strings.

use gamestore_core::catalog::StockBadge;
use gamestore_core::purchase::LineItem;
use gamestore_core::settings::StoreSettings;
use gamestore_store::models::{CartLine, ProductListing, PurchaseRequest};

use crate::models::CurrentUser;

/// Header, footer and flash data shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub store_name: String,
    pub support_email: Option<String>,
    pub user_email: Option<String>,
    pub cart_count: i64,
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Layout {
    #[must_use]
    pub fn new(settings: &StoreSettings, user: Option<&CurrentUser>, cart_count: i64) -> Self {
        Self {
            store_name: settings.store_name.clone(),
            support_email: settings.support_email.clone(),
            user_email: user.map(|u| u.email.to_string()),
            cart_count,
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

/// A rarity label with its badge colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RarityView {
    pub name: String,
    pub color: String,
}

/// Product card and detail data.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category_name: String,
    pub category_slug: String,
    pub subcategory_name: String,
    /// What the buyer pays.
    pub price: String,
    /// List price, shown struck through while on sale.
    pub original_price: Option<String>,
    pub sale_percentage: Option<i32>,
    /// "Only N left!" or "Out of Stock".
    pub stock_label: Option<String>,
    pub out_of_stock: bool,
    pub stock: i32,
    pub rarity: Option<RarityView>,
    /// Specifications other than rarity, as display pairs.
    pub specifications: Vec<(String, String)>,
}

impl ProductView {
    #[must_use]
    pub fn new(listing: &ProductListing, settings: &StoreSettings) -> Self {
        let product = &listing.product;
        let symbol = settings.currency_symbol.as_str();
        let on_sale = product.sale.active && product.sale.price.is_some();

        let badge = product.stock_badge();
        let stock_label = match badge {
            StockBadge::OutOfStock => Some("Out of Stock".to_owned()),
            StockBadge::OnlyLeft(n) => Some(format!("Only {n} left!")),
            StockBadge::InStock => None,
        };

        let specifications = product
            .specifications
            .as_object()
            .map(|map| {
                map.iter()
                    .filter(|(k, _)| k.as_str() != "rarity")
                    .map(|(k, v)| {
                        let value = v.as_str().map_or_else(|| v.to_string(), ToOwned::to_owned);
                        (k.clone(), value)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone(),
            image_url: product.image_url.clone().filter(|u| !u.is_empty()),
            category_name: listing.category_name.clone(),
            category_slug: listing.category_slug.clone(),
            subcategory_name: listing.subcategory_name.clone(),
            price: product.effective_price().display_with(symbol),
            original_price: on_sale.then(|| product.price.display_with(symbol)),
            sale_percentage: on_sale.then_some(product.sale.percentage),
            stock_label,
            out_of_stock: badge == StockBadge::OutOfStock,
            stock: product.stock,
            rarity: product.rarity().map(|name| RarityView {
                color: settings.rarities.color_of(&name).to_owned(),
                name,
            }),
            specifications,
        }
    }
}

/// One cart row.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: String,
    pub quantity: i32,
    pub line_total: String,
    pub can_increment: bool,
}

/// The cart page body.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: i32,
}

impl CartView {
    #[must_use]
    pub fn new(lines: &[CartLine], currency_symbol: &str) -> Self {
        let total = lines.iter().map(CartLine::line_total).sum::<gamestore_core::Money>();
        Self {
            lines: lines
                .iter()
                .map(|l| CartLineView {
                    id: l.id.as_i32(),
                    product_id: l.product_id.as_i32(),
                    name: l.name.clone(),
                    image_url: l.image_url.clone().filter(|u| !u.is_empty()),
                    unit_price: l.unit_price.display_with(currency_symbol),
                    quantity: l.quantity,
                    line_total: l.line_total().display_with(currency_symbol),
                    can_increment: gamestore_core::cart::can_increment(l.quantity, l.stock),
                })
                .collect(),
            total: total.display_with(currency_symbol),
            item_count: lines.iter().map(|l| l.quantity).sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A purchase line as the buyer sees it.
#[derive(Debug, Clone)]
pub struct LineItemView {
    pub name: String,
    pub price: String,
    pub quantity: u32,
    pub total: String,
}

impl LineItemView {
    fn new(item: &LineItem, symbol: &str) -> Self {
        Self {
            name: item.name.clone(),
            price: item.price.display_with(symbol),
            quantity: item.quantity,
            total: item.total.display_with(symbol),
        }
    }
}

/// A purchase request in the buyer's history.
#[derive(Debug, Clone)]
pub struct PurchaseView {
    pub number: String,
    pub status: String,
    pub total: String,
    pub created_at: String,
    pub items: Vec<LineItemView>,
    pub item_count: u32,
}

impl PurchaseView {
    #[must_use]
    pub fn new(purchase: &PurchaseRequest, symbol: &str) -> Self {
        Self {
            number: purchase.number.to_string(),
            status: purchase.status.to_string(),
            total: purchase.total.display_with(symbol),
            created_at: purchase.created_at.format("%Y-%m-%d %H:%M").to_string(),
            items: purchase
                .items
                .iter()
                .map(|i| LineItemView::new(i, symbol))
                .collect(),
            item_count: purchase.items.iter().map(|i| i.quantity).sum(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use gamestore_core::catalog::Sale;
    use gamestore_core::{CartItemId, Money, ProductId, SubcategoryId};
    use gamestore_store::models::Product;

    use super::*;

    fn listing(stock: i32, sale: Sale, specs: serde_json::Value) -> ProductListing {
        ProductListing {
            product: Product {
                id: ProductId::new(7),
                subcategory_id: SubcategoryId::new(1),
                name: "Dragon Skin".to_owned(),
                description: "Legendary outfit".to_owned(),
                price: Money::from_cents(2000),
                image_url: Some(String::new()),
                stock,
                specifications: specs,
                sale,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            subcategory_name: "Skins".to_owned(),
            category_name: "Fortnite".to_owned(),
            category_slug: "fortnite".to_owned(),
        }
    }

    fn settings() -> StoreSettings {
        let mut map = HashMap::new();
        map.insert("rarity_colors".to_owned(), r##"{"legendary":"#F59E0B"}"##.to_owned());
        StoreSettings::from_map(&map)
    }

    #[test]
    fn test_product_on_sale() {
        let sale = Sale {
            active: true,
            percentage: 20,
            price: Some(Money::from_cents(1600)),
        };
        let view = ProductView::new(&listing(3, sale, serde_json::json!({})), &settings());
        assert_eq!(view.price, "€16.00");
        assert_eq!(view.original_price.as_deref(), Some("€20.00"));
        assert_eq!(view.sale_percentage, Some(20));
        // Sale badge replaces the low-stock one
        assert_eq!(view.stock_label, None);
        assert!(view.image_url.is_none());
    }

    #[test]
    fn test_product_low_and_out_of_stock() {
        let s = settings();
        let view = ProductView::new(&listing(2, Sale::default(), serde_json::json!({})), &s);
        assert_eq!(view.stock_label.as_deref(), Some("Only 2 left!"));
        assert!(!view.out_of_stock);

        let view = ProductView::new(&listing(0, Sale::default(), serde_json::json!({})), &s);
        assert_eq!(view.stock_label.as_deref(), Some("Out of Stock"));
        assert!(view.out_of_stock);
    }

    #[test]
    fn test_product_rarity_and_specifications() {
        let specs = serde_json::json!({"rarity": "Legendary", "platform": "PC", "level": 40});
        let view = ProductView::new(&listing(10, Sale::default(), specs), &settings());
        let rarity = view.rarity.unwrap();
        assert_eq!(rarity.name, "legendary");
        assert_eq!(rarity.color, "#F59E0B");
        assert!(view.specifications.contains(&("platform".to_owned(), "PC".to_owned())));
        assert!(view.specifications.contains(&("level".to_owned(), "40".to_owned())));
        assert!(!view.specifications.iter().any(|(k, _)| k == "rarity"));
    }

    #[test]
    fn test_cart_totals() {
        let lines = vec![
            CartLine {
                id: CartItemId::new(1),
                product_id: ProductId::new(1),
                name: "A".to_owned(),
                image_url: None,
                unit_price: Money::from_cents(250),
                quantity: 2,
                stock: 2,
            },
            CartLine {
                id: CartItemId::new(2),
                product_id: ProductId::new(2),
                name: "B".to_owned(),
                image_url: None,
                unit_price: Money::from_cents(1000),
                quantity: 1,
                stock: 5,
            },
        ];
        let view = CartView::new(&lines, "$");
        assert_eq!(view.total, "$15.00");
        assert_eq!(view.item_count, 3);
        assert!(!view.lines.first().unwrap().can_increment);
        assert!(view.lines.get(1).unwrap().can_increment);
    }

    #[test]
    fn test_layout_flash_ignores_empty() {
        let layout = Layout::new(&StoreSettings::default(), None, 0)
            .with_flash(Some(String::new()), Some("Out of stock".to_owned()));
        assert_eq!(layout.success, None);
        assert_eq!(layout.error.as_deref(), Some("Out of stock"));
        assert_eq!(layout.store_name, "GameStore");
    }
}
