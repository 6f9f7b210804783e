//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gamestore_core::catalog::{Sale, StockBadge, rarity_of};
use gamestore_core::{CategoryId, Money, ProductId, SubcategoryId};

/// A top-level category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// A subcategory, with its parent's name for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// A product as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub subcategory_id: SubcategoryId,
    pub name: String,
    pub description: String,
    /// List price, before any sale.
    pub price: Money,
    pub image_url: Option<String>,
    pub stock: i32,
    /// Free-form attributes; `rarity` is the one the UI understands.
    pub specifications: serde_json::Value,
    pub sale: Sale,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// What a buyer pays right now.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        self.sale.effective_price(self.price)
    }

    #[must_use]
    pub fn rarity(&self) -> Option<String> {
        rarity_of(&self.specifications)
    }

    #[must_use]
    pub const fn stock_badge(&self) -> StockBadge {
        StockBadge::for_stock(self.stock, self.sale.active)
    }
}

/// A product with the names of its subcategory and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListing {
    pub product: Product,
    pub subcategory_name: String,
    pub category_name: String,
    pub category_slug: String,
}

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub subcategory_id: SubcategoryId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub stock: i32,
    pub specifications: serde_json::Map<String, serde_json::Value>,
}

/// Editable product fields. An active sale is re-priced when `price` changes.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub stock: i32,
    pub specifications: serde_json::Map<String, serde_json::Value>,
}
