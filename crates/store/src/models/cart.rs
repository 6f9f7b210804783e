//! Cart domain types.

use gamestore_core::{CartItemId, Money, ProductId};

/// A cart row joined to its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    /// Effective unit price (sale price while a sale runs).
    pub unit_price: Money,
    pub quantity: i32,
    /// Current product stock.
    pub stock: i32,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * u32::try_from(self.quantity).unwrap_or(0)
    }
}
