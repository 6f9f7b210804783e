//! Catalog rules: slugs, sales, rarity and product ordering.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Money;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("Invalid regex"));

/// Stock at or below which the storefront shows "Only N left!".
pub const LOW_STOCK_BADGE: i32 = 5;

/// Errors from catalog input validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The name produced no usable slug characters.
    #[error("'{0}' does not produce a valid slug")]
    EmptySlug(String),
    /// Sale percentage outside 1..=99.
    #[error("sale percentage must be between 1 and 99, got {0}")]
    InvalidSalePercentage(i32),
    /// Specifications were not a JSON object.
    #[error("specifications must be a JSON object: {0}")]
    InvalidSpecifications(String),
    /// Negative price or stock.
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    /// Price above what the price columns hold.
    #[error("price cannot be more than {}", Money::MAX_PRICE)]
    PriceTooLarge,
}

/// Check a product price fits the catalog: not negative, at most
/// [`Money::MAX_PRICE`].
///
/// # Errors
///
/// Returns [`CatalogError::Negative`] or [`CatalogError::PriceTooLarge`].
pub fn check_price(price: Money) -> Result<Money, CatalogError> {
    if price.is_negative() {
        return Err(CatalogError::Negative("price"));
    }
    if price > Money::MAX_PRICE {
        return Err(CatalogError::PriceTooLarge);
    }
    Ok(price)
}

/// Turn a display name into a URL slug.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-` and trims dashes from both ends.
///
/// ```
/// use gamestore_core::catalog::slugify;
///
/// assert_eq!(slugify("Steam Keys & Gift Cards!"), "steam-keys-gift-cards");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_owned()
}

/// Use `explicit` if it is non-blank, otherwise derive a slug from `name`.
///
/// # Errors
///
/// Returns [`CatalogError::EmptySlug`] if the result is empty.
pub fn resolve_slug(name: &str, explicit: Option<&str>) -> Result<String, CatalogError> {
    let slug = match explicit.map(str::trim) {
        Some(s) if !s.is_empty() => slugify(s),
        _ => slugify(name),
    };
    if slug.is_empty() {
        return Err(CatalogError::EmptySlug(name.to_owned()));
    }
    Ok(slug)
}

/// A validated sale discount, 1 to 99 percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePercentage(u8);

impl SalePercentage {
    /// One-click discounts offered in the admin product editor.
    pub const PRESETS: [u8; 3] = [10, 20, 50];

    /// Validate a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidSalePercentage`] outside 1..=99.
    pub fn new(pct: i32) -> Result<Self, CatalogError> {
        match u8::try_from(pct) {
            Ok(p @ 1..=99) => Ok(Self(p)),
            _ => Err(CatalogError::InvalidSalePercentage(pct)),
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Discounted price, rounded to cents.
    #[must_use]
    pub fn apply(self, price: Money) -> Money {
        let factor = Decimal::from(100 - u32::from(self.0)) / Decimal::from(100);
        Money::new(price.amount() * factor)
    }
}

/// Sale columns of a product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sale {
    pub active: bool,
    pub percentage: i32,
    pub price: Option<Money>,
}

impl Sale {
    /// Sale state after applying `pct` to `price`.
    #[must_use]
    pub fn started(price: Money, pct: SalePercentage) -> Self {
        Self {
            active: true,
            percentage: i32::from(pct.get()),
            price: Some(pct.apply(price)),
        }
    }

    /// Sale state after a price edit; an active sale is re-priced.
    #[must_use]
    pub fn repriced(self, new_price: Money) -> Self {
        match SalePercentage::new(self.percentage) {
            Ok(pct) if self.active => Self::started(new_price, pct),
            _ => self,
        }
    }

    /// Price a buyer pays: the sale price while a sale is active.
    #[must_use]
    pub fn effective_price(&self, list_price: Money) -> Money {
        match (self.active, self.price) {
            (true, Some(p)) => p,
            _ => list_price,
        }
    }
}

/// Parse the admin's specifications text into a JSON object.
///
/// Blank input is an empty object.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidSpecifications`] for invalid JSON or a
/// non-object value.
pub fn parse_specifications(
    text: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, CatalogError> {
    if text.trim().is_empty() {
        return Ok(serde_json::Map::new());
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(CatalogError::InvalidSpecifications(format!(
            "expected object, got {other}"
        ))),
        Err(e) => Err(CatalogError::InvalidSpecifications(e.to_string())),
    }
}

/// The `rarity` value from a product's specifications, lowercased.
#[must_use]
pub fn rarity_of(specifications: &serde_json::Value) -> Option<String> {
    specifications
        .get("rarity")
        .and_then(serde_json::Value::as_str)
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
}

/// Stock label shown to shoppers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockBadge {
    OutOfStock,
    OnlyLeft(i32),
    InStock,
}

impl StockBadge {
    /// Badge for a stock level. A product on sale shows its sale badge
    /// instead of the low-stock one.
    #[must_use]
    pub const fn for_stock(stock: i32, on_sale: bool) -> Self {
        if stock <= 0 {
            Self::OutOfStock
        } else if stock <= LOW_STOCK_BADGE && !on_sale {
            Self::OnlyLeft(stock)
        } else {
            Self::InStock
        }
    }
}

/// Admin product list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    Price,
    Stock,
    Category,
}

impl ProductSort {
    /// `ORDER BY` clause for this sort. Only ever one of these literals.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Name => "p.name ASC",
            Self::Price => "p.price ASC, p.name ASC",
            Self::Stock => "p.stock ASC, p.name ASC",
            Self::Category => "c.name ASC, s.name ASC, p.name ASC",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Stock => "stock",
            Self::Category => "category",
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "stock" => Ok(Self::Stock),
            "category" => Ok(Self::Category),
            _ => Err(format!("invalid sort: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Counter-Strike 2"), "counter-strike-2");
        assert_eq!(slugify("  --Rare Skins--  "), "rare-skins");
        assert_eq!(slugify("ÄÖÜ"), "");
    }

    #[test]
    fn test_resolve_slug_prefers_explicit() {
        assert_eq!(resolve_slug("Gift Cards", Some("gc")).unwrap(), "gc");
        assert_eq!(resolve_slug("Gift Cards", Some("  ")).unwrap(), "gift-cards");
        assert!(matches!(
            resolve_slug("!!!", None),
            Err(CatalogError::EmptySlug(_))
        ));
    }

    #[test]
    fn test_sale_percentage_bounds() {
        assert!(SalePercentage::new(0).is_err());
        assert!(SalePercentage::new(100).is_err());
        assert!(SalePercentage::new(-5).is_err());
        assert_eq!(SalePercentage::new(99).unwrap().get(), 99);
    }

    #[test]
    fn test_check_price_bounds() {
        assert_eq!(check_price(Money::ZERO), Ok(Money::ZERO));
        assert_eq!(check_price(Money::MAX_PRICE), Ok(Money::MAX_PRICE));
        assert_eq!(
            check_price("100000000.00".parse().unwrap()),
            Err(CatalogError::PriceTooLarge)
        );
        assert_eq!(
            check_price("-0.01".parse().unwrap()),
            Err(CatalogError::Negative("price"))
        );
    }

    #[test]
    fn test_sale_price_rounding() {
        let pct = SalePercentage::new(20).unwrap();
        assert_eq!(pct.apply(Money::from_cents(999)), Money::from_cents(799));
        let pct = SalePercentage::new(33).unwrap();
        assert_eq!(pct.apply(Money::from_cents(1000)), Money::from_cents(670));
    }

    #[test]
    fn test_repriced_sale_follows_price() {
        let sale = Sale::started(Money::from_cents(1000), SalePercentage::new(50).unwrap());
        let sale = sale.repriced(Money::from_cents(2000));
        assert_eq!(sale.price, Some(Money::from_cents(1000)));

        let none = Sale::default().repriced(Money::from_cents(2000));
        assert_eq!(none, Sale::default());
    }

    #[test]
    fn test_effective_price() {
        let list = Money::from_cents(1000);
        assert_eq!(Sale::default().effective_price(list), list);
        let sale = Sale::started(list, SalePercentage::new(10).unwrap());
        assert_eq!(sale.effective_price(list), Money::from_cents(900));
    }

    #[test]
    fn test_parse_specifications() {
        assert!(parse_specifications("").unwrap().is_empty());
        let map = parse_specifications(r#"{"rarity":"Legendary"}"#).unwrap();
        assert_eq!(map.get("rarity").unwrap(), "Legendary");
        assert!(parse_specifications("[1,2]").is_err());
        assert!(parse_specifications("{nope").is_err());
    }

    #[test]
    fn test_rarity_of() {
        let specs = serde_json::json!({ "rarity": " Epic " });
        assert_eq!(rarity_of(&specs).as_deref(), Some("epic"));
        assert_eq!(rarity_of(&serde_json::json!({})), None);
    }

    #[test]
    fn test_stock_badge() {
        assert_eq!(StockBadge::for_stock(0, false), StockBadge::OutOfStock);
        assert_eq!(StockBadge::for_stock(5, false), StockBadge::OnlyLeft(5));
        assert_eq!(StockBadge::for_stock(5, true), StockBadge::InStock);
        assert_eq!(StockBadge::for_stock(6, false), StockBadge::InStock);
    }

    #[test]
    fn test_product_sort_parse() {
        assert_eq!("stock".parse::<ProductSort>().unwrap(), ProductSort::Stock);
        assert!("random".parse::<ProductSort>().is_err());
    }
}
