//! Purchase request snapshots and stock arithmetic.
//!
//! A purchase freezes the cart into [`LineItem`]s at checkout. Later edits to
//! a product never change an existing order. Checkout removes exactly the
//! snapshot quantities from stock (it is refused when stock is short), so
//! cancellation can hand back exactly [`Snapshot::stock_deltas`].

use core::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Money, ProductId, PurchaseId, UserId};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 9;

/// Human-readable purchase identifier, `PUR-<unix millis>-<9 base36 chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseNumber(String);

impl PurchaseNumber {
    /// Generate a new number stamped with `now`.
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self::generate_with(now, &mut rand::rng())
    }

    /// Generate using the given RNG.
    pub fn generate_with<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        Self(format!(
            "PUR-{}-{}",
            now.timestamp_millis(),
            random_base36(rng, SUFFIX_LEN)
        ))
    }

    /// Accept a number from a URL. Only the shape is checked.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("PUR-")?;
        let (millis, suffix) = rest.split_once('-')?;
        let valid = !millis.is_empty()
            && millis.bytes().all(|b| b.is_ascii_digit())
            && suffix.len() == SUFFIX_LEN
            && suffix.bytes().all(|b| BASE36.contains(&b));
        valid.then(|| Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PurchaseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Random uppercase base36 string, also used for upload file names.
pub fn random_base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| {
            BASE36
                .get(rng.random_range(0..BASE36.len()))
                .map_or('0', |b| char::from(*b))
        })
        .collect()
}

/// One frozen line of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price paid.
    pub price: Money,
    pub quantity: u32,
    /// `price * quantity`.
    pub total: Money,
}

impl LineItem {
    /// Freeze a cart line.
    #[must_use]
    pub fn new(product_id: ProductId, name: impl Into<String>, price: Money, quantity: u32) -> Self {
        Self {
            product_id,
            name: name.into(),
            price,
            quantity,
            total: price * quantity,
        }
    }
}

/// Line items plus their grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub items: Vec<LineItem>,
    pub total: Money,
}

impl Snapshot {
    /// Total the given lines. Returns `None` for an empty cart.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        let total = items.iter().map(|i| i.total).sum();
        Some(Self { items, total })
    }

    /// Per-product stock deltas, merged when a product appears twice and
    /// sorted by product ID. Every transaction that touches stock walks
    /// products in this order, so concurrent checkouts and cancellations
    /// lock rows in the same sequence and cannot deadlock.
    #[must_use]
    pub fn stock_deltas(&self) -> Vec<(ProductId, i32)> {
        let mut deltas: Vec<(ProductId, i32)> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let qty = i32::try_from(item.quantity).unwrap_or(i32::MAX);
            match deltas.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, d)) => *d = d.saturating_add(qty),
                None => deltas.push((item.product_id, qty)),
            }
        }
        deltas.sort_unstable_by_key(|(id, _)| *id);
        deltas
    }
}

/// Admin notification text for a new purchase request.
#[must_use]
pub fn new_purchase_message(
    number: &PurchaseNumber,
    total: Money,
    currency_symbol: &str,
    user: UserId,
) -> String {
    format!(
        "New purchase request {number} for {} from user ID {user}",
        total.display_with(currency_symbol)
    )
}

/// Admin notification text for a completed purchase.
#[must_use]
pub fn completed_message(id: PurchaseId) -> String {
    format!("Purchase request ID {id} has been marked as completed")
}

/// Admin notification text for a cancelled purchase.
#[must_use]
pub fn cancelled_message(id: PurchaseId) -> String {
    format!("Purchase request ID {id} has been cancelled and its stock restored")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[test]
    fn test_purchase_number_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let number = PurchaseNumber::generate_with(now(), &mut rng);
        let s = number.as_str();
        assert!(s.starts_with("PUR-1700000000123-"));
        assert_eq!(s.len(), "PUR-1700000000123-".len() + 9);
        assert_eq!(PurchaseNumber::parse(s), Some(number.clone()));
    }

    #[test]
    fn test_purchase_number_parse_rejects() {
        assert!(PurchaseNumber::parse("ORD-1-ABCDEFGHI").is_none());
        assert!(PurchaseNumber::parse("PUR-12-abcdefghi").is_none());
        assert!(PurchaseNumber::parse("PUR-12-ABC").is_none());
        assert!(PurchaseNumber::parse("PUR--ABCDEFGHI").is_none());
    }

    #[test]
    fn test_snapshot_totals() {
        let snapshot = Snapshot::from_items(vec![
            LineItem::new(ProductId::new(1), "Skin", Money::from_cents(499), 2),
            LineItem::new(ProductId::new(2), "Key", Money::from_cents(1500), 1),
        ])
        .unwrap();
        assert_eq!(snapshot.items[0].total, Money::from_cents(998));
        assert_eq!(snapshot.total, Money::from_cents(2498));
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(Snapshot::from_items(Vec::new()).is_none());
    }

    #[test]
    fn test_stock_deltas_merge_duplicates() {
        let snapshot = Snapshot::from_items(vec![
            LineItem::new(ProductId::new(1), "A", Money::from_cents(100), 2),
            LineItem::new(ProductId::new(2), "B", Money::from_cents(100), 1),
            LineItem::new(ProductId::new(1), "A", Money::from_cents(100), 3),
        ])
        .unwrap();
        assert_eq!(
            snapshot.stock_deltas(),
            vec![(ProductId::new(1), 5), (ProductId::new(2), 1)]
        );
    }

    #[test]
    fn test_stock_deltas_follow_product_order() {
        let forward = Snapshot::from_items(vec![
            LineItem::new(ProductId::new(3), "X", Money::from_cents(100), 1),
            LineItem::new(ProductId::new(8), "Y", Money::from_cents(100), 2),
        ])
        .unwrap();
        let backward = Snapshot::from_items(vec![
            LineItem::new(ProductId::new(8), "Y", Money::from_cents(100), 2),
            LineItem::new(ProductId::new(3), "X", Money::from_cents(100), 1),
        ])
        .unwrap();

        let expected = vec![(ProductId::new(3), 1), (ProductId::new(8), 2)];
        assert_eq!(forward.stock_deltas(), expected);
        assert_eq!(backward.stock_deltas(), expected);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let item = LineItem::new(ProductId::new(9), "Gem", Money::from_cents(250), 4);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["product_id"], 9);
        assert_eq!(json["quantity"], 4);
        assert_eq!(json["total"], "10.00");
    }

    #[test]
    fn test_messages() {
        let number = PurchaseNumber::parse("PUR-1-ABCDEFGHI").unwrap();
        assert_eq!(
            new_purchase_message(&number, Money::from_cents(1250), "€", UserId::new(3)),
            "New purchase request PUR-1-ABCDEFGHI for €12.50 from user ID 3"
        );
        assert_eq!(
            completed_message(PurchaseId::new(4)),
            "Purchase request ID 4 has been marked as completed"
        );
    }
}
