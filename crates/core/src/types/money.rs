//! Decimal money amounts.
//!
//! Prices are stored as `NUMERIC(10,2)`, purchase totals as `NUMERIC(14,2)`,
//! and both are carried as [`rust_decimal::Decimal`] so line totals and sale
//! prices never pick up float rounding. The store runs
//! in a single currency whose symbol is an admin setting, so `Money` carries
//! only the amount and takes the symbol at display time.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount in the store currency, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest product price the `NUMERIC(10,2)` price columns hold.
    pub const MAX_PRICE: Self = Self(Decimal::from_parts(1_410_065_407, 2, 0, false, 2));

    /// Largest purchase total the `NUMERIC(14,2)` total column holds.
    pub const MAX_TOTAL: Self = Self(Decimal::from_parts(276_447_231, 23_283, 0, false, 2));

    /// Wrap an amount, rounding half away from zero to two decimal places.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Build an amount from whole cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// True when the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Format with a currency symbol prefix, e.g. `€12.50`.
    #[must_use]
    pub fn display_with(&self, symbol: &str) -> String {
        format!("{symbol}{:.2}", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl core::str::FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str_exact(s.trim()).map(Self::new)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(1999).to_string(), "19.99");
        assert_eq!(Money::from_cents(0), Money::ZERO);
    }

    #[test]
    fn test_new_rounds_to_cents() {
        let m = Money::new(Decimal::new(12345, 3));
        assert_eq!(m.to_string(), "12.35");
    }

    #[test]
    fn test_display_with_symbol() {
        let m: Money = "7.5".parse().unwrap();
        assert_eq!(m.display_with("€"), "€7.50");
    }

    #[test]
    fn test_line_total_and_sum() {
        let unit = Money::from_cents(250);
        let total: Money = [unit * 3, Money::from_cents(100)].into_iter().sum();
        assert_eq!(total, Money::from_cents(850));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_column_limits() {
        assert_eq!(Money::MAX_PRICE.to_string(), "99999999.99");
        assert_eq!(Money::MAX_TOTAL.to_string(), "999999999999.99");
        assert!(Money::MAX_PRICE < Money::MAX_TOTAL);
    }

    #[test]
    fn test_is_negative() {
        assert!("-1".parse::<Money>().unwrap().is_negative());
        assert!(!Money::ZERO.is_negative());
    }
}
