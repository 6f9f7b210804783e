//! Cart quantity rules.
//!
//! The cart table only stores `(user, product, quantity)`; what a shopper may
//! do with a line depends on the product's current stock.

/// What should happen to a cart line after a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Delete the row.
    Remove,
    /// Store this quantity.
    Set(i32),
}

/// Why an item cannot be added.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartError {
    #[error("this product is out of stock")]
    OutOfStock,
    #[error("only {available} in stock")]
    ExceedsStock { available: i32 },
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Resolve a requested quantity for an existing line.
///
/// Zero or less removes the line. Anything above stock is clamped down to
/// stock; a product that ran out while sitting in the cart is removed.
#[must_use]
pub fn resolve_update(requested: i32, stock: i32) -> QuantityChange {
    if requested <= 0 || stock <= 0 {
        QuantityChange::Remove
    } else {
        QuantityChange::Set(requested.min(stock))
    }
}

/// Check an add-to-cart request against stock and what is already in the cart.
///
/// # Errors
///
/// Returns [`CartError`] when the add would exceed stock.
pub const fn check_add(adding: i32, in_cart: i32, stock: i32) -> Result<(), CartError> {
    if adding <= 0 {
        return Err(CartError::InvalidQuantity);
    }
    if stock <= 0 {
        return Err(CartError::OutOfStock);
    }
    if in_cart.saturating_add(adding) > stock {
        return Err(CartError::ExceedsStock { available: stock });
    }
    Ok(())
}

/// Whether the "+" button should be enabled for a line.
#[must_use]
pub const fn can_increment(quantity: i32, stock: i32) -> bool {
    quantity < stock
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_to_zero_removes() {
        assert_eq!(resolve_update(0, 10), QuantityChange::Remove);
        assert_eq!(resolve_update(-3, 10), QuantityChange::Remove);
    }

    #[test]
    fn test_update_clamps_to_stock() {
        assert_eq!(resolve_update(12, 4), QuantityChange::Set(4));
        assert_eq!(resolve_update(2, 4), QuantityChange::Set(2));
        assert_eq!(resolve_update(2, 0), QuantityChange::Remove);
    }

    #[test]
    fn test_check_add() {
        assert_eq!(check_add(1, 0, 3), Ok(()));
        assert_eq!(check_add(1, 3, 3), Err(CartError::ExceedsStock { available: 3 }));
        assert_eq!(check_add(1, 0, 0), Err(CartError::OutOfStock));
        assert_eq!(check_add(0, 0, 3), Err(CartError::InvalidQuantity));
    }

    #[test]
    fn test_can_increment() {
        assert!(can_increment(2, 3));
        assert!(!can_increment(3, 3));
    }
}
