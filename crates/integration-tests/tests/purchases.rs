//! Cart and purchase request workflow against a real database.
//!
//! Run with: cargo test -p gamestore-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use gamestore_core::catalog::SalePercentage;
use gamestore_core::{PurchaseId, PurchaseStatus};
use gamestore_integration_tests::{create_product, create_shopper, stock_of, test_pool};
use gamestore_store::db::{CartRepository, ProductRepository, PurchaseRepository};
use gamestore_store::services::{PurchaseError, PurchaseService};

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_adding_same_product_merges_lines() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let product = create_product(&pool, "5.00", 10).await;
    let cart = CartRepository::new(&pool);

    cart.add(shopper.id, product.id, 2).await.unwrap();
    cart.add(shopper.id, product.id, 3).await.unwrap();

    let lines = cart.lines(shopper.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.first().unwrap().quantity, 5);
    assert_eq!(cart.count(shopper.id).await.unwrap(), 5);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_cart_lines_use_sale_price() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let product = create_product(&pool, "10.00", 10).await;
    ProductRepository::new(&pool)
        .start_sale(product.id, SalePercentage::new(25).unwrap())
        .await
        .unwrap();

    let cart = CartRepository::new(&pool);
    cart.add(shopper.id, product.id, 1).await.unwrap();

    let line = cart.lines(shopper.id).await.unwrap().pop().unwrap();
    assert_eq!(line.unit_price.to_string(), "7.50");
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_checkout_takes_stock_and_clears_cart() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let sword = create_product(&pool, "4.50", 10).await;
    let shield = create_product(&pool, "2.25", 3).await;

    let cart = CartRepository::new(&pool);
    cart.add(shopper.id, sword.id, 2).await.unwrap();
    cart.add(shopper.id, shield.id, 3).await.unwrap();

    let purchase = PurchaseService::new(&pool)
        .create_from_cart(shopper.id, "$")
        .await
        .unwrap();

    assert_eq!(purchase.status, PurchaseStatus::Pending);
    assert_eq!(purchase.items.len(), 2);
    assert_eq!(purchase.total.to_string(), "15.75");
    assert!(purchase.number.to_string().starts_with("PUR-"));
    assert_eq!(purchase.user_id, Some(shopper.id));

    assert_eq!(stock_of(&pool, &sword).await, 8);
    assert_eq!(stock_of(&pool, &shield).await, 0);
    assert!(cart.lines(shopper.id).await.unwrap().is_empty());

    let history = PurchaseRepository::new(&pool)
        .list_for_user(shopper.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history.first().unwrap().id, purchase.id);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_checkout_with_empty_cart_is_rejected() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;

    let err = PurchaseService::new(&pool)
        .create_from_cart(shopper.id, "$")
        .await
        .unwrap_err();
    assert!(matches!(err, PurchaseError::EmptyCart));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_insufficient_stock_rolls_back_everything() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let plenty = create_product(&pool, "1.00", 50).await;
    let scarce = create_product(&pool, "1.00", 1).await;

    let cart = CartRepository::new(&pool);
    cart.add(shopper.id, plenty.id, 5).await.unwrap();
    cart.add(shopper.id, scarce.id, 2).await.unwrap();

    let err = PurchaseService::new(&pool)
        .create_from_cart(shopper.id, "$")
        .await
        .unwrap_err();
    match err {
        PurchaseError::InsufficientStock { name, available } => {
            assert_eq!(name, scarce.name);
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing was taken and the cart is untouched
    assert_eq!(stock_of(&pool, &plenty).await, 50);
    assert_eq!(stock_of(&pool, &scarce).await, 1);
    assert_eq!(cart.lines(shopper.id).await.unwrap().len(), 2);
    assert!(
        PurchaseRepository::new(&pool)
            .list_for_user(shopper.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_concurrent_checkouts_never_oversell() {
    let pool = test_pool().await;
    let product = create_product(&pool, "3.00", 1).await;

    let a = create_shopper(&pool).await;
    let b = create_shopper(&pool).await;
    let cart = CartRepository::new(&pool);
    cart.add(a.id, product.id, 1).await.unwrap();
    cart.add(b.id, product.id, 1).await.unwrap();

    let service = PurchaseService::new(&pool);
    let (first, second) = tokio::join!(
        service.create_from_cart(a.id, "$"),
        service.create_from_cart(b.id, "$"),
    );

    assert_eq!(
        usize::from(first.is_ok()) + usize::from(second.is_ok()),
        1,
        "exactly one checkout wins the last item"
    );
    assert_eq!(stock_of(&pool, &product).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_oversized_total_is_refused() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let product = create_product(&pool, "99999999.99", 20_000).await;

    let cart = CartRepository::new(&pool);
    cart.add(shopper.id, product.id, 10_001).await.unwrap();

    let err = PurchaseService::new(&pool)
        .create_from_cart(shopper.id, "$")
        .await
        .unwrap_err();
    assert!(matches!(err, PurchaseError::TotalTooLarge), "{err:?}");

    assert_eq!(stock_of(&pool, &product).await, 20_000);
    assert_eq!(cart.count(shopper.id).await.unwrap(), 10_001);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_opposite_cart_orders_do_not_deadlock() {
    let pool = test_pool().await;
    let x = create_product(&pool, "1.00", 10_000).await;
    let y = create_product(&pool, "1.00", 10_000).await;
    let a = create_shopper(&pool).await;
    let b = create_shopper(&pool).await;
    let cart = CartRepository::new(&pool);
    let service = PurchaseService::new(&pool);

    for _ in 0..30 {
        cart.add(a.id, x.id, 1).await.unwrap();
        cart.add(a.id, y.id, 1).await.unwrap();
        cart.add(b.id, y.id, 1).await.unwrap();
        cart.add(b.id, x.id, 1).await.unwrap();

        let (first, second) = tokio::join!(
            service.create_from_cart(a.id, "$"),
            service.create_from_cart(b.id, "$"),
        );
        first.unwrap();
        second.unwrap();
    }

    assert_eq!(stock_of(&pool, &x).await, 10_000 - 60);
    assert_eq!(stock_of(&pool, &y).await, 10_000 - 60);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_cancel_racing_checkout_does_not_deadlock() {
    let pool = test_pool().await;
    let x = create_product(&pool, "1.00", 10_000).await;
    let y = create_product(&pool, "1.00", 10_000).await;
    let a = create_shopper(&pool).await;
    let b = create_shopper(&pool).await;
    let cart = CartRepository::new(&pool);
    let service = PurchaseService::new(&pool);

    for _ in 0..30 {
        cart.add(a.id, x.id, 1).await.unwrap();
        cart.add(a.id, y.id, 1).await.unwrap();
        let pending = service.create_from_cart(a.id, "$").await.unwrap();

        cart.add(b.id, y.id, 1).await.unwrap();
        cart.add(b.id, x.id, 1).await.unwrap();

        let (cancelled, placed) = tokio::join!(
            service.cancel(pending.id),
            service.create_from_cart(b.id, "$"),
        );
        assert_eq!(cancelled.unwrap().status, PurchaseStatus::Cancelled);
        placed.unwrap();
    }

    // Only the checkouts of the second shopper keep their stock
    assert_eq!(stock_of(&pool, &x).await, 10_000 - 30);
    assert_eq!(stock_of(&pool, &y).await, 10_000 - 30);
}

// =============================================================================
// Fulfilment
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_cancel_returns_stock() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let product = create_product(&pool, "9.99", 4).await;

    CartRepository::new(&pool)
        .add(shopper.id, product.id, 3)
        .await
        .unwrap();
    let service = PurchaseService::new(&pool);
    let purchase = service.create_from_cart(shopper.id, "$").await.unwrap();
    assert_eq!(stock_of(&pool, &product).await, 1);

    let cancelled = service.cancel(purchase.id).await.unwrap();
    assert_eq!(cancelled.status, PurchaseStatus::Cancelled);
    assert_eq!(stock_of(&pool, &product).await, 4);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_complete_keeps_stock_taken() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let product = create_product(&pool, "9.99", 4).await;

    CartRepository::new(&pool)
        .add(shopper.id, product.id, 1)
        .await
        .unwrap();
    let service = PurchaseService::new(&pool);
    let purchase = service.create_from_cart(shopper.id, "$").await.unwrap();

    let completed = service.complete(purchase.id).await.unwrap();
    assert_eq!(completed.status, PurchaseStatus::Completed);
    assert_eq!(stock_of(&pool, &product).await, 3);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_finished_requests_cannot_change_again() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let product = create_product(&pool, "1.00", 10).await;
    let service = PurchaseService::new(&pool);
    let cart = CartRepository::new(&pool);

    cart.add(shopper.id, product.id, 2).await.unwrap();
    let completed = service.create_from_cart(shopper.id, "$").await.unwrap();
    service.complete(completed.id).await.unwrap();

    let err = service.cancel(completed.id).await.unwrap_err();
    assert!(matches!(
        err,
        PurchaseError::InvalidTransition {
            from: PurchaseStatus::Completed,
            to: PurchaseStatus::Cancelled,
        }
    ));
    // A refused cancel must not hand stock back
    assert_eq!(stock_of(&pool, &product).await, 8);

    cart.add(shopper.id, product.id, 1).await.unwrap();
    let cancelled = service.create_from_cart(shopper.id, "$").await.unwrap();
    service.cancel(cancelled.id).await.unwrap();
    assert_eq!(stock_of(&pool, &product).await, 8);

    assert!(matches!(
        service.cancel(cancelled.id).await.unwrap_err(),
        PurchaseError::InvalidTransition { .. }
    ));
    assert!(matches!(
        service.complete(cancelled.id).await.unwrap_err(),
        PurchaseError::InvalidTransition { .. }
    ));
    assert_eq!(stock_of(&pool, &product).await, 8);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_unknown_purchase_is_not_found() {
    let pool = test_pool().await;
    let err = PurchaseService::new(&pool)
        .complete(PurchaseId::new(i32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, PurchaseError::NotFound));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_snapshot_survives_price_changes() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let product = create_product(&pool, "20.00", 5).await;

    CartRepository::new(&pool)
        .add(shopper.id, product.id, 1)
        .await
        .unwrap();
    let purchase = PurchaseService::new(&pool)
        .create_from_cart(shopper.id, "$")
        .await
        .unwrap();

    ProductRepository::new(&pool)
        .start_sale(product.id, SalePercentage::new(50).unwrap())
        .await
        .unwrap();

    let stored = PurchaseRepository::new(&pool)
        .get(purchase.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total.to_string(), "20.00");
    assert_eq!(stored.items.first().unwrap().price.to_string(), "20.00");
}
