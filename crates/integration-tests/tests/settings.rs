//! Settings, catalog constraints and notifications against a real database.
//!
//! Run with: cargo test -p gamestore-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use gamestore_core::settings::{PaymentMethods, keys, validate_editable};
use gamestore_core::{Email, ProductId};
use gamestore_integration_tests::{
    create_product, create_shopper, create_subcategory, test_pool, unique,
};
use gamestore_store::RepositoryError;
use gamestore_store::db::{
    CartRepository, CategoryRepository, ProductRepository, SettingsRepository,
};
use gamestore_store::services::{AuthError, AuthService, PurchaseService};

/// Settings are global, so every settings assertion lives in this one test
/// and puts the previous values back.
#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_settings_round_trip() {
    let pool = test_pool().await;
    let repo = SettingsRepository::new(&pool);
    let before = repo.all().await.unwrap();

    let (key, value) = validate_editable(keys::LOW_STOCK_THRESHOLD, " 7 ").unwrap();
    repo.set(key, &value).await.unwrap();
    repo.set(keys::STORE_NAME, "Loot Den").await.unwrap();
    let settings = repo.load().await.unwrap();
    assert_eq!(settings.low_stock_threshold, 7);
    assert_eq!(settings.store_name, "Loot Den");
    assert!(settings.is_low_stock(7));
    assert!(!settings.is_low_stock(8));

    let mut palette = settings.rarities.clone();
    palette.add("Legendary", "#F59E0B").unwrap();
    palette.add("common", "#9CA3AF").unwrap();
    palette.shift("common", true).unwrap();
    let (colors, order) = palette.to_settings();
    repo.set_many(&[(keys::RARITY_COLORS, colors.as_str()), (keys::RARITY_ORDER, order.as_str())])
        .await
        .unwrap();
    let reloaded = repo.load().await.unwrap().rarities;
    assert_eq!(reloaded, palette);
    assert_eq!(reloaded.color_of("legendary"), "#F59E0B");

    let mut methods = PaymentMethods::from_setting(Some("{}"));
    methods.set("cash_app", true).unwrap();
    repo.set(keys::PAYMENT_METHODS, &methods.to_setting())
        .await
        .unwrap();
    let stored = repo.load().await.unwrap().payment_methods;
    assert!(stored.is_enabled("cash_app"));
    assert!(!stored.is_enabled("paypal"));

    // Restore
    for key in [
        keys::LOW_STOCK_THRESHOLD,
        keys::STORE_NAME,
        keys::RARITY_COLORS,
        keys::RARITY_ORDER,
        keys::PAYMENT_METHODS,
    ] {
        match before.get(key) {
            Some(old) => repo.set(key, old).await.unwrap(),
            None => {
                sqlx::query("DELETE FROM store.admin_setting WHERE setting_key = $1")
                    .bind(key)
                    .execute(&pool)
                    .await
                    .unwrap();
            }
        }
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_duplicate_slugs_conflict() {
    let pool = test_pool().await;
    let repo = CategoryRepository::new(&pool);
    let slug = format!("dup-{}", unique());

    let category = repo.create("First", &slug).await.unwrap();
    assert!(matches!(
        repo.create("Second", &slug).await.unwrap_err(),
        RepositoryError::Conflict(_)
    ));

    repo.create_subcategory(category.id, "Skins", "skins")
        .await
        .unwrap();
    assert!(matches!(
        repo.create_subcategory(category.id, "Skins again", "skins")
            .await
            .unwrap_err(),
        RepositoryError::Conflict(_)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_deleting_category_cascades_to_products() {
    let pool = test_pool().await;
    let product = create_product(&pool, "1.00", 1).await;
    let listing = ProductRepository::new(&pool)
        .get(product.id)
        .await
        .unwrap()
        .unwrap();

    let categories = CategoryRepository::new(&pool);
    let category = categories
        .get_by_slug(&listing.category_slug)
        .await
        .unwrap()
        .unwrap();
    categories.delete(category.id).await.unwrap();

    assert!(
        ProductRepository::new(&pool)
            .get(product.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_product_needs_existing_subcategory() {
    let pool = test_pool().await;
    let (_, subcategory_id) = create_subcategory(&pool).await;
    CategoryRepository::new(&pool)
        .delete_subcategory(subcategory_id)
        .await
        .unwrap();

    let err = ProductRepository::new(&pool)
        .create(&gamestore_store::models::NewProduct {
            subcategory_id,
            name: "Orphan".to_owned(),
            description: String::new(),
            price: "1.00".parse().unwrap(),
            image_url: None,
            stock: 1,
            specifications: serde_json::Map::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));

    assert!(matches!(
        ProductRepository::new(&pool)
            .delete(ProductId::new(i32::MAX))
            .await
            .unwrap_err(),
        RepositoryError::NotFound
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_register_login_and_promote() {
    let pool = test_pool().await;
    let auth = AuthService::new(&pool);
    let email = format!("player-{}@example.com", unique());

    let user = auth.register(&email, "hunter22", "hunter22").await.unwrap();
    assert!(!user.is_admin);
    assert!(matches!(
        auth.register(&email, "hunter22", "hunter22").await.unwrap_err(),
        AuthError::UserAlreadyExists
    ));

    assert_eq!(auth.login(&email, "hunter22").await.unwrap().id, user.id);
    assert!(matches!(
        auth.login(&email, "wrong-password").await.unwrap_err(),
        AuthError::InvalidCredentials
    ));

    // An unknown email fails exactly like a wrong password
    let stranger = format!("nobody-{}@example.com", unique());
    assert!(matches!(
        auth.login(&stranger, "hunter22").await.unwrap_err(),
        AuthError::InvalidCredentials
    ));
    assert!(matches!(
        auth.login("not an email", "hunter22").await.unwrap_err(),
        AuthError::InvalidCredentials
    ));

    let promoted = auth.set_admin_by_email(&email, true).await.unwrap();
    assert!(promoted.is_admin);
    assert!(auth.get_user(user.id).await.unwrap().is_admin);

    // Email lookups are case-insensitive
    let upper = Email::parse(&email.to_uppercase()).unwrap();
    assert_eq!(upper.to_string(), email);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_checkout_notifies_admins() {
    let pool = test_pool().await;
    let shopper = create_shopper(&pool).await;
    let product = create_product(&pool, "2.00", 5).await;

    CartRepository::new(&pool)
        .add(shopper.id, product.id, 1)
        .await
        .unwrap();
    let purchase = PurchaseService::new(&pool)
        .create_from_cart(shopper.id, "$")
        .await
        .unwrap();

    let notifications = gamestore_store::db::NotificationRepository::new(&pool)
        .list()
        .await
        .unwrap();
    assert!(
        notifications
            .iter()
            .any(|n| n.message.contains(&purchase.number.to_string())),
        "a notification mentions {}",
        purchase.number
    );
}
