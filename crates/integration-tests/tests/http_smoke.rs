//! Smoke tests against running storefront and admin servers.
//!
//! Start both binaries first, then run:
//! cargo test -p gamestore-integration-tests --test http_smoke -- --ignored

#![allow(clippy::unwrap_used)]

use gamestore_integration_tests::unique;
use reqwest::{Client, StatusCode, redirect::Policy};

fn storefront_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

fn admin_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_owned())
}

/// Redirects are asserted on, not followed.
fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .cookie_store(true)
        .build()
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_health_endpoints() {
    let client = client();
    for base in [storefront_url(), admin_url()] {
        let resp = client.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{base}/health");

        let resp = client
            .get(format!("{base}/health/ready"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{base}/health/ready");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_admin_requires_login() {
    let resp = client().get(admin_url()).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers().get("location").unwrap().to_str().unwrap();
    assert!(location.starts_with("/auth/login"), "{location}");
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_storefront_register_and_browse() {
    let client = client();
    let base = storefront_url();

    let resp = client.get(&base).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Anonymous visitors are sent to sign in
    let resp = client.get(format!("{base}/account")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let email = format!("smoke-{}@example.com", unique());
    let resp = client
        .post(format!("{base}/auth/register"))
        .form(&[
            ("email", email.as_str()),
            ("password", "smoke-pass"),
            ("password_confirm", "smoke-pass"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client.get(format!("{base}/account")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(count, "0");
}
