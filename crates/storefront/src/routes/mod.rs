//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Catalog (optional ?q= name search)
//! GET  /health, /health/ready       - Health checks (see `app`)
//!
//! # Catalog
//! GET  /categories/{slug}           - One category, grouped by subcategory
//! GET  /products/{id}               - Product detail
//! GET  /guide                       - Buying guide
//!
//! # Cart (requires auth)
//! GET  /cart                        - Cart page
//! POST /cart/add                    - Add to cart
//! POST /cart/update                 - Set a line's quantity
//! POST /cart/remove                 - Remove a line
//! GET  /cart/count                  - Badge text ("0" for guests)
//!
//! # Checkout (requires auth)
//! POST /checkout                    - Turn the cart into a purchase request
//!
//! # Account (requires auth)
//! GET  /account                     - Purchase history
//! GET  /account/purchases/{number}  - One purchase request
//!
//! # Auth
//! GET  /auth/login, POST /auth/login
//! GET  /auth/register, POST /auth/register
//! POST /auth/logout
//! ```
//!
//! Form posts redirect back with `?success=` or `?error=` for the page to
//! show as a flash message.

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod guide;

use std::sync::Arc;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;

use gamestore_core::settings::StoreSettings;
use gamestore_store::db::CartRepository;

use crate::error::Result;
use crate::middleware::{auth_rate_limiter, cart_rate_limiter};
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::views::Layout;

/// `?success=` / `?error=` flash messages.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Settings plus the shared page chrome for `user`.
pub(crate) async fn page(
    state: &AppState,
    user: Option<&CurrentUser>,
    flash: FlashQuery,
) -> Result<(Arc<StoreSettings>, Layout)> {
    let settings = state.settings().await?;
    let cart_count = match user {
        Some(u) => CartRepository::new(state.pool()).count(u.id).await?,
        None => 0,
    };
    let layout = Layout::new(&settings, user, cart_count).with_flash(flash.success, flash.error);
    Ok((settings, layout))
}

/// Redirect to `path` with a URL-encoded flash message.
pub(crate) fn redirect_with(path: &str, kind: Flash, message: &str) -> Redirect {
    let sep = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{path}{sep}{}={}",
        kind.as_str(),
        urlencoding::encode(message)
    ))
}

/// Which flash slot a redirect fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flash {
    Success,
    Error,
}

impl Flash {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A same-site path to return to after a form post, or `fallback`.
pub(crate) fn local_path(candidate: Option<&str>, fallback: &str) -> String {
    candidate
        .filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
        .unwrap_or(fallback)
        .to_owned()
}

/// Create the auth routes router. Posts are rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add).layer(cart_rate_limiter()))
        .route("/update", post(cart::update).layer(cart_rate_limiter()))
        .route("/remove", post(cart::remove).layer(cart_rate_limiter()))
        .route("/count", get(cart::count))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/purchases/{number}", get(account::purchase))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::home))
        .route("/categories/{slug}", get(catalog::category))
        .route("/products/{id}", get(catalog::product))
        .route("/guide", get(guide::show))
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout).layer(cart_rate_limiter()))
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_rejects_offsite() {
        assert_eq!(local_path(Some("/products/3"), "/"), "/products/3");
        assert_eq!(local_path(Some("//evil.test/x"), "/"), "/");
        assert_eq!(local_path(Some("https://evil.test"), "/cart"), "/cart");
        assert_eq!(local_path(Some("/\\evil.test"), "/"), "/");
        assert_eq!(local_path(None, "/cart"), "/cart");
    }

    #[test]
    fn test_redirect_with_encodes_message() {
        use axum::response::IntoResponse;

        let response = redirect_with("/cart", Flash::Error, "only 2 in stock").into_response();
        let location = response.headers().get("location").unwrap();
        assert_eq!(location, "/cart?error=only%202%20in%20stock");

        let response = redirect_with("/?q=x", Flash::Success, "ok").into_response();
        assert_eq!(response.headers().get("location").unwrap(), "/?q=x&success=ok");
    }
}
