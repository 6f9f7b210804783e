//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready            - Health checks (see `app`)
//!
//! # Auth
//! GET  /auth/login, POST /auth/login
//! POST /auth/logout
//!
//! # Everything below requires an admin
//! GET  /                                  - Dashboard
//! GET  /products                          - Product table (?q=, ?sort=)
//! POST /products                          - Create product
//! GET  /products/{id}/edit                - Edit form
//! POST /products/{id}                     - Update product
//! POST /products/{id}/delete
//! POST /products/{id}/sale                - Start a sale
//! POST /products/{id}/sale/remove         - End a sale
//! GET  /categories                        - Categories and subcategories
//! POST /categories, /categories/{id}/delete
//! POST /subcategories, /subcategories/{id}/delete
//! GET  /users                             - Accounts
//! POST /users/{id}/promote, /users/{id}/demote
//! GET  /purchases                         - Purchase requests
//! POST /purchases/{id}/complete, /purchases/{id}/cancel
//! POST /purchases/{id}/chat-notified      - Buyer contacted on Discord
//! GET  /notifications
//! POST /notifications/{id}/read, /notifications/read-all
//! GET  /settings, POST /settings          - One editable key per post
//! POST /settings/testing-mode
//! POST /settings/rarities                 - Add rarity
//! POST /settings/rarities/{name}/color, /delete, /move
//! POST /settings/payment-methods
//! GET  /images, POST /images              - Image library (multipart upload)
//! POST /images/{id}/delete
//! GET  /guide                             - Admin guide
//! ```
//!
//! Form posts redirect back with `?success=` or `?error=` for the page to
//! show as a flash message.

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod guide;
pub mod images;
pub mod notifications;
pub mod products;
pub mod purchases;
pub mod settings;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use gamestore_core::settings::StoreSettings;
use gamestore_store::RepositoryError;
use gamestore_store::db::{NotificationRepository, SettingsRepository};

use crate::error::Result;
use crate::models::CurrentAdmin;
use crate::state::AppState;
use crate::views::AdminLayout;

/// Room for multipart boundaries and the other form fields on top of the
/// file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// `?success=` / `?error=` flash messages.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Fresh settings plus the shared page chrome.
pub(crate) async fn page(
    state: &AppState,
    admin: Option<&CurrentAdmin>,
    active: &'static str,
    flash: FlashQuery,
) -> Result<(StoreSettings, AdminLayout)> {
    let settings = SettingsRepository::new(state.pool()).load().await?;
    let unread = match admin {
        Some(_) => NotificationRepository::new(state.pool()).unread_count().await?,
        None => 0,
    };
    let layout =
        AdminLayout::new(&settings, admin, unread, active).with_flash(flash.success, flash.error);
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

/// Turn a conflict or a missing row into an error flash on `path`; any
/// other repository failure is a server error.
pub(crate) fn flash_repository_error(path: &str, err: RepositoryError) -> Result<Response> {
    match err {
        RepositoryError::Conflict(msg) => {
            Ok(redirect_with(path, Flash::Error, &sentence(&msg)).into_response())
        }
        RepositoryError::NotFound => {
            Ok(redirect_with(path, Flash::Error, "It no longer exists").into_response())
        }
        other => Err(other.into()),
    }
}

/// Capitalize the first letter of an error message for display.
pub(crate) fn sentence(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
        .route("/{id}/sale", post(products::start_sale))
        .route("/{id}/sale/remove", post(products::end_sale))
}

/// Create the settings routes router.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(settings::show).post(settings::update))
        .route("/testing-mode", post(settings::toggle_testing_mode))
        .route("/rarities", post(settings::add_rarity))
        .route("/rarities/{name}/color", post(settings::recolor_rarity))
        .route("/rarities/{name}/delete", post(settings::delete_rarity))
        .route("/rarities/{name}/move", post(settings::move_rarity))
        .route("/payment-methods", post(settings::update_payment_methods))
}

/// Create all routes for the admin console.
///
/// `max_upload_bytes` bounds the image upload body.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .route("/categories", get(catalog::index).post(catalog::create_category))
        .route("/categories/{id}/delete", post(catalog::delete_category))
        .route("/subcategories", post(catalog::create_subcategory))
        .route("/subcategories/{id}/delete", post(catalog::delete_subcategory))
        .route("/users", get(users::index))
        .route("/users/{id}/promote", post(users::promote))
        .route("/users/{id}/demote", post(users::demote))
        .route("/purchases", get(purchases::index))
        .route("/purchases/{id}/complete", post(purchases::complete))
        .route("/purchases/{id}/cancel", post(purchases::cancel))
        .route("/purchases/{id}/chat-notified", post(purchases::chat_notified))
        .route("/notifications", get(notifications::index))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .nest("/settings", settings_routes())
        .route(
            "/images",
            get(images::index)
                .post(images::upload)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .route("/images/{id}/delete", post(images::delete))
        .route("/guide", get(guide::show))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_with_encodes_message() {
        let response =
            redirect_with("/products", Flash::Error, "name is required").into_response();
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/products?error=name%20is%20required"
        );

        let response = redirect_with("/products?q=gem", Flash::Success, "Saved").into_response();
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/products?q=gem&success=Saved"
        );
    }

    #[test]
    fn test_conflict_becomes_flash() {
        let response = flash_repository_error(
            "/categories",
            RepositoryError::Conflict("a category with this slug already exists".to_owned()),
        )
        .unwrap();
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/categories?error=A%20category%20with%20this%20slug%20already%20exists"
        );

        assert!(
            flash_repository_error(
                "/categories",
                RepositoryError::DataCorruption("bad row".to_owned())
            )
            .is_err()
        );
    }

    #[test]
    fn test_sentence() {
        assert_eq!(sentence("rarity 'epic' already exists"), "Rarity 'epic' already exists");
        assert_eq!(sentence(""), "");
    }
}
