//! Cart and checkout route handlers.
//!
//! Cart rows live in the database keyed by user, so the cart follows the
//! shopper across devices. Every mutation is a plain form post that
//! redirects back with a flash message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use gamestore_core::cart::{QuantityChange, check_add, resolve_update};
use gamestore_core::{CartItemId, ProductId};
use gamestore_store::db::{CartRepository, ProductRepository};
use gamestore_store::services::{PurchaseError, PurchaseService};

use super::{Flash, FlashQuery, local_path, page, redirect_with};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;
use crate::views::{CartView, Layout};

// =============================================================================
// Form Types
// =============================================================================

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<i32>,
    /// Page to return to, defaults to the product page.
    pub return_to: Option<String>,
}

/// Quantity change form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: i32,
    pub quantity: i32,
}

/// Remove-line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: i32,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub discord_link: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, user, flash), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<CartTemplate> {
    let (settings, layout) = page(&state, Some(&user), flash).await?;
    let lines = CartRepository::new(state.pool()).lines(user.id).await?;

    Ok(CartTemplate {
        layout,
        cart: CartView::new(&lines, &settings.currency_symbol),
        discord_link: settings.discord_server_link.clone(),
    })
}

/// Add a product to the cart, merging into an existing line.
#[instrument(skip(state, user, form), fields(user_id = %user.id, product_id = form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let product_id = ProductId::new(form.product_id);
    let back = local_path(
        form.return_to.as_deref(),
        &format!("/products/{}", form.product_id),
    );

    let Some(listing) = ProductRepository::new(state.pool()).get(product_id).await? else {
        return Ok(redirect_with(&back, Flash::Error, "That product no longer exists"));
    };
    let product = listing.product;

    let carts = CartRepository::new(state.pool());
    let adding = form.quantity.unwrap_or(1);
    let in_cart = carts.quantity_of(user.id, product_id).await?;

    if let Err(e) = check_add(adding, in_cart, product.stock) {
        tracing::debug!(in_cart, stock = product.stock, "Add to cart refused: {e}");
        return Ok(redirect_with(&back, Flash::Error, &capitalize(&e.to_string())));
    }

    carts.add(user.id, product_id, adding).await?;
    add_breadcrumb("cart", "Added to cart", Some(&[("product", product.name.as_str())]));

    Ok(redirect_with(
        &back,
        Flash::Success,
        &format!("Added {} to your cart", product.name),
    ))
}

/// Set a line's quantity. Zero removes the line; more than stock is clamped.
#[instrument(skip(state, user, form), fields(user_id = %user.id, item_id = form.item_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let carts = CartRepository::new(state.pool());
    let item = CartItemId::new(form.item_id);

    let Some(line) = carts
        .lines(user.id)
        .await?
        .into_iter()
        .find(|l| l.id == item)
    else {
        return Ok(redirect_with("/cart", Flash::Error, "That item is not in your cart"));
    };

    match resolve_update(form.quantity, line.stock) {
        QuantityChange::Remove => {
            carts.remove(user.id, item).await?;
            Ok(redirect_with(
                "/cart",
                Flash::Success,
                &format!("Removed {} from your cart", line.name),
            ))
        }
        QuantityChange::Set(quantity) => {
            carts.set_quantity(user.id, item, quantity).await?;
            if quantity < form.quantity {
                Ok(redirect_with(
                    "/cart",
                    Flash::Error,
                    &format!("Only {quantity} of {} in stock", line.name),
                ))
            } else {
                Ok(Redirect::to("/cart"))
            }
        }
    }
}

/// Remove a line from the cart.
#[instrument(skip(state, user, form), fields(user_id = %user.id, item_id = form.item_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    match CartRepository::new(state.pool())
        .remove(user.id, CartItemId::new(form.item_id))
        .await
    {
        Ok(()) => Ok(redirect_with("/cart", Flash::Success, "Item removed")),
        Err(gamestore_store::RepositoryError::NotFound) => Ok(redirect_with(
            "/cart",
            Flash::Error,
            "That item is not in your cart",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Number of units in the cart as plain text, `0` for guests.
pub async fn count(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> Response {
    let Some(user) = user else {
        return "0".into_response();
    };

    match CartRepository::new(state.pool()).count(user.id).await {
        Ok(n) => n.to_string().into_response(),
        Err(e) => {
            tracing::warn!("Failed to count cart: {e}");
            "0".into_response()
        }
    }
}

/// Turn the cart into a pending purchase request.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    let settings = state.settings().await?;

    match PurchaseService::new(state.pool())
        .create_from_cart(user.id, &settings.currency_symbol)
        .await
    {
        Ok(purchase) => {
            add_breadcrumb(
                "checkout",
                "Purchase request created",
                Some(&[("number", purchase.number.as_str())]),
            );
            Ok(redirect_with(
                &format!("/account/purchases/{}", purchase.number),
                Flash::Success,
                "Purchase request created. Join our Discord to complete payment.",
            ))
        }
        Err(e) => match refusal_message(&e) {
            Some(message) => {
                tracing::info!("Checkout refused: {e}");
                Ok(redirect_with("/cart", Flash::Error, &message))
            }
            None => Err(AppError::from(e)),
        },
    }
}

/// Flash text for a checkout the shopper can fix; `None` for server failures.
fn refusal_message(err: &PurchaseError) -> Option<String> {
    match err {
        PurchaseError::EmptyCart
        | PurchaseError::InsufficientStock { .. }
        | PurchaseError::TotalTooLarge => Some(capitalize(&err.to_string())),
        PurchaseError::NotFound
        | PurchaseError::InvalidTransition { .. }
        | PurchaseError::Repository(_) => None,
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusals_become_cart_flashes() {
        assert_eq!(
            refusal_message(&PurchaseError::EmptyCart).as_deref(),
            Some("Your cart is empty")
        );
        assert!(
            refusal_message(&PurchaseError::TotalTooLarge)
                .unwrap_or_default()
                .starts_with("Your order total is over")
        );
        assert!(
            refusal_message(&PurchaseError::Repository(
                gamestore_store::RepositoryError::NotFound
            ))
            .is_none()
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("only 3 in stock"), "Only 3 in stock");
        assert_eq!(capitalize(""), "");
    }
}
