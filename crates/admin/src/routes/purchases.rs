//! Purchase request fulfilment.
//!
//! Payment happens on Discord; staff mark a request completed once paid and
//! delivered, or cancelled, which puts the stock back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use gamestore_core::PurchaseId;
use gamestore_store::db::PurchaseRepository;
use gamestore_store::services::{PurchaseError, PurchaseService};

use super::{Flash, FlashQuery, flash_repository_error, page, redirect_with, sentence};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::{AdminLayout, PurchaseRow};

/// Purchases page template.
#[derive(Template, WebTemplate)]
#[template(path = "purchases.html")]
pub struct PurchasesTemplate {
    pub layout: AdminLayout,
    pub purchases: Vec<PurchaseRow>,
    pub pending_count: usize,
}

/// Purchases page handler, newest first.
#[instrument(skip(state, admin, flash))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<PurchasesTemplate> {
    let (settings, layout) = page(&state, Some(&admin), "purchases", flash).await?;

    let purchases: Vec<PurchaseRow> = PurchaseRepository::new(state.pool())
        .list_all()
        .await?
        .iter()
        .map(|p| PurchaseRow::new(p, &settings.currency_symbol))
        .collect();
    let pending_count = purchases.iter().filter(|p| p.is_pending).count();

    Ok(PurchasesTemplate {
        layout,
        purchases,
        pending_count,
    })
}

/// Redirect for a workflow failure the admin can act on.
fn flash_purchase_error(err: PurchaseError) -> Result<Response> {
    match err {
        PurchaseError::InvalidTransition { .. } | PurchaseError::NotFound => Ok(redirect_with(
            "/purchases",
            Flash::Error,
            &sentence(&err.to_string()),
        )
        .into_response()),
        other => Err(other.into()),
    }
}

/// Mark a pending purchase completed.
#[instrument(skip(state, admin))]
pub async fn complete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    match PurchaseService::new(state.pool())
        .complete(PurchaseId::new(id))
        .await
    {
        Ok(purchase) => {
            tracing::info!(admin_id = %admin.id, purchase_id = id, "Purchase completed");
            Ok(redirect_with(
                "/purchases",
                Flash::Success,
                &format!("{} marked as completed", purchase.number),
            )
            .into_response())
        }
        Err(e) => flash_purchase_error(e),
    }
}

/// Cancel a pending purchase and restore its stock.
#[instrument(skip(state, admin))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    match PurchaseService::new(state.pool())
        .cancel(PurchaseId::new(id))
        .await
    {
        Ok(purchase) => {
            tracing::info!(admin_id = %admin.id, purchase_id = id, "Purchase cancelled");
            Ok(redirect_with(
                "/purchases",
                Flash::Success,
                &format!("{} cancelled and stock restored", purchase.number),
            )
            .into_response())
        }
        Err(e) => flash_purchase_error(e),
    }
}

/// Record that the buyer was contacted on Discord.
#[instrument(skip(state, admin))]
pub async fn chat_notified(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    match PurchaseRepository::new(state.pool())
        .mark_chat_notified(PurchaseId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(admin_id = %admin.id, purchase_id = id, "Buyer contacted");
            Ok(redirect_with("/purchases", Flash::Success, "Marked as contacted").into_response())
        }
        Err(e) => flash_repository_error("/purchases", e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gamestore_core::PurchaseStatus;
    use gamestore_store::RepositoryError;

    use super::*;

    #[test]
    fn test_double_transition_is_a_flash() {
        let response = flash_purchase_error(PurchaseError::InvalidTransition {
            from: PurchaseStatus::Completed,
            to: PurchaseStatus::Cancelled,
        })
        .unwrap();
        let location = response.headers().get("location").unwrap().to_str().unwrap();
        assert!(location.starts_with("/purchases?error=Purchase%20request%20is%20already%20completed"));
    }

    #[test]
    fn test_database_failure_is_an_error() {
        let err = flash_purchase_error(PurchaseError::Repository(RepositoryError::DataCorruption(
            "items".to_owned(),
        )));
        assert!(err.is_err());
    }
}
