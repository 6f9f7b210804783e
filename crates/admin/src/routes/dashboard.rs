//! Dashboard: store totals and what needs attention.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tracing::instrument;

use gamestore_core::PurchaseStatus;
use gamestore_store::db::{ProductRepository, PurchaseRepository, UserRepository};

use super::{FlashQuery, page};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::AdminLayout;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: AdminLayout,
    pub product_count: i64,
    pub low_stock_count: i64,
    pub low_stock_threshold: i32,
    pub user_count: i64,
    pub pending_count: i64,
    pub completed_count: i64,
}

/// Dashboard page handler.
#[instrument(skip(state, admin, flash))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<DashboardTemplate> {
    let (settings, layout) = page(&state, Some(&admin), "dashboard", flash).await?;

    let products = ProductRepository::new(state.pool());
    let purchases = PurchaseRepository::new(state.pool());

    Ok(DashboardTemplate {
        layout,
        product_count: products.count().await?,
        low_stock_count: products
            .count_low_stock(settings.low_stock_threshold)
            .await?,
        low_stock_threshold: settings.low_stock_threshold,
        user_count: UserRepository::new(state.pool()).count().await?,
        pending_count: purchases.count_with_status(PurchaseStatus::Pending).await?,
        completed_count: purchases
            .count_with_status(PurchaseStatus::Completed)
            .await?,
    })
}
