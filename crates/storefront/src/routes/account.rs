//! Account route handlers: purchase history and purchase detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use tracing::instrument;

use gamestore_core::purchase::PurchaseNumber;
use gamestore_store::db::PurchaseRepository;

use super::{FlashQuery, page};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::views::{Layout, PurchaseView};

/// Purchase history template.
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub layout: Layout,
    pub email: String,
    pub purchases: Vec<PurchaseView>,
}

/// Single purchase template.
#[derive(Template, WebTemplate)]
#[template(path = "purchase.html")]
pub struct PurchaseTemplate {
    pub layout: Layout,
    pub purchase: PurchaseView,
    pub is_pending: bool,
    pub discord_link: String,
    pub delivery_time: Option<String>,
}

/// Display the signed-in user's purchase requests, newest first.
#[instrument(skip(state, user, flash), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<AccountTemplate> {
    let (settings, layout) = page(&state, Some(&user), flash).await?;
    let purchases = PurchaseRepository::new(state.pool())
        .list_for_user(user.id)
        .await?
        .iter()
        .map(|p| PurchaseView::new(p, &settings.currency_symbol))
        .collect();

    Ok(AccountTemplate {
        layout,
        email: user.email.to_string(),
        purchases,
    })
}

/// Display one purchase request with payment instructions.
///
/// Other users' purchases are reported as not found.
#[instrument(skip(state, user, flash), fields(user_id = %user.id))]
pub async fn purchase(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(number): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Result<PurchaseTemplate> {
    let not_found = || AppError::NotFound(format!("purchase {number}"));
    let parsed = PurchaseNumber::parse(&number).ok_or_else(not_found)?;

    let (settings, layout) = page(&state, Some(&user), flash).await?;
    let purchase = PurchaseRepository::new(state.pool())
        .get_for_user(&parsed, user.id)
        .await?
        .ok_or_else(not_found)?;

    Ok(PurchaseTemplate {
        layout,
        is_pending: purchase.status == gamestore_core::PurchaseStatus::Pending,
        purchase: PurchaseView::new(&purchase, &settings.currency_symbol),
        discord_link: settings.discord_server_link.clone(),
        delivery_time: settings.delivery_time.clone(),
    })
}
