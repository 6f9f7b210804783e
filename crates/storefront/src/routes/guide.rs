//! Buying guide: how manual checkout and Discord payment work.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tracing::instrument;

use gamestore_core::settings::PaymentMethod;

use super::{FlashQuery, page};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::views::Layout;

/// Buying guide template.
#[derive(Template, WebTemplate)]
#[template(path = "guide.html")]
pub struct GuideTemplate {
    pub layout: Layout,
    pub discord_link: String,
    pub delivery_time: Option<String>,
    pub payment_methods: Vec<PaymentMethod>,
}

/// Display the buying guide.
#[instrument(skip(state, user, flash))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<GuideTemplate> {
    let (settings, layout) = page(&state, user.as_ref(), flash).await?;

    Ok(GuideTemplate {
        layout,
        discord_link: settings.discord_server_link.clone(),
        delivery_time: settings.delivery_time.clone(),
        payment_methods: settings.payment_methods.enabled(),
    })
}
