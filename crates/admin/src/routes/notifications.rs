//! Admin notification log.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use gamestore_core::NotificationId;
use gamestore_store::db::NotificationRepository;

use super::{Flash, FlashQuery, flash_repository_error, page, redirect_with};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::{AdminLayout, NotificationRow};

/// Notifications page template.
#[derive(Template, WebTemplate)]
#[template(path = "notifications.html")]
pub struct NotificationsTemplate {
    pub layout: AdminLayout,
    pub notifications: Vec<NotificationRow>,
}

/// Notifications page handler, newest first.
#[instrument(skip(state, admin, flash))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<NotificationsTemplate> {
    let (_, layout) = page(&state, Some(&admin), "notifications", flash).await?;

    let notifications = NotificationRepository::new(state.pool())
        .list()
        .await?
        .iter()
        .map(NotificationRow::from)
        .collect();

    Ok(NotificationsTemplate {
        layout,
        notifications,
    })
}

/// Mark one notification read.
#[instrument(skip(state, _admin))]
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    match NotificationRepository::new(state.pool())
        .mark_read(NotificationId::new(id))
        .await
    {
        Ok(()) => Ok(redirect_with("/notifications", Flash::Success, "Marked as read").into_response()),
        Err(e) => flash_repository_error("/notifications", e),
    }
}

/// Mark every notification read.
#[instrument(skip(state, admin))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<Response> {
    let n = NotificationRepository::new(state.pool())
        .mark_all_read()
        .await?;
    tracing::info!(admin_id = %admin.id, count = n, "Notifications marked read");

    Ok(redirect_with(
        "/notifications",
        Flash::Success,
        &format!("Marked {n} notification{} as read", if n == 1 { "" } else { "s" }),
    )
    .into_response())
}
