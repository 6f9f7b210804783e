//! Account list with admin promotion and demotion.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use gamestore_core::UserId;
use gamestore_store::db::UserRepository;

use super::{Flash, FlashQuery, flash_repository_error, page, redirect_with};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;
use crate::views::{AdminLayout, UserRow};

/// Users page template.
#[derive(Template, WebTemplate)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub layout: AdminLayout,
    pub users: Vec<UserRow>,
}

/// Users page handler.
#[instrument(skip(state, admin, flash))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<UsersTemplate> {
    let (_, layout) = page(&state, Some(&admin), "users", flash).await?;

    let users = UserRepository::new(state.pool())
        .list()
        .await?
        .iter()
        .map(|u| UserRow::new(u, &admin))
        .collect();

    Ok(UsersTemplate { layout, users })
}

/// Grant admin.
#[instrument(skip(state, admin))]
pub async fn promote(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    set_admin(&state, &admin, UserId::new(id), true).await
}

/// Revoke admin. Admins cannot demote themselves.
#[instrument(skip(state, admin))]
pub async fn demote(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let target = UserId::new(id);
    if target == admin.id {
        return Ok(redirect_with(
            "/users",
            Flash::Error,
            "You cannot remove your own admin access",
        )
        .into_response());
    }
    set_admin(&state, &admin, target, false).await
}

async fn set_admin(
    state: &AppState,
    admin: &CurrentAdmin,
    target: UserId,
    is_admin: bool,
) -> Result<Response> {
    match UserRepository::new(state.pool())
        .set_admin(target, is_admin)
        .await
    {
        Ok(user) => {
            tracing::info!(
                admin_id = %admin.id,
                user_id = %user.id,
                is_admin,
                "Admin access changed"
            );
            let message = if is_admin {
                format!("{} is now an admin", user.email)
            } else {
                format!("{} is no longer an admin", user.email)
            };
            Ok(redirect_with("/users", Flash::Success, &message).into_response())
        }
        Err(e) => flash_repository_error("/users", e),
    }
}
