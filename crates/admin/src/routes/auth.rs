//! Authentication route handlers.
//!
//! Admins sign in with the same email/password accounts the storefront
//! uses; only accounts with `is_admin` set get a session here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use gamestore_store::services::{AuthError, AuthService};

use super::{Flash, FlashQuery, page, redirect_with};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;
use crate::views::AdminLayout;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: AdminLayout,
}

/// Display the login page.
#[instrument(skip(state, admin, flash))]
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<Response> {
    if admin.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let (_, layout) = page(&state, None, "login", flash).await?;
    Ok(LoginTemplate { layout }.into_response())
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(
            e @ (AuthError::InvalidCredentials
            | AuthError::UserNotFound
            | AuthError::InvalidEmail(_)),
        ) => {
            tracing::warn!("Admin login failed: {e}");
            return redirect_with("/auth/login", Flash::Error, "Invalid email or password")
                .into_response();
        }
        Err(e) => {
            tracing::error!("Admin login error: {e}");
            return redirect_with("/auth/login", Flash::Error, "Could not sign you in")
                .into_response();
        }
    };

    if !user.is_admin {
        tracing::warn!(user_id = %user.id, "Non-admin tried to sign in to the admin console");
        return redirect_with(
            "/auth/login",
            Flash::Error,
            "This account does not have admin access",
        )
        .into_response();
    }

    let admin = CurrentAdmin::from(user);
    if let Err(e) = set_current_admin(&session, &admin).await {
        tracing::error!("Failed to set session: {e}");
        return redirect_with("/auth/login", Flash::Error, "Could not sign you in")
            .into_response();
    }
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, "Admin signed in");

    Redirect::to("/").into_response()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();
    Redirect::to("/auth/login")
}
