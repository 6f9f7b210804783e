//! Authentication route handlers.
//!
//! Email/password login and registration against the shared `user` table.
//! While `testing_mode` is on the login page also offers one-click sign-in
//! as the demo accounts.

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

use gamestore_core::settings::{DEMO_ACCOUNTS, DemoAccount};
use gamestore_store::services::{AuthError, AuthService};

use super::{Flash, FlashQuery, page, redirect_with};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::views::Layout;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    /// Quick-login buttons, only filled in testing mode.
    pub demo_accounts: Vec<DemoAccount>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(state, user, flash))]
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let (settings, layout) = page(&state, None, flash).await?;
    let demo_accounts = if settings.testing_mode {
        DEMO_ACCOUNTS.to_vec()
    } else {
        Vec::new()
    };

    Ok(LoginTemplate {
        layout,
        demo_accounts,
    }
    .into_response())
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser::from(user);
            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session: {e}");
                return redirect_with("/auth/login", Flash::Error, "Could not sign you in")
                    .into_response();
            }
            set_sentry_user(&current.id, Some(current.email.as_str()));
            tracing::info!(user_id = %current.id, "User signed in");
            Redirect::to("/").into_response()
        }
        Err(
            e @ (AuthError::InvalidCredentials
            | AuthError::UserNotFound
            | AuthError::InvalidEmail(_)),
        ) => {
            tracing::warn!("Login failed: {e}");
            redirect_with("/auth/login", Flash::Error, "Invalid email or password").into_response()
        }
        Err(e) => {
            tracing::error!("Login error: {e}");
            redirect_with("/auth/login", Flash::Error, "Could not sign you in").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(state, user, flash))]
pub async fn register_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let (_, layout) = page(&state, None, flash).await?;
    Ok(RegisterTemplate { layout }.into_response())
}

/// Handle registration form submission. New accounts are signed in at once.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let user = match AuthService::new(state.pool())
        .register(&form.email, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => user,
        Err(e @ (AuthError::InvalidEmail(_) | AuthError::WeakPassword(_))) => {
            return redirect_with("/auth/register", Flash::Error, &e.to_string()).into_response();
        }
        Err(AuthError::UserAlreadyExists) => {
            return redirect_with(
                "/auth/register",
                Flash::Error,
                "An account with that email already exists",
            )
            .into_response();
        }
        Err(e) => {
            tracing::error!("Registration error: {e}");
            return redirect_with("/auth/register", Flash::Error, "Could not create your account")
                .into_response();
        }
    };

    let current = CurrentUser::from(user);
    if let Err(e) = set_current_user(&session, &current).await {
        tracing::error!("Failed to set session after registration: {e}");
        return redirect_with(
            "/auth/login",
            Flash::Success,
            "Account created, please sign in",
        )
        .into_response();
    }
    set_sentry_user(&current.id, Some(current.email.as_str()));
    tracing::info!(user_id = %current.id, "User registered");

    redirect_with("/", Flash::Success, "Welcome! Your account is ready").into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();
    Redirect::to("/")
}
