//! Store settings: general keys, testing mode, the rarity palette and
//! payment methods.
//!
//! Everything is stored in the `admin_setting` key-value table. The
//! storefront reads it through a short-lived cache, so changes appear there
//! within its TTL.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use gamestore_core::settings::{
    PAYMENT_METHODS, PaymentMethods, RarityPalette, SettingsError, keys, validate_editable,
};
use gamestore_store::db::SettingsRepository;

use super::{Flash, FlashQuery, page, redirect_with, sentence};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::{AdminLayout, RarityRow};

const SETTINGS_PATH: &str = "/settings";

// =============================================================================
// Form Types
// =============================================================================

/// One general setting.
#[derive(Debug, Deserialize)]
pub struct SettingForm {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// New rarity.
#[derive(Debug, Deserialize)]
pub struct RarityForm {
    pub name: String,
    pub color: String,
}

/// New colour for an existing rarity.
#[derive(Debug, Deserialize)]
pub struct ColorForm {
    pub color: String,
}

/// Reorder a rarity.
#[derive(Debug, Deserialize)]
pub struct MoveForm {
    /// `up` or `down`.
    pub direction: String,
}

// =============================================================================
// Templates
// =============================================================================

/// A general setting row.
#[derive(Debug, Clone)]
pub struct EditableSetting {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
}

/// A payment method toggle.
#[derive(Debug, Clone)]
pub struct PaymentMethodRow {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub enabled: bool,
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub layout: AdminLayout,
    pub settings: Vec<EditableSetting>,
    pub testing_mode: bool,
    pub rarities: Vec<RarityRow>,
    pub payment_methods: Vec<PaymentMethodRow>,
}

/// Form label for a general setting.
fn label(key: &str) -> &'static str {
    match key {
        keys::STORE_NAME => "Store name",
        keys::CURRENCY_SYMBOL => "Currency symbol",
        keys::SUPPORT_EMAIL => "Support email",
        keys::DELIVERY_TIME => "Delivery time",
        keys::LOW_STOCK_THRESHOLD => "Low stock threshold",
        keys::DISCORD_SERVER_LINK => "Discord server link",
        _ => "Setting",
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Settings page handler.
#[instrument(skip(state, admin, flash))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<SettingsTemplate> {
    let (settings, layout) = page(&state, Some(&admin), "settings", flash).await?;
    let raw = SettingsRepository::new(state.pool()).all().await?;

    Ok(SettingsTemplate {
        layout,
        settings: keys::EDITABLE
            .into_iter()
            .map(|key| EditableSetting {
                key,
                label: label(key),
                value: raw.get(key).cloned().unwrap_or_default(),
            })
            .collect(),
        testing_mode: settings.testing_mode,
        rarities: RarityRow::list(&settings),
        payment_methods: settings
            .payment_methods
            .all()
            .into_iter()
            .map(|(m, enabled)| PaymentMethodRow {
                key: m.key,
                name: m.name,
                description: m.description,
                enabled,
            })
            .collect(),
    })
}

/// Save one general setting.
#[instrument(skip(state, admin, form), fields(key = %form.key))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<SettingForm>,
) -> Result<Response> {
    let (key, value) = match validate_editable(&form.key, &form.value) {
        Ok(pair) => pair,
        Err(e) => return Ok(settings_error(&e)),
    };

    SettingsRepository::new(state.pool()).set(key, &value).await?;
    tracing::info!(admin_id = %admin.id, key, "Setting updated");

    Ok(redirect_with(
        SETTINGS_PATH,
        Flash::Success,
        &format!("{} saved", label(key)),
    )
    .into_response())
}

/// Flip testing mode, which shows demo quick-login accounts on the
/// storefront sign-in page.
#[instrument(skip(state, admin))]
pub async fn toggle_testing_mode(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<Response> {
    let repo = SettingsRepository::new(state.pool());
    let enabled = !repo.load().await?.testing_mode;
    repo.set(keys::TESTING_MODE, if enabled { "true" } else { "false" })
        .await?;
    tracing::info!(admin_id = %admin.id, enabled, "Testing mode toggled");

    let message = if enabled {
        "Testing mode enabled"
    } else {
        "Testing mode disabled"
    };
    Ok(redirect_with(SETTINGS_PATH, Flash::Success, message).into_response())
}

/// Add a rarity at the end of the order.
#[instrument(skip(state, admin, form))]
pub async fn add_rarity(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<RarityForm>,
) -> Result<Response> {
    if let Err(e) = edit_palette(&state, |palette| palette.add(&form.name, &form.color)).await? {
        return Ok(settings_error(&e));
    }
    tracing::info!(admin_id = %admin.id, rarity = %form.name, "Rarity added");

    Ok(redirect_with(SETTINGS_PATH, Flash::Success, "Rarity added").into_response())
}

/// Change a rarity's colour.
#[instrument(skip(state, admin, form))]
pub async fn recolor_rarity(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(name): Path<String>,
    Form(form): Form<ColorForm>,
) -> Result<Response> {
    if let Err(e) = edit_palette(&state, |palette| palette.recolor(&name, &form.color)).await? {
        return Ok(settings_error(&e));
    }
    tracing::info!(admin_id = %admin.id, rarity = %name, "Rarity recoloured");

    Ok(redirect_with(SETTINGS_PATH, Flash::Success, "Colour updated").into_response())
}

/// Remove a rarity.
#[instrument(skip(state, admin))]
pub async fn delete_rarity(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(name): Path<String>,
) -> Result<Response> {
    if let Err(e) = edit_palette(&state, |palette| palette.remove(&name)).await? {
        return Ok(settings_error(&e));
    }
    tracing::info!(admin_id = %admin.id, rarity = %name, "Rarity removed");

    Ok(redirect_with(SETTINGS_PATH, Flash::Success, "Rarity removed").into_response())
}

/// Move a rarity up or down the display order.
#[instrument(skip(state, _admin, form))]
pub async fn move_rarity(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(name): Path<String>,
    Form(form): Form<MoveForm>,
) -> Result<Response> {
    let up = form.direction == "up";
    if let Err(e) = edit_palette(&state, |palette| palette.shift(&name, up)).await? {
        return Ok(settings_error(&e));
    }
    Ok(redirect_with(SETTINGS_PATH, Flash::Success, "Order updated").into_response())
}

/// Save the payment method toggles. A checked box posts its key as `on`.
#[instrument(skip(state, admin, form))]
pub async fn update_payment_methods(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response> {
    let methods = payment_methods_from_form(&form);
    SettingsRepository::new(state.pool())
        .set(keys::PAYMENT_METHODS, &methods.to_setting())
        .await?;
    tracing::info!(
        admin_id = %admin.id,
        enabled = methods.enabled().len(),
        "Payment methods updated"
    );

    Ok(redirect_with(SETTINGS_PATH, Flash::Success, "Payment methods saved").into_response())
}

// =============================================================================
// Helpers
// =============================================================================

fn settings_error(err: &SettingsError) -> Response {
    redirect_with(SETTINGS_PATH, Flash::Error, &sentence(&err.to_string())).into_response()
}

/// Load the palette, apply `edit` and write both rarity settings back.
///
/// The outer `Result` is a database failure, the inner one the edit's own
/// validation error, in which case nothing is written.
async fn edit_palette<F>(
    state: &AppState,
    edit: F,
) -> Result<std::result::Result<(), SettingsError>>
where
    F: FnOnce(&mut RarityPalette) -> std::result::Result<(), SettingsError>,
{
    let repo = SettingsRepository::new(state.pool());
    let mut palette = repo.load().await?.rarities;

    if let Err(e) = edit(&mut palette) {
        return Ok(Err(e));
    }

    let (colors, order) = palette.to_settings();
    repo.set_many(&[(keys::RARITY_COLORS, colors.as_str()), (keys::RARITY_ORDER, order.as_str())])
        .await?;
    Ok(Ok(()))
}

/// Every catalog method is written explicitly, so unchecked boxes are
/// stored as disabled rather than falling back to the defaults.
fn payment_methods_from_form(form: &HashMap<String, String>) -> PaymentMethods {
    let mut methods = PaymentMethods::from_setting(Some("{}"));
    for method in &PAYMENT_METHODS {
        // Keys come from the catalog, so `set` cannot reject them
        let _ = methods.set(method.key, form.contains_key(method.key));
    }
    methods
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_cover_editable_keys() {
        for key in keys::EDITABLE {
            assert_ne!(label(key), "Setting", "{key} has no label");
        }
    }

    #[test]
    fn test_payment_methods_from_form() {
        let mut form = HashMap::new();
        form.insert("cash_app".to_owned(), "on".to_owned());
        form.insert("bank_transfer".to_owned(), "on".to_owned());
        form.insert("bogus".to_owned(), "on".to_owned());

        let methods = payment_methods_from_form(&form);
        assert!(methods.is_enabled("cash_app"));
        assert!(methods.is_enabled("bank_transfer"));
        assert!(!methods.is_enabled("paypal"));
        assert!(!methods.is_enabled("bogus"));

        let stored = PaymentMethods::from_setting(Some(&methods.to_setting()));
        assert_eq!(stored, methods);
        assert!(!stored.is_enabled("crypto"));
    }

    #[test]
    fn test_empty_form_disables_everything() {
        let methods = payment_methods_from_form(&HashMap::new());
        assert!(methods.enabled().is_empty());
    }
}
