//! Typed view over the key-value store settings.
//!
//! Settings live in a `key -> string` table so admins can add new ones
//! without a migration. Structured settings (rarity colours, payment methods)
//! are JSON-encoded strings. [`StoreSettings::from_map`] never fails: a
//! missing or unparseable value falls back to its default and the problem is
//! reported by the caller's logging, not surfaced to shoppers.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Setting keys.
pub mod keys {
    pub const STORE_NAME: &str = "store_name";
    pub const CURRENCY_SYMBOL: &str = "currency_symbol";
    pub const SUPPORT_EMAIL: &str = "support_email";
    pub const DELIVERY_TIME: &str = "delivery_time";
    pub const LOW_STOCK_THRESHOLD: &str = "low_stock_threshold";
    pub const DISCORD_SERVER_LINK: &str = "discord_server_link";
    pub const TESTING_MODE: &str = "testing_mode";
    pub const RARITY_COLORS: &str = "rarity_colors";
    pub const RARITY_ORDER: &str = "rarity_order";
    pub const PAYMENT_METHODS: &str = "payment_methods";

    /// Plain-text keys editable from the general settings form.
    pub const EDITABLE: [&str; 6] = [
        STORE_NAME,
        CURRENCY_SYMBOL,
        SUPPORT_EMAIL,
        DELIVERY_TIME,
        LOW_STOCK_THRESHOLD,
        DISCORD_SERVER_LINK,
    ];
}

pub const DEFAULT_STORE_NAME: &str = "GameStore";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "€";
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 3;
pub const DEFAULT_DISCORD_LINK: &str = "https://discord.gg/yourserver";
pub const DEFAULT_RARITY_COLOR: &str = "#3B82F6";

/// A quick-login account offered on the sign-in page while `testing_mode`
/// is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoAccount {
    pub label: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub is_admin: bool,
}

/// Accounts created by `gamestore-cli seed demo` and offered for quick login.
pub const DEMO_ACCOUNTS: [DemoAccount; 2] = [
    DemoAccount {
        label: "Login as Admin",
        email: "admin@gamestore.com",
        password: "admin123",
        is_admin: true,
    },
    DemoAccount {
        label: "Login as Shopper",
        email: "shopper@gamestore.com",
        password: "shopper123",
        is_admin: false,
    },
];

/// Errors from settings edits.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting '{0}'")]
    UnknownKey(String),
    #[error("{key} is invalid: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("rarity name cannot be empty")]
    EmptyRarity,
    #[error("rarity '{0}' already exists")]
    DuplicateRarity(String),
    #[error("rarity '{0}' does not exist")]
    UnknownRarity(String),
    #[error("'{0}' is not a #RRGGBB colour")]
    InvalidColor(String),
    #[error("unknown payment method '{0}'")]
    UnknownPaymentMethod(String),
}

/// Validate a value for one of the [`keys::EDITABLE`] settings and return
/// the normalized string to store.
///
/// # Errors
///
/// Returns [`SettingsError`] for an unknown key or an invalid value.
pub fn validate_editable(key: &str, value: &str) -> Result<(&'static str, String), SettingsError> {
    let key = keys::EDITABLE
        .into_iter()
        .find(|k| *k == key)
        .ok_or_else(|| SettingsError::UnknownKey(key.to_owned()))?;
    let value = value.trim();
    match key {
        keys::LOW_STOCK_THRESHOLD => {
            let n: i32 = value.parse().map_err(|_| SettingsError::InvalidValue {
                key,
                reason: "must be a whole number".to_owned(),
            })?;
            if n < 0 {
                return Err(SettingsError::InvalidValue {
                    key,
                    reason: "cannot be negative".to_owned(),
                });
            }
            Ok((key, n.to_string()))
        }
        keys::STORE_NAME | keys::CURRENCY_SYMBOL if value.is_empty() => {
            Err(SettingsError::InvalidValue {
                key,
                reason: "cannot be empty".to_owned(),
            })
        }
        _ => Ok((key, value.to_owned())),
    }
}

/// Parsed store settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub store_name: String,
    pub currency_symbol: String,
    pub support_email: Option<String>,
    pub delivery_time: Option<String>,
    pub low_stock_threshold: i32,
    pub discord_server_link: String,
    pub testing_mode: bool,
    pub rarities: RarityPalette,
    pub payment_methods: PaymentMethods,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

impl StoreSettings {
    /// Build the typed view from the raw table contents.
    #[must_use]
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let text = |key: &str| {
            map.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        };

        Self {
            store_name: text(keys::STORE_NAME).unwrap_or_else(|| DEFAULT_STORE_NAME.to_owned()),
            currency_symbol: text(keys::CURRENCY_SYMBOL)
                .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_owned()),
            support_email: text(keys::SUPPORT_EMAIL),
            delivery_time: text(keys::DELIVERY_TIME),
            low_stock_threshold: text(keys::LOW_STOCK_THRESHOLD)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            discord_server_link: text(keys::DISCORD_SERVER_LINK)
                .unwrap_or_else(|| DEFAULT_DISCORD_LINK.to_owned()),
            testing_mode: text(keys::TESTING_MODE).is_some_and(|v| v == "true"),
            rarities: RarityPalette::from_settings(
                text(keys::RARITY_COLORS).as_deref(),
                text(keys::RARITY_ORDER).as_deref(),
            ),
            payment_methods: PaymentMethods::from_setting(text(keys::PAYMENT_METHODS).as_deref()),
        }
    }

    /// Whether `stock` should be flagged in the admin product list.
    #[must_use]
    pub const fn is_low_stock(&self, stock: i32) -> bool {
        stock <= self.low_stock_threshold
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s.bytes().skip(1).all(|b| b.is_ascii_hexdigit())
}

/// Rarity display colours, in admin-chosen order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RarityPalette {
    entries: Vec<(String, String)>,
}

impl RarityPalette {
    /// Build from the `rarity_colors` and `rarity_order` settings. Colours
    /// that are missing from the order are appended alphabetically, order
    /// entries with no colour are dropped.
    #[must_use]
    pub fn from_settings(colors_json: Option<&str>, order_json: Option<&str>) -> Self {
        let mut colors: BTreeMap<String, String> = colors_json
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();
        let order: Vec<String> = order_json
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();

        let mut entries = Vec::with_capacity(colors.len());
        for name in order {
            if let Some(color) = colors.remove(&name) {
                entries.push((name, color));
            }
        }
        entries.extend(colors);
        Self { entries }
    }

    /// `(name, colour)` pairs in display order.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Colour for a rarity, or the default blue.
    #[must_use]
    pub fn color_of(&self, rarity: &str) -> &str {
        self.entries
            .iter()
            .find(|(n, _)| n == rarity)
            .map_or(DEFAULT_RARITY_COLOR, |(_, c)| c.as_str())
    }

    /// Add a rarity at the end of the order.
    ///
    /// # Errors
    ///
    /// Rejects empty or duplicate names and malformed colours.
    pub fn add(&mut self, name: &str, color: &str) -> Result<(), SettingsError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(SettingsError::EmptyRarity);
        }
        if self.position(&name).is_some() {
            return Err(SettingsError::DuplicateRarity(name));
        }
        let color = checked_color(color)?;
        self.entries.push((name, color));
        Ok(())
    }

    /// Change a rarity's colour.
    ///
    /// # Errors
    ///
    /// Rejects unknown rarities and malformed colours.
    pub fn recolor(&mut self, name: &str, color: &str) -> Result<(), SettingsError> {
        let color = checked_color(color)?;
        let idx = self.require(name)?;
        if let Some(entry) = self.entries.get_mut(idx) {
            entry.1 = color;
        }
        Ok(())
    }

    /// Remove a rarity.
    ///
    /// # Errors
    ///
    /// Rejects unknown rarities.
    pub fn remove(&mut self, name: &str) -> Result<(), SettingsError> {
        let idx = self.require(name)?;
        self.entries.remove(idx);
        Ok(())
    }

    /// Move a rarity one slot up (`up = true`) or down. Moving past either
    /// end is a no-op.
    ///
    /// # Errors
    ///
    /// Rejects unknown rarities.
    pub fn shift(&mut self, name: &str, up: bool) -> Result<(), SettingsError> {
        let idx = self.require(name)?;
        let target = if up { idx.checked_sub(1) } else { Some(idx + 1) };
        if let Some(target) = target.filter(|t| *t < self.entries.len()) {
            self.entries.swap(idx, target);
        }
        Ok(())
    }

    /// `(rarity_colors, rarity_order)` JSON strings to persist.
    #[must_use]
    pub fn to_settings(&self) -> (String, String) {
        let colors: BTreeMap<&str, &str> = self
            .entries
            .iter()
            .map(|(n, c)| (n.as_str(), c.as_str()))
            .collect();
        let order: Vec<&str> = self.entries.iter().map(|(n, _)| n.as_str()).collect();
        (
            serde_json::to_string(&colors).unwrap_or_else(|_| "{}".to_owned()),
            serde_json::to_string(&order).unwrap_or_else(|_| "[]".to_owned()),
        )
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    fn require(&self, name: &str) -> Result<usize, SettingsError> {
        self.position(name)
            .ok_or_else(|| SettingsError::UnknownRarity(name.to_owned()))
    }
}

fn checked_color(color: &str) -> Result<String, SettingsError> {
    let color = color.trim();
    if is_hex_color(color) {
        Ok(color.to_uppercase())
    } else {
        Err(SettingsError::InvalidColor(color.to_owned()))
    }
}

/// A payment method the store can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Every payment method an admin can toggle.
pub const PAYMENT_METHODS: [PaymentMethod; 5] = [
    PaymentMethod {
        key: "paypal",
        name: "PayPal",
        description: "Accept payments via PayPal",
    },
    PaymentMethod {
        key: "crypto",
        name: "Cryptocurrency",
        description: "Accept Bitcoin, Ethereum, and other cryptocurrencies",
    },
    PaymentMethod {
        key: "gift_cards",
        name: "Gift Cards",
        description: "Accept various gift cards as payment",
    },
    PaymentMethod {
        key: "bank_transfer",
        name: "Bank Transfer",
        description: "Accept direct bank transfers",
    },
    PaymentMethod {
        key: "cash_app",
        name: "Cash App",
        description: "Accept payments via Cash App",
    },
];

/// Enabled flags for [`PAYMENT_METHODS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethods(BTreeMap<String, bool>);

impl PaymentMethods {
    /// Parse the `payment_methods` setting. An unset setting enables PayPal,
    /// crypto and gift cards; keys missing from a set value are disabled.
    #[must_use]
    pub fn from_setting(json: Option<&str>) -> Self {
        json.and_then(|s| serde_json::from_str(s).ok())
            .map_or_else(Self::defaults, Self)
    }

    fn defaults() -> Self {
        Self(
            ["paypal", "crypto", "gift_cards"]
                .into_iter()
                .map(|k| (k.to_owned(), true))
                .collect(),
        )
    }

    #[must_use]
    pub fn is_enabled(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(false)
    }

    /// Enable or disable one method.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownPaymentMethod`] for keys outside the
    /// catalog.
    pub fn set(&mut self, key: &str, enabled: bool) -> Result<(), SettingsError> {
        if !PAYMENT_METHODS.iter().any(|m| m.key == key) {
            return Err(SettingsError::UnknownPaymentMethod(key.to_owned()));
        }
        self.0.insert(key.to_owned(), enabled);
        Ok(())
    }

    /// Catalog entries with their enabled flag.
    #[must_use]
    pub fn all(&self) -> Vec<(PaymentMethod, bool)> {
        PAYMENT_METHODS
            .iter()
            .map(|m| (*m, self.is_enabled(m.key)))
            .collect()
    }

    /// Enabled catalog entries.
    #[must_use]
    pub fn enabled(&self) -> Vec<PaymentMethod> {
        PAYMENT_METHODS
            .iter()
            .filter(|m| self.is_enabled(m.key))
            .copied()
            .collect()
    }

    /// JSON string to persist.
    #[must_use]
    pub fn to_setting(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let s = StoreSettings::default();
        assert_eq!(s.store_name, "GameStore");
        assert_eq!(s.currency_symbol, "€");
        assert_eq!(s.low_stock_threshold, 3);
        assert_eq!(s.discord_server_link, DEFAULT_DISCORD_LINK);
        assert!(!s.testing_mode);
        assert!(s.rarities.entries().is_empty());
        assert!(s.payment_methods.is_enabled("paypal"));
        assert!(!s.payment_methods.is_enabled("cash_app"));
    }

    #[test]
    fn test_from_map_parses_values() {
        let s = StoreSettings::from_map(&map(&[
            (keys::STORE_NAME, "Loot Den"),
            (keys::LOW_STOCK_THRESHOLD, "10"),
            (keys::TESTING_MODE, "true"),
            (keys::SUPPORT_EMAIL, "  "),
        ]));
        assert_eq!(s.store_name, "Loot Den");
        assert_eq!(s.low_stock_threshold, 10);
        assert!(s.testing_mode);
        assert_eq!(s.support_email, None);
        assert!(s.is_low_stock(10));
        assert!(!s.is_low_stock(11));
    }

    #[test]
    fn test_bad_threshold_falls_back() {
        let s = StoreSettings::from_map(&map(&[(keys::LOW_STOCK_THRESHOLD, "lots")]));
        assert_eq!(s.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
    }

    #[test]
    fn test_validate_editable() {
        assert_eq!(
            validate_editable("low_stock_threshold", " 7 ").unwrap(),
            ("low_stock_threshold", "7".to_owned())
        );
        assert!(validate_editable("low_stock_threshold", "-1").is_err());
        assert!(validate_editable("store_name", " ").is_err());
        assert!(matches!(
            validate_editable("testing_mode", "true"),
            Err(SettingsError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_palette_order_and_leftovers() {
        let palette = RarityPalette::from_settings(
            Some(r##"{"common":"#AAAAAA","rare":"#0000FF","epic":"#800080"}"##),
            Some(r#"["rare","ghost","common"]"#),
        );
        let names: Vec<&str> = palette.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["rare", "common", "epic"]);
        assert_eq!(palette.color_of("epic"), "#800080");
        assert_eq!(palette.color_of("mythic"), DEFAULT_RARITY_COLOR);
    }

    #[test]
    fn test_palette_edits() {
        let mut palette = RarityPalette::default();
        palette.add("  Legendary ", "#ffaa00").unwrap();
        palette.add("common", "#aaaaaa").unwrap();
        assert_eq!(
            palette.add("LEGENDARY", "#000000"),
            Err(SettingsError::DuplicateRarity("legendary".to_owned()))
        );
        assert_eq!(palette.add(" ", "#000000"), Err(SettingsError::EmptyRarity));
        assert!(matches!(
            palette.add("rare", "blue"),
            Err(SettingsError::InvalidColor(_))
        ));

        palette.shift("common", true).unwrap();
        assert_eq!(palette.entries()[0].0, "common");
        palette.shift("common", true).unwrap();
        assert_eq!(palette.entries()[0].0, "common");

        palette.recolor("legendary", "#123456").unwrap();
        assert_eq!(palette.color_of("legendary"), "#123456");

        palette.remove("common").unwrap();
        assert!(palette.remove("common").is_err());

        let (colors, order) = palette.to_settings();
        assert_eq!(colors, r##"{"legendary":"#123456"}"##);
        assert_eq!(order, r#"["legendary"]"#);
    }

    #[test]
    fn test_payment_methods_set_value_overrides_defaults() {
        let methods = PaymentMethods::from_setting(Some(r#"{"cash_app":true}"#));
        assert!(methods.is_enabled("cash_app"));
        assert!(!methods.is_enabled("paypal"));
        assert_eq!(methods.enabled().len(), 1);
    }

    #[test]
    fn test_payment_methods_toggle() {
        let mut methods = PaymentMethods::from_setting(None);
        methods.set("paypal", false).unwrap();
        methods.set("bank_transfer", true).unwrap();
        assert!(methods.set("venmo", true).is_err());
        let keys: Vec<&str> = methods.enabled().iter().map(|m| m.key).collect();
        assert_eq!(keys, ["crypto", "gift_cards", "bank_transfer"]);
        let reparsed = PaymentMethods::from_setting(Some(&methods.to_setting()));
        assert_eq!(reparsed, methods);
    }
}
