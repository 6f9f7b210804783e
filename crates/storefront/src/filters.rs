//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// `"s"` unless the value is exactly one.
///
/// Usage in templates: `{{ count }} item{{ count|plural }}`
#[askama::filter_fn]
pub fn plural(value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(if value.to_string() == "1" { "" } else { "s" })
}
