//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Characters kept by [`abbreviate`].
const ABBREVIATE_AT: usize = 48;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shorten long values such as data URLs for table cells.
///
/// Usage in templates: `{{ image.data_url|abbreviate }}`
#[askama::filter_fn]
pub fn abbreviate(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string()))
}

fn shorten(value: &str) -> String {
    if value.chars().count() <= ABBREVIATE_AT {
        return value.to_owned();
    }
    let head: String = value.chars().take(ABBREVIATE_AT).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short"), "short");
        let long = format!("data:image/png;base64,{}", "A".repeat(100));
        let out = shorten(&long);
        assert!(out.ends_with('…'));
        assert_eq!(out.chars().count(), ABBREVIATE_AT + 1);
    }
}
