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

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content and used as
/// a cache-busting query string.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Returns the uppercased first character, for avatar fallbacks.
///
/// Usage in templates: `{{ name|initial }}`
#[askama::filter_fn]
pub fn initial(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(first_initial(&value.to_string()))
}

fn first_initial(value: &str) -> String {
    value
        .trim()
        .chars()
        .next()
        .map_or_else(|| "?".to_string(), |c| c.to_uppercase().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_initial() {
        assert_eq!(first_initial("layla"), "L");
        assert_eq!(first_initial("  ömer"), "Ö");
        assert_eq!(first_initial(""), "?");
    }
}
