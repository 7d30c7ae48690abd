//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Number of words kept by [`truncate_words`].
pub const SUMMARY_WORDS: usize = 15;

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
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Shortens text to its first fifteen words, appending `...` when cut.
///
/// Usage in templates: `{{ game.details|truncate_words }}`
#[askama::filter_fn]
pub fn truncate_words(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(summarize(&value.to_string(), SUMMARY_WORDS))
}

fn summarize(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    let mut out = kept.join(" ");
    if words.next().is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_short_text_unchanged() {
        assert_eq!(summarize("A short blurb.", 15), "A short blurb.");
        assert_eq!(summarize("", 15), "");
    }

    #[test]
    fn test_summarize_cuts_and_marks() {
        let text = "one two three four five six";
        assert_eq!(summarize(text, 3), "one two three...");
        assert_eq!(summarize(text, 6), text);
    }

    #[test]
    fn test_summarize_normalizes_whitespace() {
        assert_eq!(summarize("  spaced \n  out  ", 15), "spaced out");
    }
}
