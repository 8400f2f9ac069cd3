//! Placeholder key allocation and validation.
use std::collections::HashSet;

use crate::error::Error;

/// Prefix for keys whose normalized title does not start with a letter.
const FALLBACK_PREFIX: &str = "doc";

/// Derive a fresh key from a human-readable title.
///
/// The title is lowercased, stripped to `[a-z0-9]` and whitespace, and
/// whitespace runs become single underscores with none at the edges. A base
/// not starting with a letter gets a `doc_` prefix. If the base is taken,
/// `_1`, `_2`, ... are appended until it is not. The result always matches
/// `^[a-z][a-z0-9_]*$` and is never in `existing`.
pub fn allocate<'a, I>(title: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = existing.into_iter().collect();
    let base = normalize_title(title);
    if !taken.contains(base.as_str()) {
        return base;
    }

    let mut suffix: u64 = 1;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        suffix = suffix.saturating_add(1);
    }
}

/// Lowercase, strip, underscore-join. Never empty; always starts with a letter.
fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut result = String::with_capacity(lowered.len());
    let mut prev_underscore = true; // Start true to trim leading underscores.

    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            result.push(c);
            prev_underscore = false;
            continue;
        }
        if !c.is_whitespace() || prev_underscore {
            continue;
        }
        result.push('_');
        prev_underscore = true;
    }

    if result.ends_with('_') {
        result.pop();
    }

    if result.is_empty() {
        return FALLBACK_PREFIX.to_string();
    }
    if !result.starts_with(|c: char| return c.is_ascii_lowercase()) {
        return format!("{FALLBACK_PREFIX}_{result}");
    }
    return result;
}

/// Check a key typed during an interactive rename. Keys must be non-empty
/// and use only ASCII letters, digits, `_`, or `-`.
///
/// # Errors
///
/// Returns `Error::InvalidKey` describing the first problem found.
pub fn validate_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::InvalidKey {
            key: key.to_string(),
            reason: "key is empty",
        });
    }
    if key.chars().any(|c| return !c.is_ascii_alphanumeric() && c != '_' && c != '-') {
        return Err(Error::InvalidKey {
            key: key.to_string(),
            reason: "only letters, digits, `_` and `-` are allowed",
        });
    }
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_key_shape(key: &str) -> bool {
        let mut chars = key.chars();
        chars.next().is_some_and(|c| c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    #[test]
    fn title_becomes_key() {
        assert_eq!(allocate("My Cool Doc!", []), "my_cool_doc");
    }

    #[test]
    fn collision_appends_counter() {
        assert_eq!(allocate("My Cool Doc!", ["my_cool_doc"]), "my_cool_doc_1");
        assert_eq!(
            allocate("My Cool Doc!", ["my_cool_doc", "my_cool_doc_1", "my_cool_doc_3"]),
            "my_cool_doc_2"
        );
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(allocate("  Header \t\n  Block  ", []), "header_block");
    }

    #[test]
    fn punctuation_between_words_does_not_double_underscore() {
        assert_eq!(allocate("Terms & Conditions", []), "terms_conditions");
        assert_eq!(allocate("snake_case title", []), "snakecase_title");
    }

    #[test]
    fn leading_digit_gets_prefix() {
        assert_eq!(allocate("2024 Recap", []), "doc_2024_recap");
    }

    #[test]
    fn empty_or_symbol_only_title() {
        assert_eq!(allocate("", []), "doc");
        assert_eq!(allocate("!!!", ["doc"]), "doc_1");
        assert_eq!(allocate("日本語", []), "doc");
    }

    #[test]
    fn results_always_have_key_shape() {
        let titles = ["My Cool Doc!", "", " 9 lives", "Ünïcödé words", "a", "__x__", "-- --"];
        for title in titles {
            let key = allocate(title, ["a", "x"]);
            assert!(matches_key_shape(&key), "{title:?} -> {key:?}");
            assert!(key != "a" && key != "x", "{title:?} collided");
        }
    }

    #[test]
    fn validates_rename_input() {
        assert!(validate_key("hero-banner_2").is_ok());
        assert!(matches!(validate_key(""), Err(Error::InvalidKey { .. })));
        assert!(matches!(validate_key("has space"), Err(Error::InvalidKey { .. })));
        assert!(matches!(validate_key("br}ace"), Err(Error::InvalidKey { .. })));
    }
}
