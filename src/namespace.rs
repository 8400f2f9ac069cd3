//! Namespaced override keys and the override precedence rule.
//!
//! An override key is either a bare placeholder key, applying wherever that
//! key occurs, or `"<sourceDocumentId>.<placeholderKey>"`, applying only to
//! that occurrence in that document. The namespaced form always wins.
use std::fmt;

use crate::snapshot::Snapshot;
use crate::types::OverrideMap;

/// Separator between source document id and placeholder key.
pub const SEPARATOR: char = '.';

/// A placeholder key scoped to the document it appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespacedKey<'a> {
    /// The placeholder key.
    pub key: &'a str,
    /// Document whose content holds the placeholder.
    pub source: &'a str,
}

impl<'a> NamespacedKey<'a> {
    /// Scope `key` to `source`.
    pub const fn new(source: &'a str, key: &'a str) -> Self {
        return Self { key, source };
    }
}

impl fmt::Display for NamespacedKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}{SEPARATOR}{}", self.source, self.key);
    }
}

/// How an override key applies, as judged against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideScope {
    /// Applies to every occurrence of the key.
    Global {
        /// The placeholder key.
        key: String,
    },
    /// Applies to one occurrence inside one source document.
    Namespaced {
        /// The placeholder key.
        key: String,
        /// The source document id.
        source: String,
    },
}

/// The document id an override substitutes for a placeholder, if any.
///
/// Exact match on the namespaced key first, then on the bare key. `None`
/// tells the caller to fall back to the document's own mapping.
pub fn effective_target<'m>(
    namespaced_key: &str,
    bare_key: &str,
    overrides: Option<&'m OverrideMap>,
) -> Option<&'m str> {
    let overrides = overrides?;
    return overrides.get(namespaced_key).or_else(|| return overrides.get(bare_key));
}

/// Classify an override key. Document ids may themselves contain the
/// separator, so the longest prefix naming an existing document wins; a key
/// with no such prefix is global.
pub fn classify(raw: &str, snapshot: &Snapshot) -> OverrideScope {
    let split = raw
        .char_indices()
        .rev()
        .filter(|(_, c)| return *c == SEPARATOR)
        .find_map(|(idx, _)| {
            let source = raw.get(..idx)?;
            let key = raw.get(idx.checked_add(1)?..)?;
            if key.is_empty() || !snapshot.contains(source) {
                return None;
            }
            return Some((source, key));
        });

    return match split {
        Some((source, key)) => OverrideScope::Namespaced {
            key: key.to_string(),
            source: source.to_string(),
        },
        None => OverrideScope::Global { key: raw.to_string() },
    };
}
