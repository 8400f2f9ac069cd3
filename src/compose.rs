//! Flatten a composite document into plain text.
//!
//! Each placeholder is replaced by the composed content of its effective
//! target (preset override first, then the document's own mapping).
//! Placeholders that are unmapped, point at nothing, or point back at an
//! ancestor stay in the output exactly as written.

use std::collections::HashSet;

use crate::scanner;
use crate::snapshot::Snapshot;
use crate::types::{Document, OverrideMap};
use crate::walker;

/// Compose `root_id` into text, or `None` if the root does not exist.
pub fn compose(root_id: &str, snapshot: &Snapshot, overrides: Option<&OverrideMap>) -> Option<String> {
    let root = snapshot.get(root_id)?;
    return Some(compose_document(root, snapshot, overrides, &HashSet::new()));
}

/// Compose one document given the ancestors on the current path.
fn compose_document<'a>(
    doc: &'a Document,
    snapshot: &'a Snapshot,
    overrides: Option<&OverrideMap>,
    ancestors: &HashSet<&'a str>,
) -> String {
    if !doc.is_composite || doc.components.is_none() {
        return doc.content.clone();
    }
    let mut visited = ancestors.clone();
    visited.insert(doc.id.as_str());

    let content = doc.content.as_str();
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;

    for occurrence in scanner::scan_all(content) {
        out.push_str(content.get(cursor..occurrence.start).unwrap_or_default());
        cursor = occurrence.end;

        let written = content.get(occurrence.start..occurrence.end).unwrap_or_default();
        let Some(target) = walker::resolve_key(&doc.id, &occurrence.key, snapshot, overrides) else {
            out.push_str(written);
            continue;
        };
        if visited.contains(target.id.as_str()) {
            tracing::debug!(source = %doc.id, key = %occurrence.key, target = %target.id, "cycle left unexpanded");
            out.push_str(written);
            continue;
        }
        out.push_str(&compose_document(target, snapshot, overrides, &visited));
    }

    out.push_str(content.get(cursor..).unwrap_or_default());
    return out;
}
