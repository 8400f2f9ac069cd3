//! Autocomplete for a placeholder being typed at the cursor.
use serde::Serialize;

use crate::keys;
use crate::resolver;
use crate::scanner::{self, CLOSE, OPEN};
use crate::snapshot::Snapshot;
use crate::types::{Document, Occurrence};

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// A key already mapped in the document's components.
    ExistingKey {
        /// The mapped key.
        key: String,
        /// Title of the document the key currently resolves to.
        target_title: Option<String>,
    },
    /// A snapshot document that could be referenced under a new key.
    NewReference {
        /// The document to reference.
        document_id: String,
        /// A fresh key allocated from the title.
        key: String,
        /// Its title.
        title: String,
    },
}

impl Suggestion {
    /// The key inserting this suggestion would write.
    pub fn key(&self) -> &str {
        return match self {
            Self::ExistingKey { key, .. } | Self::NewReference { key, .. } => key.as_str(),
        };
    }
}

/// The occurrence under the cursor and the candidates for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// The placeholder being completed.
    pub occurrence: Occurrence,
    /// Existing keys first, then new references.
    pub suggestions: Vec<Suggestion>,
}

/// Suggestions for the placeholder at `cursor` in `text`, which is being
/// edited as the content of `document`.
///
/// Existing component keys starting with the partial key come first, then
/// other documents whose title contains it, each with a key allocated
/// against the document's current keys. Matching ignores case. `None` when
/// the cursor is not inside a placeholder.
pub fn suggest(text: &str, cursor: usize, document: &Document, snapshot: &Snapshot) -> Option<Completion> {
    let occurrence = scanner::find_at_cursor(text, cursor)?;
    let partial = occurrence.key.to_lowercase();

    let mut suggestions: Vec<Suggestion> = document
        .component_keys()
        .filter(|key| return key.to_lowercase().starts_with(&partial))
        .map(|key| {
            return Suggestion::ExistingKey {
                key: key.to_string(),
                target_title: resolver::resolve_component(document, key, snapshot)
                    .map(|d| return d.title.clone()),
            };
        })
        .collect();

    let mut taken: Vec<String> = document.component_keys().map(str::to_string).collect();
    for candidate in snapshot.documents() {
        if candidate.id == document.id || !candidate.title.to_lowercase().contains(&partial) {
            continue;
        }
        let key = keys::allocate(&candidate.title, taken.iter().map(String::as_str));
        taken.push(key.clone());
        suggestions.push(Suggestion::NewReference {
            document_id: candidate.id.clone(),
            key,
            title: candidate.title.clone(),
        });
    }

    return Some(Completion { occurrence, suggestions });
}

/// Replace the occurrence span in `text` with `{{key}}`. Returns `None` if
/// the span does not lie on character boundaries of `text`.
pub fn apply(text: &str, occurrence: &Occurrence, key: &str) -> Option<String> {
    let before = text.get(..occurrence.start)?;
    let after = text.get(occurrence.end..)?;
    return Some(format!("{before}{OPEN}{key}{CLOSE}{after}"));
}
