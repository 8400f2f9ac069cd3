//! Core domain types: documents, reference targets, overrides, and records.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix marking a reference target as a group rather than a document id.
const GROUP_PREFIX: &str = "group:";

/// A fragment in the snapshot. Composite documents carry placeholders in
/// `content` and a `components` mapping from placeholder key to target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Placeholder key to reference target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<BTreeMap<String, ReferenceTarget>>,
    /// Raw text, possibly containing `{{key}}` placeholders. `null` reads
    /// as empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Free-form type tag consulted by preferred-type group resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    /// Group this document is a variant of. The head has `id == group_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Stable identity of the document.
    pub id: String,
    /// Whether placeholders in `content` are meant to be resolved. `null`
    /// reads as false.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_composite: bool,
    /// Human-readable title.
    pub title: String,
}

impl Document {
    /// A plain, non-composite document with empty content.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        return Self {
            components: None,
            content: String::new(),
            document_type: None,
            group_id: None,
            id: id.into(),
            is_composite: false,
            title: title.into(),
        };
    }

    /// Place the document in a group.
    #[must_use]
    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        return self;
    }

    /// Tag the document with a type.
    #[must_use]
    pub fn of_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        return self;
    }

    /// Set plain content without making the document composite.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        return self;
    }

    /// Make the document composite with the given content and mapping.
    /// Targets are given in their string encoding.
    #[must_use]
    pub fn composite<K, T>(
        mut self,
        content: impl Into<String>,
        components: impl IntoIterator<Item = (K, T)>,
    ) -> Self
    where
        K: Into<String>,
        T: AsRef<str>,
    {
        self.content = content.into();
        self.is_composite = true;
        self.components = Some(
            components
                .into_iter()
                .map(|(k, t)| return (k.into(), ReferenceTarget::parse(t.as_ref())))
                .collect(),
        );
        return self;
    }

    /// Whether this document is the head of its group.
    pub fn is_group_head(&self) -> bool {
        return self.group_id.as_deref() == Some(self.id.as_str());
    }

    /// Look up the mapped target for a placeholder key.
    pub fn component(&self, key: &str) -> Option<&ReferenceTarget> {
        return self.components.as_ref()?.get(key);
    }

    /// Keys of the components mapping, sorted.
    pub fn component_keys(&self) -> impl Iterator<Item = &str> {
        return self
            .components
            .iter()
            .flat_map(|c| return c.keys())
            .map(String::as_str);
    }
}

/// Where a placeholder points. Parsed once from its string encoding
/// (`"doc-id"`, `"group:<id>"`, `"group:<id>:<preferred>"`) at the
/// deserialization boundary and never re-parsed during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReferenceTarget {
    /// A specific document by id.
    Direct(String),
    /// Any member of a group, narrowed by a preferred type or member id.
    Group {
        /// The group to pick a member from.
        group_id: String,
        /// Preferred `document_type`, or the id of a specific member. An
        /// encoding with a trailing `:` keeps `Some("")`, which resolves
        /// like no preference but prints back the same way.
        preferred: Option<String>,
    },
}

impl ReferenceTarget {
    /// Parse the string encoding. Anything without the `group:` prefix is a
    /// direct document id.
    pub fn parse(raw: &str) -> Self {
        let Some(rest) = raw.strip_prefix(GROUP_PREFIX) else {
            return Self::Direct(raw.to_string());
        };
        return match rest.split_once(':') {
            Some((group_id, preferred)) => Self::Group {
                group_id: group_id.to_string(),
                preferred: Some(preferred.to_string()),
            },
            None => Self::Group {
                group_id: rest.to_string(),
                preferred: None,
            },
        };
    }

    /// The non-empty preferred type or member id of a group target.
    pub fn preference(&self) -> Option<&str> {
        return match self {
            Self::Direct(_) => None,
            Self::Group { preferred, .. } => preferred.as_deref().filter(|p| return !p.is_empty()),
        };
    }
}

impl fmt::Display for ReferenceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::Direct(id) => f.write_str(id),
            Self::Group { group_id, preferred: None } => write!(f, "{GROUP_PREFIX}{group_id}"),
            Self::Group { group_id, preferred: Some(p) } => {
                write!(f, "{GROUP_PREFIX}{group_id}:{p}")
            },
        };
    }
}

impl From<String> for ReferenceTarget {
    fn from(raw: String) -> Self {
        return Self::parse(&raw);
    }
}

impl From<ReferenceTarget> for String {
    fn from(target: ReferenceTarget) -> Self {
        return target.to_string();
    }
}

/// Preset-scoped substitutions: override key to document id. Keys are a
/// bare placeholder key (global) or `"<sourceDocumentId>.<key>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideMap(BTreeMap<String, String>);

impl OverrideMap {
    /// An empty override map.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Exact-match lookup of an override key.
    pub fn get(&self, key: &str) -> Option<&str> {
        return self.0.get(key).map(String::as_str);
    }

    /// Add or replace an override.
    pub fn insert(&mut self, key: impl Into<String>, document_id: impl Into<String>) {
        self.0.insert(key.into(), document_id.into());
    }

    /// Iterate overrides in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        return self.0.iter().map(|(k, v)| return (k.as_str(), v.as_str()));
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        return self.0.len();
    }

    /// Whether there are no overrides.
    pub fn is_empty(&self) -> bool {
        return self.0.is_empty();
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OverrideMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        return Self(iter.into_iter().map(|(k, v)| return (k.into(), v.into())).collect());
    }
}

/// A placeholder found in a text buffer. Offsets are byte offsets;
/// `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// Byte offset just past the closing `}}`, or the cursor when incomplete.
    pub end: usize,
    /// False while the user is still typing inside an unterminated `{{`.
    pub is_complete: bool,
    /// The placeholder key.
    pub key: String,
    /// Byte offset of the opening `{{`.
    pub start: usize,
}

/// One placeholder occurrence discovered during a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionRecord {
    /// `source_document_id.placeholder_key`.
    pub namespaced_key: String,
    /// Concrete document the mapping resolves to, before overrides.
    pub original_target_document_id: String,
    /// Title of the original target.
    pub original_target_document_title: String,
    /// Document an override substitutes, if one applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_target_document_id: Option<String>,
    /// Title of the override target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_target_document_title: Option<String>,
    /// The key as written between the braces.
    pub placeholder_key: String,
    /// Document whose content holds the placeholder.
    pub source_document_id: String,
    /// Title of the source document.
    pub source_document_title: String,
}

impl ResolutionRecord {
    /// The id an editor should display: the override when present.
    pub fn effective_target_document_id(&self) -> &str {
        return self
            .override_target_document_id
            .as_deref()
            .unwrap_or(&self.original_target_document_id);
    }
}

/// Deserialize an explicit `null` as the type's default, so snapshots
/// exported with nulls for empty fields still load.
///
/// # Errors
///
/// Returns the deserializer's error for anything but `null` or a `T`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    return Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_string_is_direct() {
        assert_eq!(ReferenceTarget::parse("intro"), ReferenceTarget::Direct("intro".into()));
    }

    #[test]
    fn group_without_preference() {
        assert_eq!(
            ReferenceTarget::parse("group:names"),
            ReferenceTarget::Group { group_id: "names".into(), preferred: None }
        );
    }

    #[test]
    fn group_with_preference() {
        assert_eq!(
            ReferenceTarget::parse("group:names:formal"),
            ReferenceTarget::Group {
                group_id: "names".into(),
                preferred: Some("formal".into()),
            }
        );
    }

    #[test]
    fn empty_preference_is_no_preference() {
        let target = ReferenceTarget::parse("group:names:");
        assert_eq!(target.preference(), None);
        assert_eq!(ReferenceTarget::parse("group:names").preference(), None);
        assert_eq!(ReferenceTarget::parse("group:names:formal").preference(), Some("formal"));
        assert_eq!(ReferenceTarget::parse("intro").preference(), None);
    }

    #[test]
    fn encoding_survives_display() {
        for raw in ["intro", "group:names", "group:names:", "group:names:formal", "group:g:doc:with:colons"] {
            assert_eq!(ReferenceTarget::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn deserializes_components_from_strings() {
        let doc: Document = serde_json::from_str(
            r#"{"id":"a","title":"A","is_composite":true,"content":"{{x}}",
                "components":{"x":"group:g:t2","y":"b"}}"#,
        )
        .unwrap();
        assert_eq!(
            doc.component("x"),
            Some(&ReferenceTarget::Group { group_id: "g".into(), preferred: Some("t2".into()) })
        );
        assert_eq!(doc.component("y"), Some(&ReferenceTarget::Direct("b".into())));
        assert_eq!(doc.component("z"), None);
    }

    #[test]
    fn null_fields_read_as_empty() {
        let doc: Document = serde_json::from_str(
            r#"{"id":"a","title":"A","content":null,"is_composite":null,
                "group_id":null,"document_type":null,"components":null}"#,
        )
        .unwrap();
        assert_eq!(doc, Document::new("a", "A"));

        let err = serde_json::from_str::<Document>(r#"{"id":"a","title":"A","content":7}"#);
        assert!(err.is_err(), "non-string content must still be rejected");
    }

    #[test]
    fn group_head_detection() {
        assert!(Document::new("g", "G").in_group("g").is_group_head());
        assert!(!Document::new("b", "B").in_group("g").is_group_head());
        assert!(!Document::new("b", "B").is_group_head());
    }
}
