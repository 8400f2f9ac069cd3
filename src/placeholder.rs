//! Editable representation of placeholders and its textual round trip.
//!
//! A [`PlaceholderUnit`] carries transient editor state (cached title and
//! content, expanded or collapsed) next to its key. The textual form is
//! always exactly `{{key}}`: none of that state is ever written out, so
//! toggling presentation never changes stored content.
use std::fmt;

use crate::error::Error;
use crate::keys;
use crate::scanner::{self, CLOSE, OPEN};
use crate::snapshot::Snapshot;
use crate::types::OverrideMap;
use crate::walker;

/// How an editor presents a placeholder unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Presentation {
    /// Shown as the bare placeholder.
    #[default]
    Collapsed,
    /// Shown with the resolved content inline.
    Expanded,
}

/// An inline placeholder in the editable representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderUnit {
    /// Content of the resolved document, if hydrated.
    cached_content: Option<String>,
    /// Title of the resolved document, if hydrated.
    cached_title: Option<String>,
    /// The key between the braces, exactly as written.
    key: String,
    /// Presentation state.
    presentation: Presentation,
}

impl PlaceholderUnit {
    /// A collapsed unit with nothing cached.
    pub fn new(key: impl Into<String>) -> Self {
        return Self {
            cached_content: None,
            cached_title: None,
            key: key.into(),
            presentation: Presentation::Collapsed,
        };
    }

    /// Build a unit from text that is exactly one placeholder. The key is
    /// kept verbatim so export reproduces the input.
    pub fn import(text: &str) -> Option<Self> {
        let occurrence = match scanner::scan_all(text).as_slice() {
            [only] => only.clone(),
            _ => return None,
        };
        if occurrence.start != 0 || occurrence.end != text.len() {
            return None;
        }
        return Some(Self::new(occurrence.key));
    }

    /// The canonical textual form, `{{key}}`.
    pub fn export(&self) -> String {
        return format!("{OPEN}{}{CLOSE}", self.key);
    }

    /// The placeholder key.
    pub fn key(&self) -> &str {
        return &self.key;
    }

    /// Change this unit's key. Cached content belonged to the old key and
    /// is dropped; nothing outside this unit is touched.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the key is empty or has characters
    /// outside letters, digits, `_`, and `-`.
    pub fn rename(&mut self, key: &str) -> Result<(), Error> {
        keys::validate_key(key)?;
        self.key = key.to_string();
        self.cached_title = None;
        self.cached_content = None;
        return Ok(());
    }

    /// Cache the resolved document's title and content.
    pub fn cache(&mut self, title: impl Into<String>, content: impl Into<String>) {
        self.cached_title = Some(title.into());
        self.cached_content = Some(content.into());
    }

    /// Cached title of the resolved document.
    pub fn cached_title(&self) -> Option<&str> {
        return self.cached_title.as_deref();
    }

    /// Cached content of the resolved document.
    pub fn cached_content(&self) -> Option<&str> {
        return self.cached_content.as_deref();
    }

    /// Current presentation state.
    pub const fn presentation(&self) -> Presentation {
        return self.presentation;
    }

    /// Show resolved content inline.
    pub const fn expand(&mut self) {
        self.presentation = Presentation::Expanded;
    }

    /// Show the bare placeholder.
    pub const fn collapse(&mut self) {
        self.presentation = Presentation::Collapsed;
    }

    /// Flip between expanded and collapsed.
    pub const fn toggle(&mut self) {
        self.presentation = match self.presentation {
            Presentation::Collapsed => Presentation::Expanded,
            Presentation::Expanded => Presentation::Collapsed,
        };
    }
}

impl fmt::Display for PlaceholderUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{OPEN}{}{CLOSE}", self.key);
    }
}

/// A piece of an editable buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// An atomic placeholder unit.
    Placeholder(PlaceholderUnit),
    /// Literal text, including anything that merely looks like a delimiter.
    Text(String),
}

/// A text buffer split into literal text and placeholder units.
/// `EditableContent::parse(t).to_text() == t` for every `t`, whether or
/// not the placeholders resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableContent {
    /// Segments in buffer order.
    segments: Vec<Segment>,
}

impl EditableContent {
    /// Split `text` at every complete placeholder.
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut cursor = 0;
        for occurrence in scanner::scan_all(text) {
            push_text(&mut segments, text.get(cursor..occurrence.start));
            segments.push(Segment::Placeholder(PlaceholderUnit::new(occurrence.key)));
            cursor = occurrence.end;
        }
        push_text(&mut segments, text.get(cursor..));
        return Self { segments };
    }

    /// Serialize back to text. Units export as `{{key}}` only.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Placeholder(unit) => out.push_str(&unit.export()),
                Segment::Text(text) => out.push_str(text),
            }
        }
        return out;
    }

    /// All segments in order.
    pub fn segments(&self) -> &[Segment] {
        return &self.segments;
    }

    /// Placeholder units in order.
    pub fn units(&self) -> impl Iterator<Item = &PlaceholderUnit> {
        return self.segments.iter().filter_map(|s| {
            return match s {
                Segment::Placeholder(unit) => Some(unit),
                Segment::Text(_) => None,
            };
        });
    }

    /// The `index`-th placeholder unit, for editing in place.
    pub fn unit_mut(&mut self, index: usize) -> Option<&mut PlaceholderUnit> {
        return self
            .segments
            .iter_mut()
            .filter_map(|s| {
                return match s {
                    Segment::Placeholder(unit) => Some(unit),
                    Segment::Text(_) => None,
                };
            })
            .nth(index);
    }

    /// Cache resolved content on every unit whose key resolves from
    /// `source_id`. Units that don't resolve keep no cache and stay intact.
    pub fn hydrate(&mut self, source_id: &str, snapshot: &Snapshot, overrides: Option<&OverrideMap>) {
        for segment in &mut self.segments {
            let Segment::Placeholder(unit) = segment else {
                continue;
            };
            if let Some(doc) = walker::resolve_key(source_id, &unit.key, snapshot, overrides) {
                unit.cache(doc.title.as_str(), doc.content.as_str());
            }
        }
    }
}

/// Append a non-empty text slice as a segment.
fn push_text(segments: &mut Vec<Segment>, text: Option<&str>) {
    if let Some(text) = text.filter(|t| return !t.is_empty()) {
        segments.push(Segment::Text(text.to_string()));
    }
}
