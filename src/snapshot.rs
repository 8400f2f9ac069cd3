//! Snapshot loading: the boundary where a documents/presets file becomes an
//! indexed, immutable set the resolution core can read.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{Document, OverrideMap};

/// A named override map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Override key to document id.
    #[serde(default)]
    pub overrides: OverrideMap,
}

/// On-disk shape of a snapshot file.
#[derive(Debug, Deserialize)]
struct SnapshotFile {
    /// Documents in snapshot order.
    #[serde(default)]
    documents: Vec<Document>,
    /// Presets by name.
    #[serde(default)]
    presets: BTreeMap<String, Preset>,
}

/// Serialization format of a snapshot file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl Format {
    /// Pick a format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedFormat` for anything but `.toml` or `.json`.
    pub fn for_path(path: &Path) -> Result<Self, Error> {
        let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");
        return match ext {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(Error::UnsupportedFormat { file: path.to_path_buf() }),
        };
    }
}

/// All documents and presets for one resolution pass. Document order is
/// preserved and is the tie-break for group resolution.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Document id to position in `documents`.
    by_id: HashMap<String, usize>,
    /// Documents in snapshot order.
    documents: Vec<Document>,
    /// Presets by name.
    presets: BTreeMap<String, Preset>,
}

impl Snapshot {
    /// Index a list of documents.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateDocument` if two documents share an id.
    pub fn new(documents: Vec<Document>) -> Result<Self, Error> {
        let mut by_id = HashMap::with_capacity(documents.len());
        for (idx, doc) in documents.iter().enumerate() {
            if by_id.insert(doc.id.clone(), idx).is_some() {
                return Err(Error::DuplicateDocument { id: doc.id.clone() });
            }
        }
        return Ok(Self {
            by_id,
            documents,
            presets: BTreeMap::new(),
        });
    }

    /// Read a snapshot from a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Returns `Error::SnapshotNotFound` if the file doesn't exist,
    /// `Error::UnsupportedFormat` for an unknown extension,
    /// `Error::TomlDe` / `Error::Json` if the content is malformed,
    /// `Error::SnapshotCorrupt` if a document has an empty id,
    /// or `Error::DuplicateDocument` if ids repeat.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let format = Format::for_path(path)?;
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SnapshotNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let file: SnapshotFile = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        if let Some(pos) = file.documents.iter().position(|d| return d.id.is_empty()) {
            return Err(Error::SnapshotCorrupt {
                file: path.to_path_buf(),
                reason: format!("document #{pos} has an empty id"),
            });
        }

        let preset_count = file.presets.len();
        let mut snapshot = Self::new(file.documents)?;
        snapshot.presets = file.presets;
        tracing::debug!(
            path = %path.display(),
            documents = snapshot.documents.len(),
            presets = preset_count,
            "loaded snapshot"
        );
        return Ok(snapshot);
    }

    /// Look up a document by id.
    pub fn get(&self, id: &str) -> Option<&Document> {
        let idx = *self.by_id.get(id)?;
        return self.documents.get(idx);
    }

    /// Whether a document with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        return self.by_id.contains_key(id);
    }

    /// All documents in snapshot order.
    pub fn documents(&self) -> &[Document] {
        return &self.documents;
    }

    /// Members of a group in snapshot order.
    pub fn group_members<'a, 'g>(
        &'a self,
        group_id: &'g str,
    ) -> impl Iterator<Item = &'a Document> + use<'a, 'g> {
        return self
            .documents
            .iter()
            .filter(move |d| return d.group_id.as_deref() == Some(group_id));
    }

    /// Preset names in sorted order.
    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        return self.presets.keys().map(String::as_str);
    }

    /// Look up a preset by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownPreset` if no preset has this name.
    pub fn preset(&self, name: &str) -> Result<&Preset, Error> {
        return self.presets.get(name).ok_or_else(|| {
            return Error::UnknownPreset { name: name.to_string() };
        });
    }

    /// The override map for an optional preset name.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownPreset` if a name is given and not found.
    pub fn overrides(&self, preset: Option<&str>) -> Result<Option<&OverrideMap>, Error> {
        let Some(name) = preset else {
            return Ok(None);
        };
        return Ok(Some(&self.preset(name)?.overrides));
    }
}
