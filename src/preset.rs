//! Format-preserving edits of preset overrides inside a TOML snapshot.
//!
//! Overrides live under `[presets.<name>.overrides]`, keyed by a bare
//! placeholder key or `"<sourceDocumentId>.<key>"`. Comments, ordering, and
//! formatting elsewhere in the file are left untouched.

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::snapshot::{Format, Snapshot};

/// Table holding all presets.
const PRESETS: &str = "presets";
/// Table holding one preset's override map.
const OVERRIDES: &str = "overrides";

/// Point `key` in `preset` at `document_id`, creating the preset if needed.
///
/// # Errors
///
/// Returns `Error::InvalidKey` for an empty key,
/// `Error::UnknownDocument` if `document_id` is not in `snapshot`,
/// `Error::UnsupportedFormat` if `path` is not a TOML file,
/// `Error::SnapshotNotFound` / `Error::ParseFailed` if it can't be read,
/// `Error::SnapshotCorrupt` if the presets layout is not made of tables,
/// or `Error::Io` if writing fails.
pub fn set_override(
    path: &Path,
    snapshot: &Snapshot,
    preset: &str,
    key: &str,
    document_id: &str,
) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::InvalidKey {
            key: String::new(),
            reason: "key is empty",
        });
    }
    if !snapshot.contains(document_id) {
        return Err(Error::UnknownDocument { id: document_id.to_string() });
    }

    let mut doc = read_snapshot_doc(path)?;
    let presets = child_table(&mut doc, PRESETS, path)?;
    let preset_table = child_table(presets, preset, path)?;
    let overrides = preset_table
        .entry(OVERRIDES)
        .or_insert(toml_edit::table())
        .as_table_like_mut()
        .ok_or_else(|| return not_a_table(path, &format!("{PRESETS}.{preset}.{OVERRIDES}")))?;
    overrides.insert(key, toml_edit::value(document_id));

    std::fs::write(path, doc.to_string())?;
    tracing::debug!(preset, key, document_id, "override set");
    return Ok(());
}

/// Remove `key` from `preset`.
///
/// # Errors
///
/// Returns `Error::UnknownPreset` if the preset doesn't exist,
/// `Error::UnknownOverride` if it has no such key,
/// `Error::UnsupportedFormat` / `Error::SnapshotNotFound` /
/// `Error::ParseFailed` if the file can't be read as TOML,
/// or `Error::Io` if writing fails.
pub fn clear_override(path: &Path, preset: &str, key: &str) -> Result<(), Error> {
    let mut doc = read_snapshot_doc(path)?;

    let preset_table = doc
        .get_mut(PRESETS)
        .and_then(toml_edit::Item::as_table_like_mut)
        .and_then(|presets| return presets.get_mut(preset))
        .and_then(toml_edit::Item::as_table_like_mut)
        .ok_or_else(|| return Error::UnknownPreset { name: preset.to_string() })?;

    let removed = preset_table
        .get_mut(OVERRIDES)
        .and_then(toml_edit::Item::as_table_like_mut)
        .and_then(|overrides| return overrides.remove(key));
    if removed.is_none() {
        return Err(Error::UnknownOverride {
            key: key.to_string(),
            preset: preset.to_string(),
        });
    }

    std::fs::write(path, doc.to_string())?;
    tracing::debug!(preset, key, "override cleared");
    return Ok(());
}

/// Parse a TOML snapshot into a format-preserving document.
///
/// # Errors
///
/// Returns `Error::UnsupportedFormat` for non-TOML paths,
/// `Error::SnapshotNotFound` if missing, `Error::Io` on other read failures,
/// or `Error::ParseFailed` if the TOML is malformed.
fn read_snapshot_doc(path: &Path) -> Result<toml_edit::DocumentMut, Error> {
    if Format::for_path(path)? != Format::Toml {
        return Err(Error::UnsupportedFormat { file: path.to_path_buf() });
    }
    let content = match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::SnapshotNotFound { path: path.to_path_buf() });
        },
        Err(e) => return Err(Error::Io(e)),
        Ok(c) => c,
    };

    return content.parse().map_err(|e: toml_edit::TomlError| {
        return Error::ParseFailed {
            file: path.to_path_buf(),
            reason: e.to_string(),
        };
    });
}

/// Get or create a standard (non-inline) child table. Created tables are
/// implicit so only their leaf headers are written.
///
/// # Errors
///
/// Returns `Error::SnapshotCorrupt` if `name` exists but is not a table.
fn child_table<'t>(
    parent: &'t mut toml_edit::Table,
    name: &str,
    path: &Path,
) -> Result<&'t mut toml_edit::Table, Error> {
    let item = parent.entry(name).or_insert_with(|| {
        let mut table = toml_edit::Table::new();
        table.set_implicit(true);
        return toml_edit::Item::Table(table);
    });
    return item.as_table_mut().ok_or_else(|| return not_a_table(path, name));
}

/// Error for a presets layout entry that is not a table.
fn not_a_table(path: &Path, name: &str) -> Error {
    return Error::SnapshotCorrupt {
        file: PathBuf::from(path),
        reason: format!("`{name}` must be a table"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;

    const SNAPSHOT: &str = r#"# Fragments for the launch site.

[[documents]]
id = "intro"
title = "Intro"
is_composite = true
content = "Hello {{name}}"
components = { name = "formal" } # mapped by hand

[[documents]]
id = "formal"
title = "Formal"

[[documents]]
id = "casual"
title = "Casual"
"#;

    fn setup(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragments.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn set_creates_preset_and_preserves_formatting() {
        let (_dir, path) = setup(SNAPSHOT);
        let snapshot = Snapshot::read(&path).unwrap();

        set_override(&path, &snapshot, "launch", "intro.name", "casual").unwrap();
        set_override(&path, &snapshot, "launch", "name", "formal").unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Fragments for the launch site."), "{written}");
        assert!(written.contains("# mapped by hand"), "{written}");
        assert!(written.contains("[presets.launch.overrides]"), "{written}");
        assert!(written.contains("\"intro.name\" = \"casual\""), "{written}");

        let reread = Snapshot::read(&path).unwrap();
        let overrides = reread.overrides(Some("launch")).unwrap().unwrap();
        assert_eq!(overrides.get("intro.name"), Some("casual"));
        assert_eq!(overrides.get("name"), Some("formal"));
    }

    #[test]
    fn set_replaces_existing_value() {
        let (_dir, path) = setup(SNAPSHOT);
        let snapshot = Snapshot::read(&path).unwrap();
        set_override(&path, &snapshot, "p", "name", "formal").unwrap();
        set_override(&path, &snapshot, "p", "name", "casual").unwrap();
        let reread = Snapshot::read(&path).unwrap();
        assert_eq!(reread.preset("p").unwrap().overrides.len(), 1);
        assert_eq!(reread.preset("p").unwrap().overrides.get("name"), Some("casual"));
    }

    #[test]
    fn set_rejects_unknown_document_and_empty_key() {
        let (_dir, path) = setup(SNAPSHOT);
        let snapshot = Snapshot::read(&path).unwrap();
        assert!(matches!(
            set_override(&path, &snapshot, "p", "name", "ghost"),
            Err(Error::UnknownDocument { .. })
        ));
        assert!(matches!(
            set_override(&path, &snapshot, "p", "", "formal"),
            Err(Error::InvalidKey { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SNAPSHOT);
    }

    #[test]
    fn set_into_inline_overrides_table() {
        let content = format!("{SNAPSHOT}\n[presets.p]\noverrides = {{ name = \"formal\" }}\n");
        let (_dir, path) = setup(&content);
        let snapshot = Snapshot::read(&path).unwrap();
        set_override(&path, &snapshot, "p", "intro.name", "casual").unwrap();
        let reread = Snapshot::read(&path).unwrap();
        let overrides = &reread.preset("p").unwrap().overrides;
        assert_eq!(overrides.get("name"), Some("formal"));
        assert_eq!(overrides.get("intro.name"), Some("casual"));
    }

    #[test]
    fn clear_removes_only_the_key() {
        let (_dir, path) = setup(SNAPSHOT);
        let snapshot = Snapshot::read(&path).unwrap();
        set_override(&path, &snapshot, "p", "a", "formal").unwrap();
        set_override(&path, &snapshot, "p", "b", "casual").unwrap();

        clear_override(&path, "p", "a").unwrap();
        let reread = Snapshot::read(&path).unwrap();
        let overrides = &reread.preset("p").unwrap().overrides;
        assert_eq!(overrides.get("a"), None);
        assert_eq!(overrides.get("b"), Some("casual"));
    }

    #[test]
    fn clear_unknown_preset_or_key() {
        let (_dir, path) = setup(SNAPSHOT);
        assert!(matches!(clear_override(&path, "p", "a"), Err(Error::UnknownPreset { .. })));

        let snapshot = Snapshot::read(&path).unwrap();
        set_override(&path, &snapshot, "p", "a", "formal").unwrap();
        assert!(matches!(clear_override(&path, "p", "zzz"), Err(Error::UnknownOverride { .. })));
    }

    #[test]
    fn json_snapshots_are_not_editable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragments.json");
        std::fs::write(&path, r#"{"documents":[{"id":"a","title":"A"}]}"#).unwrap();
        let snapshot = Snapshot::new(vec![Document::new("a", "A")]).unwrap();
        assert!(matches!(
            set_override(&path, &snapshot, "p", "k", "a"),
            Err(Error::UnsupportedFormat { .. })
        ));
    }
}
