//! Crate-level error type for the snapshot, config, and editing boundaries.
//!
//! The resolution core (scanner, resolver, override layer, walker, composer,
//! key allocator) never produces these: absence degrades to `None` or to an
//! omitted record. Errors exist only where raw input enters the crate.
use std::path::PathBuf;

/// Every error names the file, document, preset, or key involved so a
/// diagnostic can be rendered without a debugger.
#[allow(clippy::error_impl_error, reason = "single crate-wide error type, re-exported as fragref::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Config file `extends` chain loops back on itself.
    #[error("config cycle detected: {}", chain.iter().map(|p| return p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    ConfigCycle {
        /// Ordered chain of config file paths forming the cycle.
        chain: Vec<PathBuf>,
    },

    /// A config file named by `extends` does not exist on disk.
    #[error("config not found: {}", path.display())]
    ConfigNotFound {
        /// Path to the missing config file.
        path: PathBuf,
    },

    /// Two documents in one snapshot share an id.
    #[error("duplicate document id `{id}`")]
    DuplicateDocument {
        /// The repeated document id.
        id: String,
    },

    /// A placeholder key was rejected at the editing boundary.
    #[error("invalid placeholder key `{key}`: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why the key was rejected.
        reason: &'static str,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A TOML document could not be parsed for format-preserving editing.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// Snapshot file exists but its structure is unusable.
    #[error("snapshot corrupt: {}: {reason}", file.display())]
    SnapshotCorrupt {
        /// Snapshot file that was rejected.
        file: PathBuf,
        /// Description of the corruption.
        reason: String,
    },

    /// Expected snapshot file does not exist on disk.
    #[error("snapshot not found: {}", path.display())]
    SnapshotNotFound {
        /// Path to the missing snapshot.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No document in the snapshot has this id.
    #[error("unknown document: `{id}`")]
    UnknownDocument {
        /// Document id that was not found.
        id: String,
    },

    /// The preset has no override under this key.
    #[error("preset `{preset}` has no override `{key}`")]
    UnknownOverride {
        /// Override key that was not found.
        key: String,
        /// Preset that was searched.
        preset: String,
    },

    /// No preset with this name exists in the snapshot.
    #[error("unknown preset: `{name}`")]
    UnknownPreset {
        /// Preset name that was not found.
        name: String,
    },

    /// Snapshot file extension is neither `.toml` nor `.json`, or the
    /// operation needs a format the file is not in.
    #[error("unsupported snapshot format: {}", file.display())]
    UnsupportedFormat {
        /// The offending snapshot path.
        file: PathBuf,
    },
}
