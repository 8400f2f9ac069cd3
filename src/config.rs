//! Project configuration: `.fragref.toml`, its `extends` chain, and defaults.
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".fragref.toml";

/// Snapshot used when no config names one.
pub const DEFAULT_SNAPSHOT: &str = "fragments.toml";

/// Project configuration loaded from `.fragref.toml`, with any `extends`
/// chain already merged. Relative paths are resolved against the directory
/// of the config file that declared them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Preset applied when a command is not given one.
    preset: Option<String>,
    /// Snapshot file every command reads.
    snapshot: PathBuf,
}

/// Raw TOML structure for `.fragref.toml`.
#[derive(serde::Deserialize)]
struct FragrefTomlConfig {
    /// Parent config whose values this file inherits.
    #[serde(default)]
    extends: Option<PathBuf>,
    /// Default preset name.
    #[serde(default)]
    preset: Option<String>,
    /// Snapshot path.
    #[serde(default)]
    snapshot: Option<PathBuf>,
}

/// Values gathered so far while walking an `extends` chain.
#[derive(Default)]
struct Layer {
    /// Default preset name.
    preset: Option<String>,
    /// Snapshot path, already joined to its config's directory.
    snapshot: Option<PathBuf>,
}

impl Config {
    /// Load `.fragref.toml` from `root`, following `extends`.
    /// Returns defaults if the file doesn't exist. A config file that exists
    /// but is malformed is an error, never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if any file in the chain is malformed,
    /// `Error::ConfigNotFound` if an `extends` target is missing,
    /// or `Error::ConfigCycle` if the chain loops.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!(root = %root.display(), "no config file, using defaults");
            return Ok(Self::defaults(root));
        }

        let mut chain = vec![std::fs::canonicalize(&path)?];
        let layer = load_layer(&path, &mut chain)?;
        return Ok(Self {
            preset: layer.preset,
            snapshot: layer.snapshot.unwrap_or_else(|| return root.join(DEFAULT_SNAPSHOT)),
        });
    }

    /// Defaults for a project rooted at `root`: `fragments.toml`, no preset.
    pub fn defaults(root: &Path) -> Self {
        return Self {
            preset: None,
            snapshot: root.join(DEFAULT_SNAPSHOT),
        };
    }

    /// Replace the snapshot path, e.g. from a command-line flag.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: PathBuf) -> Self {
        self.snapshot = snapshot;
        return self;
    }

    /// Path of the snapshot file.
    pub fn snapshot_path(&self) -> &Path {
        return &self.snapshot;
    }

    /// The preset to use: `explicit` if given, else the configured default.
    pub fn preset<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        return explicit.or(self.preset.as_deref());
    }
}

/// Read one config file and, depth first, everything it extends. Values in
/// `path` override inherited ones. `chain` holds the canonical paths already
/// on the current chain.
///
/// # Errors
///
/// Returns `Error::Io`, `Error::TomlDe`, `Error::ConfigNotFound`, or
/// `Error::ConfigCycle` as described on [`Config::load`].
fn load_layer(path: &Path, chain: &mut Vec<PathBuf>) -> Result<Layer, Error> {
    let content = std::fs::read_to_string(path)?;
    let raw: FragrefTomlConfig = toml::from_str(&content)?;
    let dir = path.parent().unwrap_or_else(|| return Path::new(""));

    let mut layer = match raw.extends {
        None => Layer::default(),
        Some(parent) => {
            let parent_path = dir.join(parent);
            let Ok(canonical) = std::fs::canonicalize(&parent_path) else {
                return Err(Error::ConfigNotFound { path: parent_path });
            };
            let looped = chain.contains(&canonical);
            chain.push(canonical);
            if looped {
                return Err(Error::ConfigCycle { chain: chain.clone() });
            }
            tracing::debug!(config = %path.display(), parent = %parent_path.display(), "extending config");
            load_layer(&parent_path, chain)?
        },
    };

    if let Some(snapshot) = raw.snapshot {
        layer.snapshot = Some(dir.join(snapshot));
    }
    if raw.preset.is_some() {
        layer.preset = raw.preset;
    }
    return Ok(layer);
}
