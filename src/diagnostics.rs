//! Markdown rendering of boundary errors for the terminal.
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE;
use crate::error::Error;

/// ANSI bold, applied to markdown headings on stderr.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic: a heading, what
/// happened, and a `## Fix` section when there is something to do about it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigCycle { chain } => render_config_cycle(chain),
        Error::ConfigNotFound { path } => format!("\
# Error: Config Not Found

`{}` does not exist.

## Fix

Check the `extends` path in your `{CONFIG_FILE}`.
", path.display()),
        Error::DuplicateDocument { id } => format!("\
# Error: Duplicate Document

More than one document has the id `{id}`.

## Fix

Give each document in the snapshot a unique `id`.
"),
        Error::InvalidKey { key, reason } => format!("\
# Error: Invalid Key

`{key}` cannot be used as a placeholder key: {reason}.

## Fix

Pick a key such as `hero_banner`, or let fragref choose one:

    fragref allocate \"Hero Banner\"
"),
        Error::SnapshotNotFound { path } => render_snapshot_not_found(path),
        Error::UnknownDocument { id } => format!("\
# Error: Unknown Document

No document in the snapshot has the id `{id}`.
"),
        Error::UnknownOverride { key, preset } => format!("\
# Error: Unknown Override

Preset `{preset}` has no override for `{key}`.

## Fix

List the overrides it does have:

    fragref preset list {preset}
"),
        Error::UnknownPreset { name } => format!("\
# Error: Unknown Preset

Preset `{name}` is not defined in the snapshot.

## Fix

List the available presets:

    fragref preset list
"),
        Error::UnsupportedFormat { file } => render_unsupported_format(file),
        _ => render_generic(e),
    };
}

/// Errors that only need their message under a heading.
fn render_generic(e: &Error) -> String {
    let (title, detail) = match e {
        Error::Io(err) => ("I/O", err.to_string()),
        Error::Json(err) => ("Invalid JSON", err.to_string()),
        Error::ParseFailed { file, reason } => ("Parse Failed", format!("Could not parse `{}`: {reason}", file.display())),
        Error::SnapshotCorrupt { file, reason } => ("Snapshot Corrupt", format!("`{}`: {reason}", file.display())),
        Error::TomlDe(err) => ("Invalid TOML", err.to_string()),
        _ => ("", e.to_string()),
    };
    if title.is_empty() {
        return format!("# Error\n\n{detail}\n");
    }
    return format!("# Error: {title}\n\n{detail}\n");
}

/// Missing snapshot file, with the two ways to point at the right one.
fn render_snapshot_not_found(path: &Path) -> String {
    return format!("\
# Error: Snapshot Not Found

`{}` does not exist.

## Fix

Set the snapshot path in `{CONFIG_FILE}`:

    snapshot = \"path/to/fragments.toml\"

Or pass it explicitly:

    fragref --snapshot path/to/fragments.toml <command>
", path.display());
}

/// Snapshot file with an extension fragref can't read, or a JSON file given
/// to an operation that edits TOML.
fn render_unsupported_format(file: &Path) -> String {
    return format!("\
# Error: Unsupported Format

`{}` can't be used here.

## Supported formats

- `.toml`: read and preset editing
- `.json`: read only
", file.display());
}

/// `extends` chain that loops back on itself.
fn render_config_cycle(chain: &[PathBuf]) -> String {
    let mut out = String::from("# Error: Config Cycle Detected\n\nCircular `extends` chain:\n\n");
    for path in chain {
        let _ = writeln!(out, "- `{}`", path.display());
    }
    out.push_str("\n## Fix\n\nRemove the circular `extends` reference in one of the config files.\n");
    return out;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_preset_suggests_listing() {
        let md = render_error(&Error::UnknownPreset { name: "launch".into() });
        assert!(md.starts_with("# Error: Unknown Preset\n"), "{md}");
        assert!(md.contains("`launch`"));
        assert!(md.contains("fragref preset list"));
    }

    #[test]
    fn unknown_override_names_preset_and_key() {
        let md = render_error(&Error::UnknownOverride { key: "intro.name".into(), preset: "p".into() });
        assert!(md.contains("Preset `p` has no override for `intro.name`"), "{md}");
        assert!(md.contains("fragref preset list p"));
    }

    #[test]
    fn config_cycle_lists_chain() {
        let chain = vec![PathBuf::from("a.toml"), PathBuf::from("b.toml"), PathBuf::from("a.toml")];
        let md = render_error(&Error::ConfigCycle { chain });
        assert!(md.contains("- `a.toml`\n- `b.toml`\n- `a.toml`\n"), "{md}");
        assert!(md.contains("## Fix"));
    }

    #[test]
    fn generic_errors_keep_their_message() {
        let md = render_error(&Error::SnapshotCorrupt {
            file: PathBuf::from("f.toml"),
            reason: "document 2 has an empty id".into(),
        });
        assert_eq!(md, "# Error: Snapshot Corrupt\n\n`f.toml`: document 2 has an empty id\n");

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(render_error(&Error::Io(io)).starts_with("# Error: I/O\n"));
    }

    #[test]
    fn every_heading_is_markdown() {
        let errors = [
            Error::ConfigNotFound { path: PathBuf::from("x.toml") },
            Error::DuplicateDocument { id: "a".into() },
            Error::InvalidKey { key: "a b".into(), reason: "no spaces" },
            Error::SnapshotNotFound { path: PathBuf::from("fragments.toml") },
            Error::UnknownDocument { id: "a".into() },
            Error::UnsupportedFormat { file: PathBuf::from("f.yaml") },
        ];
        for e in &errors {
            let md = render_error(e);
            assert!(md.starts_with("# Error: "), "{md}");
            assert!(md.ends_with('\n'), "{md}");
        }
    }
}
