//! CLI commands for fragref: scan, resolve, walk, check, render, allocate,
//! complete, preset.

use std::process::ExitCode;

use serde::Serialize;

use fragref::config::Config;
use fragref::error::Error;
use fragref::namespace::{self, OverrideScope};
use fragref::scanner::{CLOSE, OPEN};
use fragref::snapshot::Snapshot;
use fragref::types::{Document, ResolutionRecord};
use fragref::walker::{self, Finding};
use fragref::{complete, compose, keys, preset, scanner};

/// Output format for commands with machine-readable output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON on stdout.
    Json,
    /// One line per item.
    #[default]
    Text,
}

/// Machine-readable result of `check`.
#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    /// Everything the audited walks skipped, de-duplicated.
    findings: &'a [Finding],
    /// Ids of the documents audited as starting points.
    roots: Vec<&'a str>,
}

/// Allocate a key for `title`, avoiding the keys already mapped in `within`.
///
/// # Errors
///
/// Returns snapshot loading errors, or `Error::UnknownDocument` if `within`
/// names a missing document.
pub fn allocate(config: &Config, title: &str, within: Option<&str>) -> Result<(), Error> {
    let key = match within {
        None => keys::allocate(title, []),
        Some(id) => {
            let snapshot = load_snapshot(config)?;
            let doc = document(&snapshot, id)?;
            keys::allocate(title, doc.component_keys())
        },
    };
    println!("{key}");
    return Ok(());
}

/// Audit one root, or the whole snapshot, for placeholders the walk had to
/// skip. Without a root every composite is covered: the true roots first,
/// then any cycle of composites no root reaches. Exits 1 when anything was
/// found.
///
/// # Errors
///
/// Returns snapshot loading errors, `Error::UnknownDocument` for a missing
/// root, `Error::UnknownPreset`, or `Error::Json` when JSON output fails.
pub fn check(
    config: &Config,
    root: Option<&str>,
    preset: Option<&str>,
    format: OutputFormat,
) -> Result<ExitCode, Error> {
    let snapshot = load_snapshot(config)?;
    let overrides = snapshot.overrides(config.preset(preset))?;
    let roots: Vec<&Document> = match root {
        Some(id) => vec![document(&snapshot, id)?],
        None => walker::audit_roots(&snapshot),
    };

    // Shared subtrees would otherwise report the same finding once per root.
    let mut findings: Vec<Finding> = Vec::new();
    for root in &roots {
        for finding in walker::audit(&root.id, &snapshot, overrides) {
            if !findings.contains(&finding) {
                findings.push(finding);
            }
        }
    }
    let code = if findings.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(1) };

    if format == OutputFormat::Json {
        let report = CheckReport {
            findings: &findings,
            roots: roots.iter().map(|d| return d.id.as_str()).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(code);
    }

    let root_count = roots.len();
    if findings.is_empty() {
        println!("All placeholders resolve ({root_count} roots)");
        return Ok(code);
    }
    for finding in &findings {
        println!("{} {finding}", finding_label(finding));
    }
    println!();
    println!("{} findings across {root_count} roots", findings.len());
    return Ok(code);
}

/// Suggest completions for the placeholder at byte `offset` in a document's
/// content. Exits 1 when the offset is not inside a placeholder.
///
/// # Errors
///
/// Returns snapshot loading errors, `Error::UnknownDocument`, or
/// `Error::Json` when JSON output fails.
pub fn complete(config: &Config, id: &str, offset: usize, format: OutputFormat) -> Result<ExitCode, Error> {
    let snapshot = load_snapshot(config)?;
    let doc = document(&snapshot, id)?;
    let Some(completion) = complete::suggest(&doc.content, offset, doc, &snapshot) else {
        eprintln!("offset {offset} is not inside a placeholder in `{id}`");
        return Ok(ExitCode::from(1));
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&completion)?);
        return Ok(ExitCode::SUCCESS);
    }
    for suggestion in &completion.suggestions {
        match suggestion {
            complete::Suggestion::ExistingKey { key, target_title } => {
                let title = target_title.as_deref().unwrap_or("unresolved");
                println!("existing  {key}  ({title})");
            },
            complete::Suggestion::NewReference { document_id, key, title } => {
                println!("new       {key}  -> {document_id} ({title})");
            },
        }
    }
    return Ok(ExitCode::SUCCESS);
}

/// List presets, or the overrides of one preset with how each key applies.
///
/// # Errors
///
/// Returns snapshot loading errors or `Error::UnknownPreset`.
pub fn preset_list(config: &Config, name: Option<&str>) -> Result<(), Error> {
    let snapshot = load_snapshot(config)?;
    let Some(name) = name else {
        let default = config.preset(None);
        for preset_name in snapshot.preset_names() {
            let count = snapshot.preset(preset_name)?.overrides.len();
            let marker = if default == Some(preset_name) { " (default)" } else { "" };
            println!("{preset_name}  {count} overrides{marker}");
        }
        return Ok(());
    };

    for (key, target) in snapshot.preset(name)?.overrides.iter() {
        let scope = match namespace::classify(key, &snapshot) {
            OverrideScope::Global { .. } => "global".to_string(),
            OverrideScope::Namespaced { source, .. } => format!("in {source}"),
        };
        println!("{key} = {target}  ({scope})");
    }
    return Ok(());
}

/// Remove one override from a preset in the snapshot file.
///
/// # Errors
///
/// Returns errors from [`preset::clear_override`].
pub fn preset_clear(config: &Config, name: &str, key: &str) -> Result<(), Error> {
    preset::clear_override(config.snapshot_path(), name, key)?;
    eprintln!("cleared {name}: {key}");
    return Ok(());
}

/// Point an override key at a document in the snapshot file.
///
/// # Errors
///
/// Returns snapshot loading errors or errors from [`preset::set_override`].
pub fn preset_set(config: &Config, name: &str, key: &str, document_id: &str) -> Result<(), Error> {
    let snapshot = load_snapshot(config)?;
    preset::set_override(config.snapshot_path(), &snapshot, name, key, document_id)?;
    eprintln!("set {name}: {key} -> {document_id}");
    return Ok(());
}

/// Compose a root document into text on stdout.
///
/// # Errors
///
/// Returns snapshot loading errors, `Error::UnknownDocument`, or
/// `Error::UnknownPreset`.
pub fn render(config: &Config, root: &str, preset: Option<&str>) -> Result<(), Error> {
    let snapshot = load_snapshot(config)?;
    let overrides = snapshot.overrides(config.preset(preset))?;
    let Some(text) = compose::compose(root, &snapshot, overrides) else {
        return Err(Error::UnknownDocument { id: root.to_string() });
    };
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
    return Ok(());
}

/// Print the document one placeholder resolves to. Exits 1 when it
/// resolves to nothing.
///
/// # Errors
///
/// Returns snapshot loading errors, `Error::UnknownDocument`, or
/// `Error::UnknownPreset`.
pub fn resolve(config: &Config, source: &str, key: &str, preset: Option<&str>) -> Result<ExitCode, Error> {
    let snapshot = load_snapshot(config)?;
    document(&snapshot, source)?;
    let overrides = snapshot.overrides(config.preset(preset))?;

    let Some(target) = walker::resolve_key(source, key, &snapshot, overrides) else {
        println!("{source}: {OPEN}{key}{CLOSE} does not resolve");
        return Ok(ExitCode::from(1));
    };
    println!("{}\t{}", target.id, target.title);
    return Ok(ExitCode::SUCCESS);
}

/// List the placeholders in a document with their byte spans and mappings.
///
/// # Errors
///
/// Returns snapshot loading errors or `Error::UnknownDocument`.
pub fn scan(config: &Config, id: &str) -> Result<(), Error> {
    let snapshot = load_snapshot(config)?;
    let doc = document(&snapshot, id)?;
    for occurrence in scanner::scan_all(&doc.content) {
        let mapping = doc
            .component(&occurrence.key)
            .map_or_else(|| return "unmapped".to_string(), |target| return format!("-> {target}"));
        println!(
            "{}..{}  {OPEN}{}{CLOSE}  {mapping}",
            occurrence.start, occurrence.end, occurrence.key
        );
    }
    return Ok(());
}

/// Print the resolution records reachable from a root.
///
/// # Errors
///
/// Returns snapshot loading errors, `Error::UnknownDocument`,
/// `Error::UnknownPreset`, or `Error::Json` when JSON output fails.
pub fn walk(config: &Config, root: &str, preset: Option<&str>, format: OutputFormat) -> Result<(), Error> {
    let snapshot = load_snapshot(config)?;
    document(&snapshot, root)?;
    let overrides = snapshot.overrides(config.preset(preset))?;
    let records = walker::walk(root, &snapshot, overrides);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            for record in &records {
                println!("{}", record_line(record));
            }
        },
    }
    return Ok(());
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Look a document up, turning absence into an error at the CLI boundary.
///
/// # Errors
///
/// Returns `Error::UnknownDocument` if `id` is not in the snapshot.
fn document<'a>(snapshot: &'a Snapshot, id: &str) -> Result<&'a Document, Error> {
    return snapshot.get(id).ok_or_else(|| return Error::UnknownDocument { id: id.to_string() });
}

/// Short uppercase tag for a finding, aligned like `check` output.
const fn finding_label(finding: &Finding) -> &'static str {
    return match finding {
        Finding::Cycle { .. } => "CYCLE    ",
        Finding::MissingOverride { .. } => "OVERRIDE ",
        Finding::MissingTarget { .. } => "MISSING  ",
        Finding::Unmapped { .. } => "UNMAPPED ",
    };
}

/// Read the configured snapshot.
///
/// # Errors
///
/// Returns any error from [`Snapshot::read`].
fn load_snapshot(config: &Config) -> Result<Snapshot, Error> {
    return Snapshot::read(config.snapshot_path());
}

/// One text line per record: `key  source -> target`, plus the override.
fn record_line(record: &ResolutionRecord) -> String {
    let mut line = format!(
        "{}  {} -> {}",
        record.namespaced_key, record.source_document_id, record.original_target_document_id
    );
    if let Some(id) = &record.override_target_document_id {
        line.push_str(&format!(" (override: {id})"));
    }
    return line;
}
