mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fragref::config::Config;
use fragref::diagnostics;
use fragref::error::Error;
use tracing_subscriber::EnvFilter;

use crate::commands::OutputFormat;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "FRAGREF_LOG";

/// Exit code for errors that stopped a command from running.
const EXIT_ERROR: u8 = 3;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "fragref", version, about = "Resolve and compose {{key}} fragment references")]
struct Cli {
    /// What to do.
    #[command(subcommand)]
    command: Commands,
    /// Snapshot file to read instead of the one in .fragref.toml
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    /// Log debug output to stderr (FRAGREF_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Allocate a fresh placeholder key from a title
    Allocate {
        /// Human-readable title, e.g. "Hero Banner"
        title: String,
        /// Avoid the keys already mapped in this document
        #[arg(long = "in")]
        within: Option<String>,
    },
    /// Report placeholders a walk has to skip (exit 1 if any)
    Check {
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Preset whose overrides apply; default from .fragref.toml
        #[arg(long)]
        preset: Option<String>,
        /// Audit only this root; default is every composite in the snapshot
        root: Option<String>,
    },
    /// Suggest completions for the placeholder at a byte offset
    Complete {
        /// Document whose content is being edited
        document: String,
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Byte offset of the cursor in the content
        offset: usize,
    },
    /// Manage preset overrides in the snapshot file
    Preset {
        /// Preset operation.
        #[command(subcommand)]
        action: PresetAction,
    },
    /// Compose a root document into plain text
    Render {
        /// Preset whose overrides apply; default from .fragref.toml
        #[arg(long)]
        preset: Option<String>,
        /// Root document id
        root: String,
    },
    /// Show the document one placeholder resolves to (exit 1 if none)
    Resolve {
        /// Document containing the placeholder
        document: String,
        /// Placeholder key
        key: String,
        /// Preset whose overrides apply; default from .fragref.toml
        #[arg(long)]
        preset: Option<String>,
    },
    /// List placeholders in a document's content
    Scan {
        /// Document id
        document: String,
    },
    /// List every resolution reachable from a root document
    Walk {
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Preset whose overrides apply; default from .fragref.toml
        #[arg(long)]
        preset: Option<String>,
        /// Root document id
        root: String,
    },
}

/// `preset` subcommands.
#[derive(Subcommand)]
enum PresetAction {
    /// Remove an override
    Clear {
        /// Bare key or `<sourceDocumentId>.<key>`
        #[arg(index = 2)]
        key: String,
        /// Preset name
        #[arg(index = 1)]
        preset: String,
    },
    /// List presets, or one preset's overrides
    List {
        /// Preset to show; all presets when omitted
        preset: Option<String>,
    },
    /// Point an override at a document, creating the preset if needed
    Set {
        /// Document the placeholder should show
        #[arg(index = 3)]
        document: String,
        /// Bare key or `<sourceDocumentId>.<key>`
        #[arg(index = 2)]
        key: String,
        /// Preset name
        #[arg(index = 1)]
        preset: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    return match run(cli) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(EXIT_ERROR)
        },
    };
}

/// Install the stderr subscriber. `FRAGREF_LOG` wins; otherwise `warn`, or
/// `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| return EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load config and dispatch to the command.
///
/// # Errors
///
/// Returns any error from config loading or the command itself.
fn run(cli: Cli) -> Result<ExitCode, Error> {
    let mut config = Config::load(Path::new("."))?;
    if let Some(snapshot) = cli.snapshot {
        config = config.with_snapshot(snapshot);
    }

    let done = |result: Result<(), Error>| return result.map(|()| return ExitCode::SUCCESS);
    return match cli.command {
        Commands::Allocate { title, within } => done(commands::allocate(&config, &title, within.as_deref())),
        Commands::Check { format, preset, root } => {
            commands::check(&config, root.as_deref(), preset.as_deref(), format)
        },
        Commands::Complete { document, offset, format } => commands::complete(&config, &document, offset, format),
        Commands::Preset { action } => match action {
            PresetAction::Clear { preset, key } => done(commands::preset_clear(&config, &preset, &key)),
            PresetAction::List { preset } => done(commands::preset_list(&config, preset.as_deref())),
            PresetAction::Set { preset, key, document } => {
                done(commands::preset_set(&config, &preset, &key, &document))
            },
        },
        Commands::Render { root, preset } => done(commands::render(&config, &root, preset.as_deref())),
        Commands::Resolve { document, key, preset } => {
            commands::resolve(&config, &document, &key, preset.as_deref())
        },
        Commands::Scan { document } => done(commands::scan(&config, &document)),
        Commands::Walk { root, preset, format } => {
            done(commands::walk(&config, &root, preset.as_deref(), format))
        },
    };
}
