//! packsmith - plugin manager for the editor's native package directories.
//!
//! Keeps `pack/packsmith/{start,opt}` in line with a YAML manifest: `add`
//! and `rm` edit the manifest, `sync` garbage-collects undeclared
//! directories and installs missing plugins from their source archives.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use packsmith_core::{
    Group, MANIFEST_ENV, ManifestLookup, ManifestStore, PACK_DIR_ENV, resolve_manifest_path,
};
use packsmith_telemetry::prelude::*;

mod commands;
mod theme;

use commands::SyncArgs;
use theme::Theme;

const EXAMPLES: &str = "\
Examples:
  packsmith add start https://github.com/acme/foo/archive/refs/heads/main.zip
  packsmith add opt https://github.com/acme/bar/archive/refs/tags/v1.0.0.zip
  packsmith rm opt acme/bar
  packsmith sync
  packsmith sync --dry-run";

/// packsmith - editor plugin manager
#[derive(Parser, Debug)]
#[command(name = "packsmith")]
#[command(author, version, about, long_about = None)]
#[command(after_help = EXAMPLES)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the plugin manifest
    #[arg(long, global = true, env = MANIFEST_ENV, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Use this directory as `pack/packsmith` instead of asking the editor
    #[arg(long, global = true, env = PACK_DIR_ENV, value_name = "DIR")]
    pack_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Remove undeclared plugins and install missing ones
    Sync {
        /// Reinstall plugins left incomplete by an interrupted sync
        #[arg(long)]
        repair: bool,

        /// Print what would change without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Declare a plugin from its archive URL
    Add {
        /// Plugin group: start (eager) or opt (optional)
        group: Group,

        /// URL of a zip archive of the plugin
        url: String,
    },

    /// Remove a declared plugin
    Rm {
        /// Plugin group: start (eager) or opt (optional)
        group: Group,

        /// Repository as shown by `list` (e.g. acme/foo)
        repository: String,
    },

    /// Print the manifest
    List,

    /// Print the packsmith version
    Version,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version requests are successes; every usage error is 1.
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            if let Err(print_err) = e.print() {
                eprintln!("{print_err}");
            }
            return code;
        },
    };

    if let Err(e) = setup_logging(&log_config(cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", Theme::error_label());
            ExitCode::FAILURE
        },
    }
}

/// Logging from `--verbose`, overridable through the environment.
fn log_config(verbose: bool) -> LogConfig {
    let level = if verbose { "debug" } else { "warn" };
    LogConfig::new(level)
        .with_format(LogFormat::Compact)
        .with_directive("reqwest=warn")
        .with_env_overrides(|key| std::env::var(key).ok())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let store = || {
        let path = resolve_manifest_path(&ManifestLookup::from_env(cli.manifest.clone()));
        tracing::debug!(path = %path.display(), "Using manifest");
        ManifestStore::new(path)
    };

    match cli.command {
        Commands::Sync { repair, dry_run } => {
            commands::sync_plugins(&store(), cli.pack_dir.clone(), SyncArgs { repair, dry_run })
        },
        Commands::Add { group, url } => commands::add_plugin(&store(), group, &url),
        Commands::Rm { group, repository } => {
            commands::remove_plugin(&store(), group, &repository)
        },
        Commands::List => commands::list_manifest(&store()),
        Commands::Version => {
            println!("packsmith {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        },
    }
}
