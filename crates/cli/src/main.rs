//! Scribe CLI - record a running tmux session as a reproducible script.
//!
//! # Workflow
//!
//! 1. User runs `scribe <SESSION>` while the session is running
//! 2. The analyzer in `scribe-core` lists windows and panes through tmux and
//!    infers each window's split tree from pane geometry
//! 3. The construction steps are printed as a shell script (or JSON)
//!
//! `scribe clone` replays the steps live under a new name, `scribe inspect`
//! shows the inferred tree and `scribe close` asks every pane to exit.
//!
//! Logs go to stderr so the script on stdout stays clean.

mod cli;
mod commands;

use std::path::Path;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use colored::Colorize;
use scribe_core::{
    ScribeConfig,
    config::{expand_path, load_config, load_default_config},
};
use tracing_subscriber::EnvFilter;

// =============================================================================
// Main Entry Point
// =============================================================================

/// Entry point for the scribe CLI.
///
/// Any failure prints `✘ <message>` to stderr and exits with status 1.
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{} {}", "✘".red(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let tmux = config.tmux();

    match cli.command {
        Some(Commands::Inspect { session, json }) => {
            commands::layout::inspect(&tmux, &session, json)
        }
        Some(Commands::Clone {
            session,
            new_name,
            attach,
        }) => commands::session::clone_session(&tmux, &session, &new_name, attach),
        Some(Commands::Close { session, dry_run }) => {
            commands::session::close_session(&tmux, &session, dry_run)
        }
        None => match cli.session {
            Some(session) => {
                commands::session::record_session(&tmux, &session, cli.format, cli.detach)
            }
            None => {
                Cli::command().print_help()?;
                std::process::exit(2);
            }
        },
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Send tracing output to stderr; `RUST_LOG` applies unless `-v` is given
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file settings with command-line overrides applied
fn resolve_config(cli: &Cli) -> Result<ScribeConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(Path::new(&expand_path(path)))?,
        None => load_default_config()?,
    };
    if let Some(binary) = &cli.tmux {
        config.tmux.binary = binary.clone();
    }
    if let Some(secs) = cli.timeout {
        config.tmux.timeout_secs = Some(secs);
    }
    Ok(config)
}

/// Display a path with ~ for the home directory
fn display_path(path: &Path) -> String {
    dirs::home_dir()
        .and_then(|home| {
            path.strip_prefix(&home)
                .ok()
                .map(|rel| Path::new("~").join(rel).display().to_string())
        })
        .unwrap_or_else(|| path.display().to_string())
}
