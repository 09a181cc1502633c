//! Session commands for scribe.
//!
//! - Recording a session as a script
//! - Cloning a session under a new name
//! - Closing every pane of a session

use std::path::Path;

use anyhow::{Result, bail};
use colored::Colorize;
use scribe_core::{
    Analyzer, SessionSource,
    closer::close_plan,
    tmux::{Tmux, TmuxExecutor, render_script, replay},
};

use crate::{cli::Format, display_path};

// =============================================================================
// Recording
// =============================================================================

/// Print the script (or JSON analysis) that recreates `session`
pub fn record_session(tmux: &Tmux, session: &str, format: Format, detach: bool) -> Result<()> {
    let analysis = Analyzer::new(tmux).detach(detach).analyze(session)?;

    match format {
        Format::Text => {
            let script = render_script(&analysis.steps, analysis.session.indexing, tmux.binary())?;
            print!("{}", script);
        }
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
    }

    Ok(())
}

// =============================================================================
// Cloning
// =============================================================================

/// Analyze `session` and build a copy of it named `new_name`
pub fn clone_session(tmux: &Tmux, session: &str, new_name: &str, attach: bool) -> Result<()> {
    if tmux.has_session(new_name)? {
        bail!("session '{}' already exists", new_name);
    }

    let analysis = Analyzer::new(tmux)
        .rename(new_name)
        .detach(!attach)
        .analyze(session)?;

    let location = analysis
        .session
        .directory
        .as_deref()
        .map(|d| display_path(Path::new(d)))
        .unwrap_or_else(|| "-".to_string());
    eprintln!(
        "{} Cloning '{}' into '{}' ({} windows, {} panes) in {}",
        "→".blue(),
        session,
        new_name.blue(),
        analysis.session.windows.len(),
        analysis.session.pane_count(),
        location.dimmed()
    );

    let mut executor = TmuxExecutor::new(tmux, analysis.session.indexing);
    if let Err(err) = replay(&analysis.steps, &mut executor) {
        if let Some(index) = err.step_index() {
            bail!(
                "{}\n  '{}' was left partially built after {} applied steps",
                err,
                new_name,
                index
            );
        }
        return Err(err.into());
    }

    if !attach {
        eprintln!("{} Created session '{}'", "✔".green(), new_name.blue());
    }
    Ok(())
}

// =============================================================================
// Closing
// =============================================================================

/// Send every pane of `session` the keys that make it exit
pub fn close_session(tmux: &Tmux, session: &str, dry_run: bool) -> Result<()> {
    let plan = close_plan(tmux, session)?;

    if dry_run {
        for command in &plan {
            println!("{}", command.to_shell(tmux.binary()));
        }
        return Ok(());
    }

    for command in &plan {
        tmux.run(&command.args)?;
    }
    eprintln!(
        "{} Sent {} close commands to '{}'",
        "✔".green(),
        plan.len(),
        session.blue()
    );
    Ok(())
}
