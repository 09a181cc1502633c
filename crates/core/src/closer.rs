//! Gracefully closing every pane of a session.
//!
//! Killing a session outright loses unsaved editor buffers without a prompt.
//! Instead each pane gets the keystrokes that make its program quit on its
//! own; panes running something unknown are left alone.

use tracing::warn;

use crate::{
    analyzer::SessionSource,
    error::{ScribeError, ScribeResult},
    tmux::TmuxCommand,
};

const EDITORS: &[&str] = &["vi", "vim", "nvim"];
const SHELLS: &[&str] = &["sh", "bash", "zsh", "fish"];

/// Program name of a command line, without its path or arguments
fn program(command: &str) -> &str {
    let first = command.split_whitespace().next().unwrap_or_default();
    let name = first.rsplit('/').next().unwrap_or(first);
    // login shells show up as "-bash"
    name.trim_start_matches('-')
}

/// Lines to type into a pane so that whatever runs in it exits
pub fn close_keys(command: Option<&str>) -> Vec<&'static str> {
    let Some(command) = command else {
        return vec!["exit"];
    };
    let name = program(command);
    if EDITORS.contains(&name) {
        vec![":q!", "exit"]
    } else if SHELLS.contains(&name) {
        vec!["exit"]
    } else {
        warn!("don't know how to close '{}'; leaving it running", command);
        Vec::new()
    }
}

/// `send-keys` commands that close every pane of `session`
pub fn close_plan<S: SessionSource + ?Sized>(
    source: &S,
    session: &str,
) -> ScribeResult<Vec<TmuxCommand>> {
    if !source.has_session(session)? {
        return Err(ScribeError::SessionNotFound {
            session: session.to_string(),
            detail: None,
        });
    }

    let mut plan = Vec::new();
    for window in source.list_windows(session)? {
        for pane in source.list_panes(session, &window)? {
            for keys in close_keys(pane.command.as_deref()) {
                plan.push(TmuxCommand::send_line(&pane.id, keys));
            }
        }
    }
    Ok(plan)
}
