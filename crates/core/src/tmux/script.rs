//! Mapping construction steps onto tmux commands.
//!
//! Each step becomes exactly one tmux invocation. Panes are addressed as
//! `session:window.pane` by index, so the mapper tracks pane numbering the
//! way tmux does: splitting a pane inserts the new pane right after it and
//! shifts every later index up by one.

use indexmap::IndexMap;

use crate::{
    error::{ScribeError, ScribeResult},
    model::Indexing,
    step::ConstructionStep,
};

/// Keystroke tmux sends to submit a line
const ENTER: &str = "C-m";

/// Largest percentage `split-window -p` honours; 100 leaves the parent no rows
const MAX_SPLIT_PERCENT: u8 = 99;

/// One tmux invocation, without the binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxCommand {
    pub args: Vec<String>,
    /// Needs the caller's terminal (attach)
    pub interactive: bool,
}

impl TmuxCommand {
    fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            interactive: false,
        }
    }

    /// Type `text` literally into `target`, then press Enter.
    ///
    /// `-l` keeps words such as `Enter` or `Space` in the text from being
    /// read as key names. The `;` argument chains the second send-keys into
    /// the same tmux invocation.
    pub fn send_line(target: &str, text: &str) -> Self {
        Self::new([
            "send-keys", "-t", target, "-l", text, ";", "send-keys", "-t", target, ENTER,
        ])
    }

    /// Render as a shell command line invoking `binary`
    pub fn to_shell(&self, binary: &str) -> String {
        shell_words::join(std::iter::once(binary).chain(self.args.iter().map(String::as_str)))
    }
}

/// Window state needed to address its panes
#[derive(Debug, Clone)]
struct WindowSlot {
    index: u32,
    /// Directory new panes of this window start in
    directory: Option<String>,
    /// Pane ids in tmux index order
    panes: Vec<String>,
}

/// Stateful translation of a step sequence into tmux commands
#[derive(Debug, Clone)]
pub struct CommandMapper {
    indexing: Indexing,
    session: Option<String>,
    directory: Option<String>,
    windows: IndexMap<String, WindowSlot>,
}

impl CommandMapper {
    pub fn new(indexing: Indexing) -> Self {
        Self {
            indexing,
            session: None,
            directory: None,
            windows: IndexMap::new(),
        }
    }

    fn session(&self) -> ScribeResult<&str> {
        self.session
            .as_deref()
            .ok_or_else(|| ScribeError::UnknownWindow("(no session created yet)".to_string()))
    }

    fn slot(&self, window: &str) -> ScribeResult<&WindowSlot> {
        self.windows
            .get(window)
            .ok_or_else(|| ScribeError::UnknownWindow(window.to_string()))
    }

    fn position(&self, window: &str, pane: &str) -> ScribeResult<usize> {
        self.slot(window)?
            .panes
            .iter()
            .position(|p| p == pane)
            .ok_or_else(|| ScribeError::UnknownParent {
                window: window.to_string(),
                pane: pane.to_string(),
            })
    }

    /// tmux target of a pane as currently numbered
    pub fn target(&self, window: &str, pane: &str) -> ScribeResult<String> {
        let session = self.session()?;
        let slot = self.slot(window)?;
        let position = self.position(window, pane)?;
        Ok(format!(
            "{}:{}.{}",
            session,
            slot.index,
            self.indexing.pane_base as usize + position
        ))
    }

    /// Translate the next step; steps must arrive in recorded order
    pub fn map(&mut self, step: &ConstructionStep) -> ScribeResult<TmuxCommand> {
        match step {
            ConstructionStep::CreateSession {
                session, directory, ..
            } => {
                self.session = Some(session.clone());
                self.directory = directory.clone();
                self.windows.clear();

                let mut args = vec!["new-session", "-d", "-s", session.as_str()];
                if let Some(dir) = directory {
                    args.push("-c");
                    args.push(dir);
                }
                Ok(TmuxCommand::new(args))
            }

            ConstructionStep::CreateWindow {
                window,
                root_pane,
                name,
                directory,
            } => {
                let session = self.session()?.to_string();
                if self.windows.contains_key(window) {
                    return Err(ScribeError::DuplicateId {
                        kind: "window",
                        id: window.clone(),
                    });
                }
                let index = self.indexing.window_base + self.windows.len() as u32;
                let first = self.windows.is_empty();
                let start_dir = directory.clone().or_else(|| self.directory.clone());

                let command = if first {
                    // new-session already created the first window
                    TmuxCommand::new([
                        "rename-window".to_string(),
                        "-t".to_string(),
                        format!("{}:{}", session, index),
                        name.clone(),
                    ])
                } else {
                    let mut args = vec![
                        "new-window".to_string(),
                        "-d".to_string(),
                        "-t".to_string(),
                        format!("{}:{}", session, index),
                        "-n".to_string(),
                        name.clone(),
                    ];
                    if let Some(dir) = &start_dir {
                        args.push("-c".to_string());
                        args.push(dir.clone());
                    }
                    TmuxCommand::new(args)
                };

                self.windows.insert(
                    window.clone(),
                    WindowSlot {
                        index,
                        directory: start_dir,
                        panes: vec![root_pane.clone()],
                    },
                );
                Ok(command)
            }

            ConstructionStep::SplitPane {
                window,
                parent,
                pane,
                orientation,
                size,
            } => {
                let target = self.target(window, parent)?;
                let position = self.position(window, parent)?;
                let slot = self
                    .windows
                    .get_mut(window)
                    .ok_or_else(|| ScribeError::UnknownWindow(window.clone()))?;
                if slot.panes.contains(pane) {
                    return Err(ScribeError::DuplicateId {
                        kind: "pane",
                        id: pane.clone(),
                    });
                }

                let mut args = vec![
                    "split-window".to_string(),
                    "-t".to_string(),
                    target,
                    orientation.tmux_flag().to_string(),
                    "-p".to_string(),
                    (*size).min(MAX_SPLIT_PERCENT).to_string(),
                ];
                if let Some(dir) = &slot.directory {
                    args.push("-c".to_string());
                    args.push(dir.clone());
                }

                slot.panes.insert(position + 1, pane.clone());
                Ok(TmuxCommand::new(args))
            }

            ConstructionStep::SetDirectory {
                window,
                pane,
                directory,
            } => {
                let target = self.target(window, pane)?;
                let cd = format!("cd {}", shell_words::quote(directory));
                Ok(TmuxCommand::send_line(&target, &cd))
            }

            ConstructionStep::RunCommand {
                window,
                pane,
                command,
            } => {
                let target = self.target(window, pane)?;
                Ok(TmuxCommand::send_line(&target, command))
            }

            ConstructionStep::AttachSession { session } => {
                let mut command = TmuxCommand::new(["attach-session", "-t", session.as_str()]);
                command.interactive = true;
                Ok(command)
            }
        }
    }
}

/// Render steps as a shell script, one tmux command line per step
pub fn render_script(
    steps: &[ConstructionStep],
    indexing: Indexing,
    binary: &str,
) -> ScribeResult<String> {
    let mut mapper = CommandMapper::new(indexing);
    let mut script = String::new();
    for step in steps {
        script.push_str(&mapper.map(step)?.to_shell(binary));
        script.push('\n');
    }
    Ok(script)
}
