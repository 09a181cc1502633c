//! Construction steps: the ordered output artifact of analysis and building.
//!
//! A step sequence replayed in order against an empty tmux server recreates
//! the recorded session. Later steps address panes created by earlier ones,
//! so the order is never rearranged.

use serde::{Deserialize, Serialize};

use crate::model::{Orientation, Session};

/// One atomic instruction that builds up session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ConstructionStep {
    CreateSession {
        session: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        directory: Option<String>,
        detach: bool,
    },
    CreateWindow {
        window: String,
        root_pane: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        directory: Option<String>,
    },
    SplitPane {
        window: String,
        parent: String,
        pane: String,
        orientation: Orientation,
        size: u8,
    },
    SetDirectory {
        window: String,
        pane: String,
        directory: String,
    },
    RunCommand {
        window: String,
        pane: String,
        command: String,
    },
    AttachSession {
        session: String,
    },
}

impl ConstructionStep {
    /// Short label used in logs and error reports
    pub fn kind(&self) -> &'static str {
        match self {
            ConstructionStep::CreateSession { .. } => "create-session",
            ConstructionStep::CreateWindow { .. } => "create-window",
            ConstructionStep::SplitPane { .. } => "split-pane",
            ConstructionStep::SetDirectory { .. } => "set-directory",
            ConstructionStep::RunCommand { .. } => "run-command",
            ConstructionStep::AttachSession { .. } => "attach-session",
        }
    }
}

impl Session {
    /// Plan the step sequence that recreates this session.
    ///
    /// Per window: the window itself, then every split in creation order
    /// (each followed by a directory change when needed), then the commands.
    /// The first window comes from `new-session`, so its root pane starts in
    /// the session directory rather than the window directory.
    pub fn steps(&self) -> Vec<ConstructionStep> {
        let mut steps = vec![ConstructionStep::CreateSession {
            session: self.name.clone(),
            directory: self.directory.clone(),
            detach: self.detach,
        }];

        for (position, window) in self.windows.values().enumerate() {
            let Some(root) = window.root() else {
                continue;
            };

            steps.push(ConstructionStep::CreateWindow {
                window: window.id.clone(),
                root_pane: root.id.clone(),
                name: window.name.clone(),
                directory: window.directory.clone(),
            });

            let window_dir = self.window_directory(window);

            for pane in window.panes.values() {
                let starts_in = match (&pane.parent, &pane.orientation) {
                    (Some(parent), Some(orientation)) => {
                        steps.push(ConstructionStep::SplitPane {
                            window: window.id.clone(),
                            parent: parent.clone(),
                            pane: pane.id.clone(),
                            orientation: *orientation,
                            size: pane.size,
                        });
                        window_dir
                    }
                    _ if position == 0 => self.directory.as_deref(),
                    _ => window_dir,
                };

                if let Some(dir) = self.effective_directory(window, pane)
                    && Some(dir) != starts_in
                {
                    steps.push(ConstructionStep::SetDirectory {
                        window: window.id.clone(),
                        pane: pane.id.clone(),
                        directory: dir.to_string(),
                    });
                }
            }

            for pane in window.panes.values() {
                if let Some(command) = &pane.command {
                    steps.push(ConstructionStep::RunCommand {
                        window: window.id.clone(),
                        pane: pane.id.clone(),
                        command: command.clone(),
                    });
                }
            }
        }

        if !self.detach {
            steps.push(ConstructionStep::AttachSession {
                session: self.name.clone(),
            });
        }

        steps
    }
}
