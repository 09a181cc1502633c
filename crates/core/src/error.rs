//! Error types shared by the analyzer, the builder and the tmux client.

use thiserror::Error;

/// Result alias used throughout scribe-core
pub type ScribeResult<T> = Result<T, ScribeError>;

/// Every failure scribe-core can report.
///
/// Validation errors (`DuplicateId`, `UnknownParent`, `InvalidSize`,
/// `OrientationMismatch`, `CommandAlreadySet`) are raised by the call that
/// breaks the builder contract. External failures surface as `ExternalTool`,
/// wrapped in `StepFailed` when they happen while replaying steps.
#[derive(Error, Debug)]
pub enum ScribeError {
    /// The session does not exist or has no panes to analyze
    #[error("session '{session}' not found{}", detail_suffix(.detail))]
    SessionNotFound {
        session: String,
        detail: Option<String>,
    },

    /// Pane geometry could not be reduced to a split tree
    #[error("cannot infer layout of window '{window}': {reason}")]
    LayoutInference { window: String, reason: String },

    /// The tmux binary (or a helper process) is missing, failed, or timed out
    #[error("{command}: {message}")]
    ExternalTool { command: String, message: String },

    /// A window or pane id was registered twice
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    /// A split names a parent pane that is not in the current window
    #[error("unknown parent pane '{pane}' in window '{window}'")]
    UnknownParent { window: String, pane: String },

    /// A step references a window that was never created
    #[error("unknown window '{0}'")]
    UnknownWindow(String),

    /// Size percentages must lie in 1..=100
    #[error("invalid pane size {0}%: must be between 1 and 100")]
    InvalidSize(i64),

    /// Width applies to vertical splits only, height to horizontal ones
    #[error("cannot set {dimension} of pane '{pane}': {reason}")]
    OrientationMismatch {
        pane: String,
        dimension: &'static str,
        reason: &'static str,
    },

    /// A pane already has its command
    #[error("pane '{0}' already has a command")]
    CommandAlreadySet(String),

    /// A pane operation was issued before any window was added
    #[error("no window has been added yet")]
    NoWindow,

    /// Building a session that has no windows
    #[error("session '{0}' has no windows")]
    EmptySession(String),

    /// Replaying a step failed; earlier steps have already been applied
    #[error("step {index} failed: {source}")]
    StepFailed {
        index: usize,
        #[source]
        source: Box<ScribeError>,
    },

    /// Configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

impl ScribeError {
    pub(crate) fn external(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            command: command.into(),
            message: message.into(),
        }
    }

    pub(crate) fn layout(window: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LayoutInference {
            window: window.into(),
            reason: reason.into(),
        }
    }

    /// Attach the index of the step that was being replayed
    pub fn at_step(self, index: usize) -> Self {
        Self::StepFailed {
            index,
            source: Box::new(self),
        }
    }

    /// Index of the failed step, if this error came from a replay
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::StepFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_not_found_message() {
        let err = ScribeError::SessionNotFound {
            session: "work".to_string(),
            detail: None,
        };
        assert_eq!(err.to_string(), "session 'work' not found");

        let err = ScribeError::SessionNotFound {
            session: "work".to_string(),
            detail: Some("window @3 has no panes".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "session 'work' not found (window @3 has no panes)"
        );
    }

    #[test]
    fn test_step_index() {
        let err = ScribeError::external("tmux split-window", "exit status 1").at_step(4);
        assert_eq!(err.step_index(), Some(4));
        assert_eq!(err.to_string(), "step 4 failed: tmux split-window: exit status 1");
        assert_eq!(ScribeError::NoWindow.step_index(), None);
    }
}
