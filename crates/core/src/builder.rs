//! Fluent construction of session layouts.
//!
//! ```ignore
//! use scribe_core::{Orientation, SessionBuilder};
//!
//! let mut builder = SessionBuilder::new("demo", Some("/srv/app"), true);
//! builder
//!     .add_window("main", "editor", "main", None)?
//!     .add_pane("logs", Orientation::Horizontal, None, Some("/var/log"))?
//!     .set_pane_height(25)?
//!     .run_command("tail -f syslog")?;
//! print!("{}", builder.build()?);
//! ```
//!
//! The builder holds one in-progress [`Session`] and a cursor on the most
//! recently added pane. Every call validates its input and fails without
//! touching the session when the contract is broken.

use tracing::debug;

use crate::{
    error::{ScribeError, ScribeResult},
    model::{Indexing, Orientation, Pane, Session, Window},
    step::ConstructionStep,
    tmux::{StepExecutor, render_script, replay},
};

/// Accumulates windows, panes and commands for one session
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    session: Session,
    /// Index of the current window in `session.windows`
    current_window: Option<usize>,
    /// Id of the most recently added pane in the current window
    current_pane: Option<String>,
}

impl SessionBuilder {
    /// Start a session named `name`, based in `directory`
    pub fn new(name: impl Into<String>, directory: Option<&str>, detach: bool) -> Self {
        Self {
            session: Session::new(name, directory.map(String::from), detach),
            current_window: None,
            current_pane: None,
        }
    }

    /// Address windows and panes with a non-default tmux numbering
    pub fn indexing(&mut self, indexing: Indexing) -> &mut Self {
        self.session.indexing = indexing;
        self
    }

    /// The session built so far
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    fn pane_exists(&self, id: &str) -> bool {
        self.session.window_of(id).is_some()
    }

    fn current_window_mut(&mut self) -> ScribeResult<&mut Window> {
        let index = self.current_window.ok_or(ScribeError::NoWindow)?;
        self.session
            .windows
            .get_index_mut(index)
            .map(|(_, window)| window)
            .ok_or(ScribeError::NoWindow)
    }

    fn current_pane_mut(&mut self) -> ScribeResult<&mut Pane> {
        let id = self.current_pane.clone().ok_or(ScribeError::NoWindow)?;
        let window = self.current_window_mut()?;
        let window_id = window.id.clone();
        window
            .panes
            .get_mut(&id)
            .ok_or(ScribeError::UnknownParent {
                window: window_id,
                pane: id,
            })
    }

    /// Add a window whose root pane is `first_pane_id`.
    ///
    /// The new window becomes current and its root pane becomes the cursor.
    pub fn add_window(
        &mut self,
        id: &str,
        first_pane_id: &str,
        name: &str,
        working_directory: Option<&str>,
    ) -> ScribeResult<&mut Self> {
        if self.session.windows.contains_key(id) {
            return Err(ScribeError::DuplicateId {
                kind: "window",
                id: id.to_string(),
            });
        }
        if self.pane_exists(first_pane_id) {
            return Err(ScribeError::DuplicateId {
                kind: "pane",
                id: first_pane_id.to_string(),
            });
        }

        let mut window = Window::new(id, name, working_directory.map(String::from));
        window
            .panes
            .insert(first_pane_id.to_string(), Pane::root(first_pane_id));
        let (index, _) = self.session.windows.insert_full(id.to_string(), window);

        debug!(window = id, pane = first_pane_id, "added window");
        self.current_window = Some(index);
        self.current_pane = Some(first_pane_id.to_string());
        Ok(self)
    }

    /// Split a pane of the current window.
    ///
    /// Without `parent_pane_id` the most recently added pane is split. The new
    /// pane starts at 50% of its parent and becomes the cursor.
    pub fn add_pane(
        &mut self,
        id: &str,
        orientation: Orientation,
        parent_pane_id: Option<&str>,
        working_directory: Option<&str>,
    ) -> ScribeResult<&mut Self> {
        if self.pane_exists(id) {
            return Err(ScribeError::DuplicateId {
                kind: "pane",
                id: id.to_string(),
            });
        }

        let cursor = self.current_pane.clone();
        let window = self.current_window_mut()?;
        let parent = match parent_pane_id {
            Some(parent) => parent.to_string(),
            None => cursor.ok_or(ScribeError::NoWindow)?,
        };
        if !window.panes.contains_key(&parent) {
            return Err(ScribeError::UnknownParent {
                window: window.id.clone(),
                pane: parent,
            });
        }

        let mut pane = Pane::split(id, parent.as_str(), orientation);
        pane.directory = working_directory.map(String::from);
        window.panes.insert(id.to_string(), pane);

        debug!(pane = id, %parent, %orientation, "added pane");
        self.current_pane = Some(id.to_string());
        Ok(self)
    }

    /// Set the height of the current pane, in percent of its parent.
    /// Only horizontal splits have a height.
    pub fn set_pane_height(&mut self, percent: i64) -> ScribeResult<&mut Self> {
        self.set_pane_size(Orientation::Horizontal, percent)
    }

    /// Set the width of the current pane, in percent of its parent.
    /// Only vertical splits have a width.
    pub fn set_pane_width(&mut self, percent: i64) -> ScribeResult<&mut Self> {
        self.set_pane_size(Orientation::Vertical, percent)
    }

    fn set_pane_size(&mut self, axis: Orientation, percent: i64) -> ScribeResult<&mut Self> {
        let size = u8::try_from(percent)
            .ok()
            .filter(|size| (1..=100).contains(size))
            .ok_or(ScribeError::InvalidSize(percent))?;

        let pane = self.current_pane_mut()?;
        let orientation = pane.orientation;
        match orientation {
            Some(split) if split == axis => {
                pane.size = size;
                Ok(self)
            }
            Some(_) => Err(ScribeError::OrientationMismatch {
                pane: pane.id.clone(),
                dimension: axis.dimension(),
                reason: match axis {
                    Orientation::Vertical => "width only applies to vertical splits",
                    Orientation::Horizontal => "height only applies to horizontal splits",
                },
            }),
            None => Err(ScribeError::OrientationMismatch {
                pane: pane.id.clone(),
                dimension: axis.dimension(),
                reason: "the window root pane is not a split",
            }),
        }
    }

    /// Run `command_text` in the current pane once it exists.
    /// A pane runs at most one command.
    pub fn run_command(&mut self, command_text: &str) -> ScribeResult<&mut Self> {
        let pane = self.current_pane_mut()?;
        if pane.command.is_some() {
            return Err(ScribeError::CommandAlreadySet(pane.id.clone()));
        }
        pane.command = Some(command_text.to_string());
        Ok(self)
    }

    /// The step sequence for the session as built so far
    pub fn steps(&self) -> ScribeResult<Vec<ConstructionStep>> {
        if self.session.windows.is_empty() {
            return Err(ScribeError::EmptySession(self.session.name.clone()));
        }
        Ok(self.session.steps())
    }

    /// Render the steps as a shell script, one tmux command per line
    pub fn build(&self) -> ScribeResult<String> {
        let steps = self.steps()?;
        render_script(&steps, self.session.indexing, "tmux")
    }

    /// Apply every step in order, stopping at the first failure.
    ///
    /// Already created windows and panes are left in place on failure.
    pub fn run(&self, executor: &mut dyn StepExecutor) -> ScribeResult<()> {
        let steps = self.steps()?;
        replay(&steps, executor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t_split() -> SessionBuilder {
        let mut builder = SessionBuilder::new("demo", Some("/home/user"), true);
        builder
            .add_window("window_id", "zero_pane_id", "editor", None)
            .unwrap()
            .add_pane("one_pane_id", Orientation::Vertical, None, None)
            .unwrap()
            .set_pane_width(75)
            .unwrap()
            .run_command("vi README.md")
            .unwrap()
            .add_pane(
                "two_pane_id",
                Orientation::Horizontal,
                Some("zero_pane_id"),
                None,
            )
            .unwrap()
            .set_pane_height(25)
            .unwrap()
            .run_command("tail -f /var/log/dmesg")
            .unwrap();
        builder
    }

    #[test]
    fn test_t_split_steps() {
        let steps = t_split().steps().unwrap();
        let window = || "window_id".to_string();
        assert_eq!(
            steps,
            vec![
                ConstructionStep::CreateSession {
                    session: "demo".to_string(),
                    directory: Some("/home/user".to_string()),
                    detach: true,
                },
                ConstructionStep::CreateWindow {
                    window: window(),
                    root_pane: "zero_pane_id".to_string(),
                    name: "editor".to_string(),
                    directory: None,
                },
                ConstructionStep::SplitPane {
                    window: window(),
                    parent: "zero_pane_id".to_string(),
                    pane: "one_pane_id".to_string(),
                    orientation: Orientation::Vertical,
                    size: 75,
                },
                ConstructionStep::SplitPane {
                    window: window(),
                    parent: "zero_pane_id".to_string(),
                    pane: "two_pane_id".to_string(),
                    orientation: Orientation::Horizontal,
                    size: 25,
                },
                ConstructionStep::RunCommand {
                    window: window(),
                    pane: "one_pane_id".to_string(),
                    command: "vi README.md".to_string(),
                },
                ConstructionStep::RunCommand {
                    window: window(),
                    pane: "two_pane_id".to_string(),
                    command: "tail -f /var/log/dmesg".to_string(),
                },
            ]
        );

        let session = t_split().into_session();
        let window = &session.windows["window_id"];
        assert_eq!(window.panes["one_pane_id"].size, 75);
        assert_eq!(window.panes["two_pane_id"].size, 25);
    }

    #[test]
    fn test_build_is_idempotent() {
        let builder = t_split();
        assert_eq!(builder.build().unwrap(), builder.build().unwrap());
        assert_eq!(builder.steps().unwrap(), builder.steps().unwrap());
    }

    #[test]
    fn test_invalid_sizes() {
        let mut builder = SessionBuilder::new("s", None, true);
        builder
            .add_window("w", "root", "w", None)
            .unwrap()
            .add_pane("p", Orientation::Horizontal, None, None)
            .unwrap();

        for percent in [0, 101, -5] {
            assert!(matches!(
                builder.set_pane_height(percent),
                Err(ScribeError::InvalidSize(p)) if p == percent
            ));
        }
        assert!(builder.set_pane_height(100).is_ok());
        assert!(builder.set_pane_height(1).is_ok());
    }

    #[test]
    fn test_orientation_mismatch() {
        let mut builder = SessionBuilder::new("s", None, true);
        builder
            .add_window("w", "root", "w", None)
            .unwrap()
            .add_pane("side", Orientation::Vertical, None, None)
            .unwrap();

        assert!(matches!(
            builder.set_pane_height(50),
            Err(ScribeError::OrientationMismatch { dimension: "height", .. })
        ));
        assert!(builder.set_pane_width(50).is_ok());
    }

    #[test]
    fn test_root_pane_has_no_size() {
        let mut builder = SessionBuilder::new("s", None, true);
        builder.add_window("w", "root", "w", None).unwrap();
        assert!(matches!(
            builder.set_pane_width(40),
            Err(ScribeError::OrientationMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_window_leaves_first_untouched() {
        let mut builder = SessionBuilder::new("s", None, true);
        builder
            .add_window("w", "a", "first", Some("/tmp"))
            .unwrap()
            .run_command("top")
            .unwrap();
        let before = builder.session().windows["w"].clone();

        assert!(matches!(
            builder.add_window("w", "b", "second", None),
            Err(ScribeError::DuplicateId { kind: "window", .. })
        ));
        assert_eq!(builder.session().windows["w"], before);
        assert_eq!(builder.session().windows.len(), 1);
    }

    #[test]
    fn test_duplicate_pane_ids() {
        let mut builder = SessionBuilder::new("s", None, true);
        builder.add_window("w1", "a", "one", None).unwrap();
        assert!(matches!(
            builder.add_window("w2", "a", "two", None),
            Err(ScribeError::DuplicateId { kind: "pane", .. })
        ));
        assert!(matches!(
            builder.add_pane("a", Orientation::Vertical, None, None),
            Err(ScribeError::DuplicateId { kind: "pane", .. })
        ));
    }

    #[test]
    fn test_unknown_parent() {
        let mut builder = SessionBuilder::new("s", None, true);
        builder.add_window("w1", "a", "one", None).unwrap();
        builder.add_window("w2", "b", "two", None).unwrap();

        // "a" lives in w1, not the current window
        assert!(matches!(
            builder.add_pane("c", Orientation::Vertical, Some("a"), None),
            Err(ScribeError::UnknownParent { .. })
        ));
        assert!(matches!(
            builder.add_pane("c", Orientation::Vertical, Some("nope"), None),
            Err(ScribeError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_default_parent_is_last_pane() {
        let mut builder = SessionBuilder::new("s", None, true);
        builder
            .add_window("w", "a", "w", None)
            .unwrap()
            .add_pane("b", Orientation::Vertical, None, None)
            .unwrap()
            .add_pane("c", Orientation::Horizontal, None, None)
            .unwrap();

        let window = &builder.session().windows["w"];
        assert_eq!(window.panes["c"].parent.as_deref(), Some("b"));
        assert_eq!(window.panes["c"].size, 50);
    }

    #[test]
    fn test_command_already_set() {
        let mut builder = SessionBuilder::new("s", None, true);
        builder
            .add_window("w", "a", "w", None)
            .unwrap()
            .run_command("top")
            .unwrap();
        assert!(matches!(
            builder.run_command("htop"),
            Err(ScribeError::CommandAlreadySet(pane)) if pane == "a"
        ));
    }

    #[test]
    fn test_pane_before_window() {
        let mut builder = SessionBuilder::new("s", None, true);
        assert!(matches!(
            builder.add_pane("a", Orientation::Vertical, None, None),
            Err(ScribeError::NoWindow)
        ));
        assert!(matches!(builder.run_command("top"), Err(ScribeError::NoWindow)));
        assert!(matches!(builder.build(), Err(ScribeError::EmptySession(_))));
    }
}
