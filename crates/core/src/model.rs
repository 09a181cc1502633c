//! Session model shared by the analyzer and the builder.
//!
//! A [`Session`] owns its windows and each [`Window`] owns its panes, both in
//! creation order. The first pane of a window is the root of its split tree;
//! every other pane records the pane it was split from, the orientation of
//! that split, and its share of the parent's space as a percentage.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Orientation
// =============================================================================

/// Direction of a split relative to the parent pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Side by side; the new pane opens to the right and its size is a width
    Vertical,
    /// Stacked; the new pane opens below and its size is a height
    Horizontal,
}

impl Orientation {
    /// The dimension a size applies to for this orientation
    pub fn dimension(self) -> &'static str {
        match self {
            Orientation::Vertical => "width",
            Orientation::Horizontal => "height",
        }
    }

    /// The tmux `split-window` flag producing this orientation
    pub fn tmux_flag(self) -> &'static str {
        match self {
            Orientation::Vertical => "-h",
            Orientation::Horizontal => "-v",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Vertical => write!(f, "vertical"),
            Orientation::Horizontal => write!(f, "horizontal"),
        }
    }
}

// =============================================================================
// Pane / Window / Session
// =============================================================================

/// Size of a pane that was split with no explicit size
pub const DEFAULT_SPLIT_SIZE: u8 = 50;

/// A rectangular terminal region within a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pane {
    pub id: String,
    /// Pane this one was split from (`None` for the window root)
    pub parent: Option<String>,
    /// Split orientation relative to the parent (`None` for the window root)
    pub orientation: Option<Orientation>,
    /// Percentage of the parent's space along the split axis
    pub size: u8,
    /// Working directory override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Command to run once the pane exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Pane {
    /// Create the root pane of a window
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            orientation: None,
            size: 100,
            directory: None,
            command: None,
        }
    }

    /// Create a pane split from `parent`
    pub fn split(id: impl Into<String>, parent: impl Into<String>, orientation: Orientation) -> Self {
        Self {
            id: id.into(),
            parent: Some(parent.into()),
            orientation: Some(orientation),
            size: DEFAULT_SPLIT_SIZE,
            directory: None,
            command: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A tab-like container of panes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Panes in creation order; the first one is the root
    pub panes: IndexMap<String, Pane>,
}

impl Window {
    pub fn new(id: impl Into<String>, name: impl Into<String>, directory: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            directory,
            panes: IndexMap::new(),
        }
    }

    /// The root pane of the split tree
    pub fn root(&self) -> Option<&Pane> {
        self.panes.values().next()
    }

    pub fn pane(&self, id: &str) -> Option<&Pane> {
        self.panes.get(id)
    }

    /// Panes directly split from `parent`, in creation order
    pub fn children<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a Pane> + 'a {
        self.panes
            .values()
            .filter(move |p| p.parent.as_deref() == Some(parent))
    }
}

/// Window and pane numbering of the tmux server a session lives on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indexing {
    /// tmux `base-index`
    pub window_base: u32,
    /// tmux `pane-base-index`
    pub pane_base: u32,
}

/// One named tmux session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    /// Start directory (`new-session -c`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Leave the session detached after creation
    pub detach: bool,
    #[serde(default)]
    pub indexing: Indexing,
    /// Windows in creation order
    pub windows: IndexMap<String, Window>,
}

impl Session {
    pub fn new(name: impl Into<String>, directory: Option<String>, detach: bool) -> Self {
        Self {
            name: name.into(),
            directory,
            detach,
            indexing: Indexing::default(),
            windows: IndexMap::new(),
        }
    }

    /// Directory a pane will actually work in
    pub fn effective_directory<'a>(&'a self, window: &'a Window, pane: &'a Pane) -> Option<&'a str> {
        pane.directory
            .as_deref()
            .or(window.directory.as_deref())
            .or(self.directory.as_deref())
    }

    /// Directory tmux uses for new panes of `window`
    pub fn window_directory<'a>(&'a self, window: &'a Window) -> Option<&'a str> {
        window.directory.as_deref().or(self.directory.as_deref())
    }

    /// Find the window holding a pane id
    pub fn window_of(&self, pane: &str) -> Option<&Window> {
        self.windows.values().find(|w| w.panes.contains_key(pane))
    }

    pub fn pane_count(&self) -> usize {
        self.windows.values().map(|w| w.panes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        let mut session = Session::new("demo", Some("/srv".to_string()), true);
        let mut window = Window::new("w0", "main", Some("/srv/app".to_string()));
        window.panes.insert("p0".to_string(), Pane::root("p0"));
        let mut logs = Pane::split("p1", "p0", Orientation::Horizontal);
        logs.directory = Some("/var/log".to_string());
        window.panes.insert("p1".to_string(), logs);
        window
            .panes
            .insert("p2".to_string(), Pane::split("p2", "p0", Orientation::Vertical));
        session.windows.insert("w0".to_string(), window);
        session
    }

    #[test]
    fn test_effective_directory_falls_back() {
        let session = sample();
        let window = &session.windows["w0"];
        assert_eq!(
            session.effective_directory(window, &window.panes["p0"]),
            Some("/srv/app")
        );
        assert_eq!(
            session.effective_directory(window, &window.panes["p1"]),
            Some("/var/log")
        );

        let bare = Window::new("w1", "other", None);
        assert_eq!(session.window_directory(&bare), Some("/srv"));
    }

    #[test]
    fn test_children_in_creation_order() {
        let session = sample();
        let window = &session.windows["w0"];
        let children: Vec<&str> = window.children("p0").map(|p| p.id.as_str()).collect();
        assert_eq!(children, vec!["p1", "p2"]);
        assert_eq!(window.root().map(|p| p.id.as_str()), Some("p0"));
        assert!(window.children("p1").next().is_none());
    }

    #[test]
    fn test_orientation_flags() {
        assert_eq!(Orientation::Vertical.tmux_flag(), "-h");
        assert_eq!(Orientation::Horizontal.tmux_flag(), "-v");
        assert_eq!(Orientation::Vertical.dimension(), "width");
        assert_eq!(Orientation::Horizontal.to_string(), "horizontal");
    }

    #[test]
    fn test_window_of() {
        let session = sample();
        assert_eq!(session.window_of("p2").map(|w| w.id.as_str()), Some("w0"));
        assert!(session.window_of("p9").is_none());
        assert_eq!(session.pane_count(), 3);
    }
}
