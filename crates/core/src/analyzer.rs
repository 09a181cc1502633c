//! Reading a live session back into a model.
//!
//! [`Analyzer`] owns the whole pipeline: it queries a [`SessionSource`] for
//! windows and pane geometry, infers each window's split tree, replays the
//! result through a [`SessionBuilder`] and plans the construction steps.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    builder::SessionBuilder,
    error::{ScribeError, ScribeResult},
    layout::{PaneGeometry, Rect, infer_splits},
    model::{Indexing, Orientation, Session},
    step::ConstructionStep,
};

/// A window as listed by the multiplexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: String,
    pub index: u32,
    pub name: String,
    /// A zoomed window reports the zoomed pane's geometry only
    pub zoomed: bool,
}

/// A pane as listed by the multiplexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneInfo {
    pub id: String,
    pub index: u32,
    pub rect: Rect,
    pub directory: Option<String>,
    /// Command running in the foreground, if any
    pub command: Option<String>,
}

/// Query interface onto a running multiplexer
pub trait SessionSource {
    fn has_session(&self, session: &str) -> ScribeResult<bool>;

    /// Start directory of the session
    fn session_directory(&self, session: &str) -> ScribeResult<Option<String>>;

    /// Window and pane numbering of the server
    fn indexing(&self) -> ScribeResult<Indexing>;

    /// Windows of a session, in index order
    fn list_windows(&self, session: &str) -> ScribeResult<Vec<WindowInfo>>;

    fn list_panes(&self, session: &str, window: &WindowInfo) -> ScribeResult<Vec<PaneInfo>>;
}

/// Result of analyzing one session
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub session: Session,
    pub steps: Vec<ConstructionStep>,
}

/// Turns a live session into a [`Session`] model and its construction steps
pub struct Analyzer<'a, S: SessionSource + ?Sized> {
    source: &'a S,
    rename: Option<String>,
    detach: bool,
}

impl<'a, S: SessionSource + ?Sized> Analyzer<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            rename: None,
            detach: false,
        }
    }

    /// Recreate the session under a different name
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    /// Leave the recreated session detached instead of attaching to it
    pub fn detach(mut self, detach: bool) -> Self {
        self.detach = detach;
        self
    }

    fn not_found(session: &str, detail: impl Into<String>) -> ScribeError {
        ScribeError::SessionNotFound {
            session: session.to_string(),
            detail: Some(detail.into()),
        }
    }

    /// Query `session` and plan the steps that recreate it
    pub fn analyze(&self, session: &str) -> ScribeResult<Analysis> {
        if !self.source.has_session(session)? {
            return Err(ScribeError::SessionNotFound {
                session: session.to_string(),
                detail: None,
            });
        }

        let directory = self.source.session_directory(session)?;
        let windows = self.source.list_windows(session)?;
        if windows.is_empty() {
            return Err(Self::not_found(session, "it has no windows"));
        }

        let name = self.rename.as_deref().unwrap_or(session);
        let mut builder = SessionBuilder::new(name, directory.as_deref(), self.detach);
        builder.indexing(self.source.indexing()?);

        for window in &windows {
            self.add_window(&mut builder, session, window)?;
        }

        let session = builder.into_session();
        let steps = session.steps();
        info!(
            session = %session.name,
            windows = session.windows.len(),
            panes = session.pane_count(),
            steps = steps.len(),
            "analyzed session"
        );
        Ok(Analysis { session, steps })
    }

    fn add_window(
        &self,
        builder: &mut SessionBuilder,
        session: &str,
        window: &WindowInfo,
    ) -> ScribeResult<()> {
        if window.zoomed {
            return Err(ScribeError::layout(
                &window.id,
                "window is zoomed; unzoom it so pane geometry reflects the splits",
            ));
        }

        let panes = self.source.list_panes(session, window)?;
        if panes.is_empty() {
            return Err(Self::not_found(
                session,
                format!("window {} has no panes", window.id),
            ));
        }
        debug!(window = %window.id, panes = panes.len(), "listed panes");

        let geometry: Vec<PaneGeometry> = panes
            .iter()
            .map(|pane| PaneGeometry {
                id: pane.id.clone(),
                index: pane.index,
                rect: pane.rect,
            })
            .collect();
        let layout = infer_splits(&window.id, &geometry)?;

        let by_id: HashMap<&str, &PaneInfo> = panes.iter().map(|p| (p.id.as_str(), p)).collect();
        let lookup = |id: &str| {
            by_id
                .get(id)
                .copied()
                .ok_or_else(|| ScribeError::layout(&window.id, format!("lost track of pane {}", id)))
        };

        let root = lookup(&layout.root)?;
        let window_dir = root.directory.as_deref();
        builder.add_window(&window.id, &root.id, &window.name, window_dir)?;
        if let Some(command) = &root.command {
            builder.run_command(command)?;
        }

        for split in &layout.splits {
            let pane = lookup(&split.pane)?;
            let directory = pane.directory.as_deref().filter(|dir| Some(*dir) != window_dir);
            builder.add_pane(&split.pane, split.orientation, Some(&split.parent), directory)?;

            let size = i64::from(split.size);
            match split.orientation {
                Orientation::Vertical => builder.set_pane_width(size)?,
                Orientation::Horizontal => builder.set_pane_height(size)?,
            };
            if let Some(command) = &pane.command {
                builder.run_command(command)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned answers for one session
    struct Canned {
        windows: Vec<(WindowInfo, Vec<PaneInfo>)>,
    }

    impl SessionSource for Canned {
        fn has_session(&self, session: &str) -> ScribeResult<bool> {
            Ok(session == "work")
        }

        fn session_directory(&self, _session: &str) -> ScribeResult<Option<String>> {
            Ok(Some("/home/me".to_string()))
        }

        fn indexing(&self) -> ScribeResult<Indexing> {
            Ok(Indexing::default())
        }

        fn list_windows(&self, _session: &str) -> ScribeResult<Vec<WindowInfo>> {
            Ok(self.windows.iter().map(|(w, _)| w.clone()).collect())
        }

        fn list_panes(&self, _session: &str, window: &WindowInfo) -> ScribeResult<Vec<PaneInfo>> {
            Ok(self
                .windows
                .iter()
                .find(|(w, _)| w.id == window.id)
                .map(|(_, panes)| panes.clone())
                .unwrap_or_default())
        }
    }

    fn window(id: &str, index: u32) -> WindowInfo {
        WindowInfo {
            id: id.to_string(),
            index,
            name: format!("win{}", index),
            zoomed: false,
        }
    }

    fn pane(id: &str, index: u32, rect: Rect, dir: &str, command: Option<&str>) -> PaneInfo {
        PaneInfo {
            id: id.to_string(),
            index,
            rect,
            directory: Some(dir.to_string()),
            command: command.map(String::from),
        }
    }

    #[test]
    fn test_single_pane_window() {
        let source = Canned {
            windows: vec![(
                window("@0", 0),
                vec![pane("%0", 0, Rect::new(0, 0, 80, 24), "/home/me", None)],
            )],
        };
        let analysis = Analyzer::new(&source).detach(true).analyze("work").unwrap();
        let kinds: Vec<&str> = analysis.steps.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec!["create-session", "create-window"]);
    }

    #[test]
    fn test_directories_and_commands() {
        let source = Canned {
            windows: vec![(
                window("@0", 0),
                vec![
                    pane("%0", 0, Rect::new(0, 0, 59, 40), "/srv/app", Some("vim")),
                    pane("%1", 1, Rect::new(60, 0, 60, 40), "/var/log", Some("tail -f syslog")),
                ],
            )],
        };
        let analysis = Analyzer::new(&source).analyze("work").unwrap();
        let window = &analysis.session.windows["@0"];
        assert_eq!(window.directory.as_deref(), Some("/srv/app"));
        assert_eq!(window.panes["%0"].command.as_deref(), Some("vim"));
        assert_eq!(window.panes["%1"].directory.as_deref(), Some("/var/log"));
        assert_eq!(window.panes["%1"].orientation, Some(Orientation::Vertical));
        assert_eq!(window.panes["%1"].size, 50);
        assert_eq!(
            analysis.steps.last(),
            Some(&ConstructionStep::AttachSession {
                session: "work".to_string()
            })
        );
    }

    #[test]
    fn test_same_directory_is_not_an_override() {
        let source = Canned {
            windows: vec![(
                window("@0", 0),
                vec![
                    pane("%0", 0, Rect::new(0, 0, 80, 11), "/srv", None),
                    pane("%1", 1, Rect::new(0, 12, 80, 12), "/srv", None),
                ],
            )],
        };
        let analysis = Analyzer::new(&source).analyze("work").unwrap();
        assert_eq!(analysis.session.windows["@0"].panes["%1"].directory, None);
    }

    #[test]
    fn test_rename() {
        let source = Canned {
            windows: vec![(
                window("@0", 0),
                vec![pane("%0", 0, Rect::new(0, 0, 80, 24), "/home/me", None)],
            )],
        };
        let analysis = Analyzer::new(&source).rename("copy").analyze("work").unwrap();
        assert_eq!(analysis.session.name, "copy");
    }

    #[test]
    fn test_missing_session() {
        let source = Canned { windows: vec![] };
        assert!(matches!(
            Analyzer::new(&source).analyze("other"),
            Err(ScribeError::SessionNotFound { detail: None, .. })
        ));
        assert!(matches!(
            Analyzer::new(&source).analyze("work"),
            Err(ScribeError::SessionNotFound { detail: Some(_), .. })
        ));
    }

    #[test]
    fn test_window_without_panes() {
        let source = Canned {
            windows: vec![(window("@3", 0), vec![])],
        };
        let err = Analyzer::new(&source).analyze("work").unwrap_err();
        assert!(matches!(err, ScribeError::SessionNotFound { .. }));
        assert!(err.to_string().contains("@3"));
    }

    #[test]
    fn test_zoomed_window_is_rejected() {
        let mut zoomed = window("@0", 0);
        zoomed.zoomed = true;
        let source = Canned {
            windows: vec![(
                zoomed,
                vec![pane("%0", 0, Rect::new(0, 0, 80, 24), "/", None)],
            )],
        };
        assert!(matches!(
            Analyzer::new(&source).analyze("work"),
            Err(ScribeError::LayoutInference { .. })
        ));
    }
}
