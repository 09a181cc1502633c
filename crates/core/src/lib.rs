//! Scribe Core - records tmux sessions as reproducible scripts
//!
//! This crate provides the core functionality for scribe including:
//! - The session model and the construction steps that recreate it
//! - Split-tree inference from live pane geometry
//! - A fluent builder for new layouts
//! - The tmux process client, command mapping and step replay
//! - Configuration parsing

pub mod analyzer;
pub mod builder;
pub mod closer;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod step;
pub mod tmux;

// Re-export commonly used types at crate root
pub use analyzer::{Analysis, Analyzer, PaneInfo, SessionSource, WindowInfo};
pub use builder::SessionBuilder;
pub use config::{ScribeConfig, TmuxConfig};
pub use error::{ScribeError, ScribeResult};
pub use layout::{InferredLayout, PaneGeometry, Rect, Split};
pub use model::{Indexing, Orientation, Pane, Session, Window};
pub use step::ConstructionStep;
