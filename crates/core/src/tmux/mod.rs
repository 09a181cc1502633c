//! Everything that talks to tmux.
//!
//! # Submodules
//!
//! - [`commands`]: the process client, output parsers and the live [`SessionSource`](crate::analyzer::SessionSource)
//! - [`script`]: translation of construction steps into tmux command lines
//! - [`executor`]: replaying steps against a server
//!
//! ```ignore
//! use scribe_core::tmux::{Tmux, TmuxExecutor, replay};
//!
//! let tmux = Tmux::default();
//! let mut executor = TmuxExecutor::new(&tmux, analysis.session.indexing);
//! replay(&analysis.steps, &mut executor)?;
//! ```

mod commands;
mod executor;
mod script;

pub use commands::*;
pub use executor::*;
pub use script::*;
