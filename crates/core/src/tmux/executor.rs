//! Replaying construction steps.

use tracing::{debug, info};

use crate::{
    error::ScribeResult,
    model::Indexing,
    step::ConstructionStep,
    tmux::{CommandMapper, Tmux},
};

/// Something that can carry out construction steps one at a time
pub trait StepExecutor {
    fn apply(&mut self, step: &ConstructionStep) -> ScribeResult<()>;
}

/// Executes steps against a live tmux server
pub struct TmuxExecutor<'a> {
    tmux: &'a Tmux,
    mapper: CommandMapper,
}

impl<'a> TmuxExecutor<'a> {
    pub fn new(tmux: &'a Tmux, indexing: Indexing) -> Self {
        Self {
            tmux,
            mapper: CommandMapper::new(indexing),
        }
    }
}

impl StepExecutor for TmuxExecutor<'_> {
    fn apply(&mut self, step: &ConstructionStep) -> ScribeResult<()> {
        let command = self.mapper.map(step)?;
        if command.interactive {
            self.tmux.run_interactive(&command.args)
        } else {
            self.tmux.run(&command.args)
        }
    }
}

/// Apply steps in order, stopping at the first failure.
///
/// Steps already applied are left in place; the error carries the index of
/// the step that failed.
pub fn replay(steps: &[ConstructionStep], executor: &mut dyn StepExecutor) -> ScribeResult<()> {
    for (index, step) in steps.iter().enumerate() {
        debug!(index, kind = step.kind(), "applying step");
        executor.apply(step).map_err(|err| err.at_step(index))?;
    }
    info!(steps = steps.len(), "replay finished");
    Ok(())
}
