//! Step result translation - maps what a step did to a control signal

use crate::core::{PipelineContext, StepAction, StepError};
use tracing::error;

/// Translate a step's result into the signal the engine acts on
///
/// `Ok` continues the pipeline. Any error is logged, kept in the context as
/// the run's halting error, and halts the pipeline. Every step funnels its
/// result through here so the policy is the same everywhere.
pub fn process_step_result(
    step_name: &str,
    result: Result<(), StepError>,
    ctx: &mut PipelineContext,
) -> StepAction {
    match result {
        Ok(()) => StepAction::Continue,
        Err(e) => {
            error!("Step {} halted: {}", step_name, e);
            ctx.set_error(e);
            StepAction::Halt
        }
    }
}
