//! Main execution engine - runs a pipeline's steps in order and unwinds on halt

use crate::{
    core::{keys, ExecutionStatus, Pipeline, PipelineContext, StepAction, StepError, StepState, TransitionError},
    execution::process_step_result,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
    },
    StepStarted {
        step_id: String,
        index: usize,
        total: usize,
    },
    StepCompleted {
        step_id: String,
    },
    StepHalted {
        step_id: String,
        error: Option<String>,
    },
    /// The token was cancelled before `step_id` could start
    PipelineCancelled {
        step_id: String,
    },
    StepCleanedUp {
        step_id: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Errors from the engine itself, as opposed to a step halting
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pipeline cannot be executed: {0}")]
    Transition(#[from] TransitionError),
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Sequential pipeline execution engine
///
/// Runs one step to completion before starting the next. The first step that
/// returns [`StepAction::Halt`] stops the run; every step whose `run` was
/// entered is then cleaned up, most recent first.
#[derive(Default)]
pub struct ExecutionEngine {
    event_handlers: Vec<EventHandler>,
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute the entire pipeline
    ///
    /// Returns the terminal status. A halt is not an `Err`: the halting error
    /// is left in the context's error slot. `Err` means the pipeline was not
    /// in a state that allows execution.
    pub async fn execute(
        &self,
        pipeline: &mut Pipeline,
        ctx: &mut PipelineContext,
        cancel: &CancellationToken,
    ) -> Result<ExecutionStatus, EngineError> {
        let execution_id = pipeline.state.execution_id;
        let total = pipeline.steps.len();

        pipeline.state.start(total)?;
        info!("Starting pipeline execution: {} ({})", pipeline.name, execution_id);
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
        });

        let mut halted = false;

        for index in 0..total {
            let step_id = pipeline.steps[index].name().to_string();

            if cancel.is_cancelled() {
                warn!("Pipeline cancelled before step {}", step_id);
                ctx.put(keys::CANCELLED, true);
                process_step_result(
                    &step_id,
                    Err(StepError::PipelineCancelled {
                        step: step_id.clone(),
                    }),
                    ctx,
                );
                self.emit_event(ExecutionEvent::PipelineCancelled { step_id });
                halted = true;
                break;
            }

            let started_at = chrono::Utc::now();
            pipeline.steps[index].state = StepState::Running { started_at };
            self.emit_event(ExecutionEvent::StepStarted {
                step_id: step_id.clone(),
                index,
                total,
            });

            let action = pipeline.steps[index].step.run(ctx, cancel).await;

            match action {
                StepAction::Continue => {
                    pipeline.steps[index].state = StepState::Completed {
                        started_at,
                        completed_at: chrono::Utc::now(),
                    };
                    pipeline.state.completed_steps += 1;
                    self.emit_event(ExecutionEvent::StepCompleted { step_id });
                }
                StepAction::Halt => {
                    let error = ctx.error().map(|e| e.to_string());
                    if ctx.error().is_some_and(StepError::is_cancelled) {
                        ctx.put(keys::CANCELLED, true);
                    }
                    pipeline.steps[index].state = StepState::Halted {
                        error: error.clone(),
                        started_at,
                        halted_at: chrono::Utc::now(),
                    };
                    self.emit_event(ExecutionEvent::StepHalted { step_id, error });
                    halted = true;
                    break;
                }
            }
        }

        let status = if halted {
            self.cleanup(pipeline, ctx).await;
            pipeline.state.halt()?;
            ExecutionStatus::Halted
        } else {
            pipeline.state.complete()?;
            ExecutionStatus::Completed
        };

        info!("Pipeline execution finished: {} - {:?}", pipeline.name, status);
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
        });

        Ok(status)
    }

    /// Clean up every step whose `run` was entered, most recent first
    async fn cleanup(&self, pipeline: &mut Pipeline, ctx: &mut PipelineContext) {
        for entry in pipeline.steps.iter_mut().rev().filter(|s| s.state.has_run()) {
            debug!("Cleaning up step {}", entry.name());
            entry.step.cleanup(ctx).await;
            entry.cleaned_up = true;
            self.emit_event(ExecutionEvent::StepCleanedUp {
                step_id: entry.name().to_string(),
            });
        }
    }
}
