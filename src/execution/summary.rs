//! Run summary - a serializable record of one pipeline execution

use crate::core::{keys, ExecutionStatus, Pipeline, PipelineContext, StateError, StepState};
use crate::steps::IdentityOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of a pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Pipeline name
    pub pipeline_name: String,

    /// Execution status
    pub status: ExecutionStatus,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Progress (0.0 to 1.0)
    pub progress: f64,

    pub steps: Vec<StepSummary>,

    /// Outcome recorded by the identity step, if it ran
    pub identity_outcome: Option<IdentityOutcome>,

    /// ARM id of the identity, if it was created
    pub identity_resource_id: Option<String>,

    /// Message of the error that halted the run
    pub error: Option<String>,

    pub cancelled: bool,
}

/// Per-step entry of a [`RunSummary`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    pub name: String,
    pub state: StepState,
    pub cleaned_up: bool,
}

/// Create a summary from a finished pipeline and its context
///
/// Absent keys are reported as `None`; a key holding the wrong type is an error.
pub fn create_summary(
    pipeline: &Pipeline,
    ctx: &PipelineContext,
) -> Result<RunSummary, StateError> {
    Ok(RunSummary {
        execution_id: pipeline.state.execution_id,
        pipeline_name: pipeline.name.clone(),
        status: pipeline.state.status,
        started_at: pipeline.state.started_at,
        completed_at: pipeline.state.completed_at,
        progress: pipeline.state.progress(),
        steps: pipeline
            .steps
            .iter()
            .map(|s| StepSummary {
                name: s.name().to_string(),
                state: s.state.clone(),
                cleaned_up: s.cleaned_up,
            })
            .collect(),
        identity_outcome: ctx.get_optional(keys::IDENTITY_CREATED)?,
        identity_resource_id: ctx.get_optional(keys::MANAGED_IDENTITY_RESOURCE_ID)?,
        error: ctx.error().map(|e| e.to_string()),
        cancelled: ctx.get_optional(keys::CANCELLED)?.unwrap_or(false),
    })
}
