//! Step contract shared by every stage of a pipeline

use crate::core::context::{PipelineContext, StateError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Control signal a step hands back to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepAction {
    /// Run the next step
    Continue,
    /// Stop the pipeline and unwind
    Halt,
}

/// Errors that halt a pipeline
#[derive(Debug, Error)]
pub enum StepError {
    /// A step needed the resource group but no step created it
    #[error("resource group '{resource_group}' not created")]
    ResourceGroupNotCreated { resource_group: String },

    #[error("failed to create managed identity '{identity}' in resource group '{resource_group}': {source}")]
    IdentityCreation {
        identity: String,
        resource_group: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("creation of managed identity '{identity}' in resource group '{resource_group}' was cancelled")]
    Cancelled {
        identity: String,
        resource_group: String,
    },

    /// The pipeline was cancelled between steps
    #[error("pipeline cancelled before step '{step}'")]
    PipelineCancelled { step: String },

    /// A step could not read what an earlier step should have written
    #[error("step '{step}' cannot read its inputs ({}): {source}", describe_target(.identity, .resource_group))]
    State {
        step: String,
        identity: Option<String>,
        resource_group: Option<String>,
        #[source]
        source: StateError,
    },
}

fn describe_target(identity: &Option<String>, resource_group: &Option<String>) -> String {
    match (identity, resource_group) {
        (Some(identity), Some(rg)) => {
            format!("managed identity '{}' in resource group '{}'", identity, rg)
        }
        (Some(identity), None) => format!("managed identity '{}'", identity),
        (None, Some(rg)) => format!("resource group '{}'", rg),
        (None, None) => "no resource named yet".to_string(),
    }
}

impl StepError {
    /// Whether this error was caused by cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            StepError::Cancelled { .. } | StepError::PipelineCancelled { .. }
        )
    }
}

/// A single stage of a provisioning pipeline
///
/// `run` reads its prerequisites from the context, does its work and writes
/// what it produced back. `cleanup` undoes the step's effects when a later
/// step halts the pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    /// Name used in logs and events
    fn name(&self) -> &str;

    async fn run(&self, ctx: &mut PipelineContext, cancel: &CancellationToken) -> StepAction;

    /// Undo this step's effects. Defaults to doing nothing.
    async fn cleanup(&self, _ctx: &mut PipelineContext) {}
}
