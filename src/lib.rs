//! provisioner - a sequential provisioning step engine for cloud managed identities

pub mod cli;
pub mod core;
pub mod execution;
pub mod identity;
pub mod steps;

// Re-export commonly used types
pub use core::{ExecutionStatus, Pipeline, PipelineContext, Step, StepAction, StepError, StepState};
pub use execution::{ExecutionEngine, ExecutionEvent, RunSummary};
pub use identity::{IdentityError, IdentityHandle, IdentityProvisioner, ManagedIdentityRequest};
pub use steps::{CreateManagedIdentityStep, IdentityOutcome};
