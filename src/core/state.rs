//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Overall pipeline execution status
///
/// `Pending -> Running -> (Halted | Completed)`. Both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Pipeline has not started
    Pending,
    /// Pipeline is currently running
    Running,
    /// A step halted the pipeline; completed steps were cleaned up
    Halted,
    /// Every step returned `Continue`
    Completed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Halted | ExecutionStatus::Completed)
    }
}

/// Rejected pipeline state transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pipeline transition from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: ExecutionStatus,
    pub to: ExecutionStatus,
}

/// State of a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepState {
    /// Step has not run (yet, or ever if an earlier step halted)
    Pending,
    /// Step is currently running
    Running {
        started_at: DateTime<Utc>,
    },
    /// Step returned `Continue`
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step returned `Halt`
    Halted {
        error: Option<String>,
        started_at: DateTime<Utc>,
        halted_at: DateTime<Utc>,
    },
}

impl StepState {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepState::Completed { .. } | StepState::Halted { .. })
    }

    /// Whether the step's `run` was entered
    pub fn has_run(&self) -> bool {
        !matches!(self, StepState::Pending)
    }
}

/// Overall pipeline state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution halted or completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of steps
    pub total_steps: usize,

    /// Number of steps that returned `Continue`
    pub completed_steps: usize,
}

impl PipelineState {
    /// Create a new pipeline state
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            total_steps: 0,
            completed_steps: 0,
        }
    }

    fn transition(&mut self, to: ExecutionStatus) -> Result<(), TransitionError> {
        let allowed = matches!(
            (self.status, to),
            (ExecutionStatus::Pending, ExecutionStatus::Running)
                | (ExecutionStatus::Running, ExecutionStatus::Halted)
                | (ExecutionStatus::Running, ExecutionStatus::Completed)
        );
        if !allowed {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Mark pipeline as started
    pub fn start(&mut self, total_steps: usize) -> Result<(), TransitionError> {
        self.transition(ExecutionStatus::Running)?;
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
        Ok(())
    }

    /// Mark pipeline as completed
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.transition(ExecutionStatus::Completed)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark pipeline as halted
    pub fn halt(&mut self) -> Result<(), TransitionError> {
        self.transition(ExecutionStatus::Halted)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Calculate progress percentage (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.completed_steps as f64 / self.total_steps as f64
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
