//! Pipeline domain model

use crate::core::{state::PipelineState, step::Step, StepState};
use std::fmt;

/// A step registered in a pipeline, with its runtime state
pub struct PipelineStep {
    pub step: Box<dyn Step>,

    /// Runtime state
    pub state: StepState,

    /// Whether `cleanup` has been called for this step
    pub cleaned_up: bool,
}

impl PipelineStep {
    pub fn name(&self) -> &str {
        self.step.name()
    }
}

impl fmt::Debug for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineStep")
            .field("name", &self.name())
            .field("state", &self.state)
            .field("cleaned_up", &self.cleaned_up)
            .finish()
    }
}

/// An ordered list of steps run one after another
#[derive(Debug)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Steps in execution order
    pub steps: Vec<PipelineStep>,

    /// Runtime state
    pub state: PipelineState,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            state: PipelineState::new(),
        }
    }

    /// Append a step
    pub fn add_step<S: Step + 'static>(&mut self, step: S) {
        self.steps.push(PipelineStep {
            step: Box::new(step),
            state: StepState::Pending,
            cleaned_up: false,
        });
    }

    /// Append a step, builder style
    pub fn with_step<S: Step + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Get a step by name
    pub fn step(&self, name: &str) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.name() == name)
    }

    /// Check if the pipeline finished with every step completed
    pub fn is_complete(&self) -> bool {
        self.steps
            .iter()
            .all(|s| matches!(s.state, StepState::Completed { .. }))
    }

    /// Check if any step halted the pipeline
    pub fn has_halted(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.state, StepState::Halted { .. }))
    }

    /// Names of steps that returned `Continue`, in execution order
    pub fn completed_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| matches!(s.state, StepState::Completed { .. }))
            .map(|s| s.name())
            .collect()
    }

    /// Names of steps whose `cleanup` ran
    pub fn cleaned_up_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.cleaned_up)
            .map(|s| s.name())
            .collect()
    }
}
