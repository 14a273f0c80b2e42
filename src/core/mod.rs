//! Core domain models
//!
//! This module defines the pipeline, the step contract, the shared context
//! threaded between steps, and the configuration that seeds it.

pub mod config;
pub mod context;
pub mod keys;
pub mod pipeline;
pub mod state;
pub mod step;

pub use context::*;
pub use pipeline::*;
pub use state::*;
pub use step::*;
