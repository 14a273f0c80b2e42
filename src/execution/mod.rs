//! Execution engine for running pipelines

pub mod engine;
pub mod executor;
pub mod summary;

pub use engine::*;
pub use executor::*;
pub use summary::*;
