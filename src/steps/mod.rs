//! Provisioning steps

pub mod create_identity;

pub use create_identity::{CreateManagedIdentityStep, IdentityOutcome};
