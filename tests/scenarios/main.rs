//! Scenario-based tests for the provisioning pipeline

mod helpers;

mod identity_step;
mod unwind;
