//! Test: the identity step inside a full pipeline run

use crate::helpers::*;
use provisioner::core::{Pipeline, StepState};
use provisioner::execution::create_summary;
use provisioner::{CreateManagedIdentityStep, ExecutionStatus, IdentityOutcome};

/// Later steps see the outcome the identity step wrote
#[tokio::test]
async fn test_downstream_step_reads_outcome() {
    let log = new_log();
    let provisioner = RecordingProvisioner::new();
    let mut pipeline = Pipeline::new("bootstrap")
        .with_step(CreateManagedIdentityStep::new(provisioner.clone()))
        .with_step(ProbeStep::new("assign-roles", &log));
    let mut ctx = Inputs::default().seed();

    let status = run_pipeline(&mut pipeline, &mut ctx).await;

    assert_eq!(status, ExecutionStatus::Completed);
    assert!(pipeline.is_complete());
    assert_eq!(entries(&log), vec!["run:assign-roles:Some(Created)"]);
    assert!(pipeline.cleaned_up_steps().is_empty());
}

/// A halt in the identity step stops the pipeline and unwinds earlier steps
#[tokio::test]
async fn test_identity_halt_unwinds_earlier_steps() {
    let log = new_log();
    let provisioner = RecordingProvisioner::new();
    let mut pipeline = Pipeline::new("bootstrap")
        .with_step(ProbeStep::new("resource-group", &log))
        .with_step(CreateManagedIdentityStep::new(provisioner.clone()))
        .with_step(ProbeStep::new("assign-roles", &log));
    let mut ctx = Inputs {
        created: false,
        ..Inputs::default()
    }
    .seed();

    let status = run_pipeline(&mut pipeline, &mut ctx).await;

    assert_eq!(status, ExecutionStatus::Halted);
    assert_eq!(provisioner.call_count(), 0);
    assert_eq!(
        entries(&log),
        vec!["run:resource-group:None", "cleanup:resource-group"]
    );
    assert_eq!(
        pipeline.cleaned_up_steps(),
        vec!["resource-group", "create-managed-identity"]
    );
    assert_eq!(pipeline.step("assign-roles").unwrap().state, StepState::Pending);
    assert!(matches!(
        pipeline.step("create-managed-identity").unwrap().state,
        StepState::Halted { ref error, .. } if error.as_deref().is_some_and(|e| e.contains("rg1"))
    ));
}

/// A later halt cleans up the identity step without deleting the identity
#[tokio::test]
async fn test_later_halt_keeps_identity() {
    let log = new_log();
    let provisioner = RecordingProvisioner::new();
    let mut pipeline = Pipeline::new("bootstrap")
        .with_step(CreateManagedIdentityStep::new(provisioner.clone()))
        .with_step(ProbeStep::halting("assign-roles", &log));
    let mut ctx = Inputs::default().seed();

    let status = run_pipeline(&mut pipeline, &mut ctx).await;

    assert_eq!(status, ExecutionStatus::Halted);
    assert_eq!(provisioner.call_count(), 1);
    assert_eq!(outcome(&ctx), IdentityOutcome::Created);
    assert_eq!(
        entries(&log),
        vec!["run:assign-roles:Some(Created)", "cleanup:assign-roles"]
    );
    assert_eq!(
        pipeline.cleaned_up_steps(),
        vec!["create-managed-identity", "assign-roles"]
    );
}

/// The summary captures what happened
#[tokio::test]
async fn test_summary_of_halted_run() {
    let provisioner = RecordingProvisioner::failing("Conflict");
    let mut pipeline =
        Pipeline::new("bootstrap").with_step(CreateManagedIdentityStep::new(provisioner));
    let mut ctx = Inputs::default().seed();

    run_pipeline(&mut pipeline, &mut ctx).await;
    let summary = create_summary(&pipeline, &ctx).unwrap();

    assert_eq!(summary.status, ExecutionStatus::Halted);
    assert_eq!(summary.identity_outcome, Some(IdentityOutcome::NotCreated));
    assert!(summary.identity_resource_id.is_none());
    assert!(summary.error.unwrap().contains("Conflict"));
    assert!(!summary.cancelled);
    assert_eq!(summary.steps.len(), 1);
    assert!(summary.steps[0].cleaned_up);
}
