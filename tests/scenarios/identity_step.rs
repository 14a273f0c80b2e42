//! Test: the managed identity step on its own

use crate::helpers::*;
use provisioner::core::keys;
use provisioner::core::{StepAction, StepError};
use provisioner::identity::IdentityError;
use provisioner::{CreateManagedIdentityStep, IdentityOutcome, Step};
use std::error::Error;
use tokio_util::sync::CancellationToken;

/// Scenario A: a pre-existing resource group means no cloud call
#[tokio::test]
async fn test_existing_resource_group_skips_creation() {
    let provisioner = RecordingProvisioner::new();
    let step = CreateManagedIdentityStep::new(provisioner.clone());
    let mut ctx = Inputs {
        existing: true,
        created: false,
        ..Inputs::default()
    }
    .seed();

    let action = step.run(&mut ctx, &CancellationToken::new()).await;

    assert_eq!(action, StepAction::Continue);
    assert_eq!(provisioner.call_count(), 0);
    assert_eq!(outcome(&ctx), IdentityOutcome::AlreadyExists);
    assert!(ctx.error().is_none());
}

/// The opt-out flag wins over a pre-existing resource group
#[tokio::test]
async fn test_disabled_creation_is_skipped() {
    let provisioner = RecordingProvisioner::new();
    let step = CreateManagedIdentityStep::new(provisioner.clone());
    let mut ctx = Inputs {
        existing: true,
        ..Inputs::default()
    }
    .seed();
    ctx.put(keys::CREATE_MANAGED_IDENTITY_REQUESTED, false);

    let action = step.run(&mut ctx, &CancellationToken::new()).await;

    assert_eq!(action, StepAction::Continue);
    assert_eq!(provisioner.call_count(), 0);
    assert_eq!(outcome(&ctx), IdentityOutcome::Skipped);
}

/// Scenario B: resource group neither pre-existing nor created
#[tokio::test]
async fn test_missing_resource_group_halts() {
    let provisioner = RecordingProvisioner::new();
    let step = CreateManagedIdentityStep::new(provisioner.clone());
    let mut ctx = Inputs {
        existing: false,
        created: false,
        resource_group: "rg1",
        ..Inputs::default()
    }
    .seed();

    let action = step.run(&mut ctx, &CancellationToken::new()).await;

    assert_eq!(action, StepAction::Halt);
    assert_eq!(provisioner.call_count(), 0);
    assert_eq!(outcome(&ctx), IdentityOutcome::NotCreated);

    let error = ctx.error().expect("halt should record an error");
    assert!(matches!(error, StepError::ResourceGroupNotCreated { .. }));
    assert!(error.to_string().contains("rg1"));
}

/// Scenario C: creation succeeds with exactly the values from the context
#[tokio::test]
async fn test_creates_identity_once_with_context_values() {
    let provisioner = RecordingProvisioner::new();
    let step = CreateManagedIdentityStep::new(provisioner.clone());
    let inputs = Inputs {
        created: true,
        identity: "id1",
        roles: vec!["Reader", "Contributor"],
        location: "westus",
        ..Inputs::default()
    };
    let mut ctx = inputs.seed();

    let action = step.run(&mut ctx, &CancellationToken::new()).await;

    assert_eq!(action, StepAction::Continue);
    assert_eq!(outcome(&ctx), IdentityOutcome::Created);

    let calls = provisioner.calls();
    assert_eq!(calls.len(), 1);
    let request = &calls[0];
    assert_eq!(request.resource_group_name, "rg1");
    assert_eq!(request.identity_name, "id1");
    assert_eq!(request.location, "westus");
    assert_eq!(request.tags, inputs.tags);
    assert_eq!(request.roles, vec!["Reader", "Contributor"]);

    assert!(ctx
        .get::<String>(keys::MANAGED_IDENTITY_RESOURCE_ID)
        .unwrap()
        .ends_with("/resourceGroups/rg1/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id1"));
    assert_eq!(
        ctx.get::<String>(keys::MANAGED_IDENTITY_PRINCIPAL_ID).unwrap(),
        "principal-1"
    );
}

/// Scenario D: the collaborator fails
#[tokio::test]
async fn test_collaborator_failure_halts() {
    let provisioner = RecordingProvisioner::failing("AuthorizationFailed");
    let step = CreateManagedIdentityStep::new(provisioner.clone());
    let mut ctx = Inputs::default().seed();

    let action = step.run(&mut ctx, &CancellationToken::new()).await;

    assert_eq!(action, StepAction::Halt);
    assert_eq!(provisioner.call_count(), 1);
    assert_eq!(outcome(&ctx), IdentityOutcome::NotCreated);

    let error = ctx.error().expect("halt should record an error");
    let message = error.to_string();
    assert!(message.contains("id1"));
    assert!(message.contains("rg1"));
    assert!(message.contains("AuthorizationFailed"));

    let source = error.source().expect("collaborator error should be the source");
    assert!(matches!(
        source.downcast_ref::<IdentityError>(),
        Some(IdentityError::Api(msg)) if msg == "AuthorizationFailed"
    ));
}

/// A mistyped input is a contract violation, not a silent default
#[tokio::test]
async fn test_wrong_type_halts_without_calling() {
    let provisioner = RecordingProvisioner::new();
    let step = CreateManagedIdentityStep::new(provisioner.clone());
    let mut ctx = Inputs::default().seed();
    ctx.put(keys::IS_RESOURCE_GROUP_CREATED, "yes".to_string());

    let action = step.run(&mut ctx, &CancellationToken::new()).await;

    assert_eq!(action, StepAction::Halt);
    assert_eq!(provisioner.call_count(), 0);
    assert_eq!(outcome(&ctx), IdentityOutcome::NotCreated);
    let message = ctx.error().unwrap().to_string();
    assert!(message.contains(keys::IS_RESOURCE_GROUP_CREATED));
}

/// A missing input halts with a message naming the identity and resource group
#[tokio::test]
async fn test_missing_location_names_resources() {
    let provisioner = RecordingProvisioner::new();
    let step = CreateManagedIdentityStep::new(provisioner.clone());
    let mut ctx = Inputs::default().seed();
    ctx.remove(keys::LOCATION);

    let action = step.run(&mut ctx, &CancellationToken::new()).await;

    assert_eq!(action, StepAction::Halt);
    assert_eq!(provisioner.call_count(), 0);
    assert_eq!(outcome(&ctx), IdentityOutcome::NotCreated);

    let message = ctx.error().unwrap().to_string();
    assert!(message.contains(keys::LOCATION));
    assert!(message.contains("id1"));
    assert!(message.contains("rg1"));
}

/// Running the step again converges on the same request
#[tokio::test]
async fn test_rerun_sends_identical_request() {
    let provisioner = RecordingProvisioner::new();
    let step = CreateManagedIdentityStep::new(provisioner.clone());

    let mut first = Inputs::default().seed();
    step.run(&mut first, &CancellationToken::new()).await;
    let mut second = Inputs::default().seed();
    step.run(&mut second, &CancellationToken::new()).await;

    let calls = provisioner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(outcome(&second), IdentityOutcome::Created);
}

/// Cleanup is safe after every kind of outcome and never calls the cloud
#[tokio::test]
async fn test_cleanup_after_any_outcome() {
    let cases = [
        (Inputs::default(), RecordingProvisioner::new(), 1),
        (
            Inputs {
                existing: true,
                ..Inputs::default()
            },
            RecordingProvisioner::new(),
            0,
        ),
        (
            Inputs {
                created: false,
                ..Inputs::default()
            },
            RecordingProvisioner::new(),
            0,
        ),
        (Inputs::default(), RecordingProvisioner::failing("boom"), 1),
    ];

    for (inputs, provisioner, expected_calls) in cases {
        let step = CreateManagedIdentityStep::new(provisioner.clone());
        let mut ctx = inputs.seed();

        step.run(&mut ctx, &CancellationToken::new()).await;
        let before = outcome(&ctx);
        step.cleanup(&mut ctx).await;

        assert_eq!(provisioner.call_count(), expected_calls);
        assert_eq!(outcome(&ctx), before);
    }
}
