//! Step that creates the user-assigned managed identity for a build

use crate::core::{keys, keys::Tags, PipelineContext, StateError, Step, StepAction, StepError};
use crate::execution::process_step_result;
use crate::identity::{IdentityProvisioner, ManagedIdentityRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What the identity step did, stored under [`keys::IDENTITY_CREATED`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityOutcome {
    /// Not created: the step has not finished, halted, or was cancelled
    NotCreated,
    /// Created (or updated) by this run
    Created,
    /// The resource group pre-existed, so the identity is assumed to be
    /// managed outside this pipeline
    AlreadyExists,
    /// Creation was explicitly turned off
    Skipped,
}

impl IdentityOutcome {
    /// Whether later steps may use the identity
    pub fn is_available(&self) -> bool {
        matches!(self, IdentityOutcome::Created | IdentityOutcome::AlreadyExists)
    }
}

impl fmt::Display for IdentityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityOutcome::NotCreated => write!(f, "not created"),
            IdentityOutcome::Created => write!(f, "created"),
            IdentityOutcome::AlreadyExists => write!(f, "already exists"),
            IdentityOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Inputs read from the context, all up front
struct Inputs {
    resource_group_name: String,
    is_existing_resource_group: bool,
    is_resource_group_created: bool,
    create_requested: Option<bool>,
    identity_name: String,
    roles: Vec<String>,
    location: String,
    tags: Tags,
}

impl Inputs {
    fn read(ctx: &PipelineContext) -> Result<Self, StateError> {
        Ok(Self {
            resource_group_name: ctx.get(keys::RESOURCE_GROUP_NAME)?,
            is_existing_resource_group: ctx.get(keys::IS_EXISTING_RESOURCE_GROUP)?,
            is_resource_group_created: ctx.get(keys::IS_RESOURCE_GROUP_CREATED)?,
            create_requested: ctx.get_optional(keys::CREATE_MANAGED_IDENTITY_REQUESTED)?,
            identity_name: ctx.get(keys::MANAGED_IDENTITY_NAME)?,
            roles: ctx.get(keys::MANAGED_IDENTITY_ROLES)?,
            location: ctx.get(keys::LOCATION)?,
            tags: ctx.get(keys::TAGS)?,
        })
    }

    fn into_request(self) -> ManagedIdentityRequest {
        ManagedIdentityRequest {
            resource_group_name: self.resource_group_name,
            identity_name: self.identity_name,
            location: self.location,
            roles: self.roles,
            tags: self.tags,
        }
    }
}

/// Creates the user-assigned managed identity once the resource group exists
///
/// Skips without a cloud call when creation is turned off or the resource
/// group pre-existed. Halts when the resource group was never created.
/// Roles are only logged here; a later step binds them.
pub struct CreateManagedIdentityStep<P> {
    provisioner: P,
}

impl<P: IdentityProvisioner> CreateManagedIdentityStep<P> {
    pub const NAME: &'static str = "create-managed-identity";

    pub fn new(provisioner: P) -> Self {
        Self { provisioner }
    }

    async fn provision(
        &self,
        ctx: &mut PipelineContext,
        cancel: &CancellationToken,
    ) -> Result<(), StepError> {
        ctx.put(keys::IDENTITY_CREATED, IdentityOutcome::NotCreated);
        let inputs = Inputs::read(ctx).map_err(|source| StepError::State {
            step: Self::NAME.to_string(),
            // Best effort: the failed read is the error
            identity: ctx.get_optional(keys::MANAGED_IDENTITY_NAME).ok().flatten(),
            resource_group: ctx.get_optional(keys::RESOURCE_GROUP_NAME).ok().flatten(),
            source,
        })?;

        if inputs.create_requested == Some(false) {
            info!(" -> Managed identity creation disabled, skipping");
            ctx.put(keys::IDENTITY_CREATED, IdentityOutcome::Skipped);
            return Ok(());
        }

        if inputs.is_existing_resource_group {
            info!(
                " -> Resource group '{}' already exists, skipping managed identity creation",
                inputs.resource_group_name
            );
            ctx.put(keys::IDENTITY_CREATED, IdentityOutcome::AlreadyExists);
            return Ok(());
        }

        if !inputs.is_resource_group_created {
            return Err(StepError::ResourceGroupNotCreated {
                resource_group: inputs.resource_group_name,
            });
        }

        info!(" -> ResourceGroupName : '{}'", inputs.resource_group_name);
        info!(" -> ManagedIdentity : '{}'", inputs.identity_name);
        info!(" -> ManagedIdentityRoles");
        for role in &inputs.roles {
            info!("   -> '{}'", role);
        }

        let request = inputs.into_request();
        let handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(StepError::Cancelled {
                    identity: request.identity_name,
                    resource_group: request.resource_group_name,
                });
            }
            result = self.provisioner.create_or_update(&request) => {
                result.map_err(|source| StepError::IdentityCreation {
                    identity: request.identity_name.clone(),
                    resource_group: request.resource_group_name.clone(),
                    source: Box::new(source),
                })?
            }
        };

        info!(" -> Created managed identity '{}'", handle.id);
        ctx.put(keys::IDENTITY_CREATED, IdentityOutcome::Created);
        ctx.put(keys::MANAGED_IDENTITY_RESOURCE_ID, handle.id);
        if let Some(principal_id) = handle.principal_id {
            ctx.put(keys::MANAGED_IDENTITY_PRINCIPAL_ID, principal_id);
        }
        Ok(())
    }
}

#[async_trait]
impl<P: IdentityProvisioner> Step for CreateManagedIdentityStep<P> {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: &mut PipelineContext, cancel: &CancellationToken) -> StepAction {
        info!("Creating user assigned managed identity ...");
        let result = self.provision(ctx, cancel).await;
        process_step_result(Self::NAME, result, ctx)
    }

    /// Identities are never deleted on unwind; a created identity outlives a
    /// halted run.
    async fn cleanup(&self, _ctx: &mut PipelineContext) {}
}
