//! Test utility functions for provisioning scenarios

use async_trait::async_trait;
use provisioner::core::keys::{self, Tags};
use provisioner::core::{Pipeline, PipelineContext, Step, StepAction, StepError};
use provisioner::execution::{process_step_result, ExecutionEngine};
use provisioner::identity::{IdentityError, IdentityHandle, IdentityProvisioner, ManagedIdentityRequest};
use provisioner::{ExecutionStatus, IdentityOutcome};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Provisioner test double that records every request
#[derive(Clone, Default)]
pub struct RecordingProvisioner {
    calls: Arc<Mutex<Vec<ManagedIdentityRequest>>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with an API error carrying `message`
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Take `delay` before answering
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ManagedIdentityRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvisioner for RecordingProvisioner {
    async fn create_or_update(
        &self,
        request: &ManagedIdentityRequest,
    ) -> Result<IdentityHandle, IdentityError> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(IdentityError::Api(message.clone()));
        }

        let mut handle = IdentityHandle::for_request("sub", request);
        handle.principal_id = Some("principal-1".to_string());
        Ok(handle)
    }
}

/// Step that records its calls into a shared log and optionally halts
pub struct ProbeStep {
    name: String,
    halt: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl ProbeStep {
    pub fn new(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            halt: false,
            log: log.clone(),
        }
    }

    pub fn halting(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            halt: true,
            ..Self::new(name, log)
        }
    }
}

#[async_trait]
impl Step for ProbeStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &mut PipelineContext, _cancel: &CancellationToken) -> StepAction {
        let outcome = ctx
            .get_optional::<IdentityOutcome>(keys::IDENTITY_CREATED)
            .ok()
            .flatten();
        self.log
            .lock()
            .unwrap()
            .push(format!("run:{}:{:?}", self.name, outcome));

        let result = if self.halt {
            Err(StepError::ResourceGroupNotCreated {
                resource_group: format!("probe-{}", self.name),
            })
        } else {
            Ok(())
        };
        process_step_result(&self.name, result, ctx)
    }

    async fn cleanup(&self, _ctx: &mut PipelineContext) {
        self.log.lock().unwrap().push(format!("cleanup:{}", self.name));
    }
}

/// Inputs the identity step reads, with the scenario defaults
pub struct Inputs {
    pub resource_group: &'static str,
    pub existing: bool,
    pub created: bool,
    pub identity: &'static str,
    pub roles: Vec<&'static str>,
    pub location: &'static str,
    pub tags: Tags,
}

impl Default for Inputs {
    fn default() -> Self {
        let mut tags = Tags::new();
        tags.insert("env".to_string(), Some("test".to_string()));
        tags.insert("owner".to_string(), None);

        Self {
            resource_group: "rg1",
            existing: false,
            created: true,
            identity: "id1",
            roles: vec!["Reader", "Contributor"],
            location: "westus",
            tags,
        }
    }
}

impl Inputs {
    pub fn seed(&self) -> PipelineContext {
        let mut ctx = PipelineContext::new();
        ctx.put(keys::RESOURCE_GROUP_NAME, self.resource_group.to_string());
        ctx.put(keys::IS_EXISTING_RESOURCE_GROUP, self.existing);
        ctx.put(keys::IS_RESOURCE_GROUP_CREATED, self.created);
        ctx.put(keys::MANAGED_IDENTITY_NAME, self.identity.to_string());
        ctx.put(
            keys::MANAGED_IDENTITY_ROLES,
            self.roles.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
        );
        ctx.put(keys::LOCATION, self.location.to_string());
        ctx.put(keys::TAGS, self.tags.clone());
        ctx
    }
}

/// Read the identity outcome the step left behind
pub fn outcome(ctx: &PipelineContext) -> IdentityOutcome {
    ctx.get(keys::IDENTITY_CREATED)
        .expect("identity outcome should be recorded")
}

/// Run a pipeline to completion with a fresh token
pub async fn run_pipeline(pipeline: &mut Pipeline, ctx: &mut PipelineContext) -> ExecutionStatus {
    ExecutionEngine::new()
        .execute(pipeline, ctx, &CancellationToken::new())
        .await
        .expect("pipeline should be executable")
}

pub fn new_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}
