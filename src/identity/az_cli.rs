//! Azure CLI subprocess client - creates identities with `az identity create`

use crate::identity::{
    IdentityClientConfig, IdentityError, IdentityHandle, IdentityProvisioner,
    ManagedIdentityRequest,
};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Client that provisions user-assigned identities through the `az` CLI
///
/// `az identity create` is a create-or-update: running it again with the same
/// arguments converges on the same resource.
#[derive(Debug, Clone)]
pub struct AzCliIdentityClient {
    /// Path to az executable
    az_path: String,

    subscription: Option<String>,

    /// Timeout for command execution in seconds
    timeout_secs: u64,
}

impl AzCliIdentityClient {
    pub fn new(config: IdentityClientConfig) -> Self {
        Self {
            az_path: config.az_path.unwrap_or_else(|| "az".to_string()),
            subscription: config.subscription,
            timeout_secs: config.timeout_secs,
        }
    }

    /// Get the az executable path
    pub fn az_path(&self) -> &str {
        &self.az_path
    }

    /// Arguments passed to `az` for a request
    pub fn build_args(&self, request: &ManagedIdentityRequest) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "identity".into(),
            "create".into(),
            "--resource-group".into(),
            request.resource_group_name.clone(),
            "--name".into(),
            request.identity_name.clone(),
            "--location".into(),
            request.location.clone(),
        ];

        if !request.tags.is_empty() {
            args.push("--tags".into());
            for (key, value) in &request.tags {
                match value {
                    Some(value) => args.push(format!("{}={}", key, value)),
                    None => args.push(key.clone()),
                }
            }
        }

        if let Some(subscription) = &self.subscription {
            args.push("--subscription".into());
            args.push(subscription.clone());
        }

        args.push("--output".into());
        args.push("json".into());
        args
    }
}

#[async_trait]
impl IdentityProvisioner for AzCliIdentityClient {
    /// Runs `az identity create` and parses the JSON it prints
    ///
    /// # Errors
    /// Returns `IdentityError` if:
    /// - az cannot be spawned or its output cannot be parsed (`Internal`)
    /// - az exits with a non-zero status (`Api`, carrying stderr)
    /// - the command times out (`Timeout`)
    async fn create_or_update(
        &self,
        request: &ManagedIdentityRequest,
    ) -> Result<IdentityHandle, IdentityError> {
        let args = self.build_args(request);
        debug!("Spawning {} {}", self.az_path, args.join(" "));

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new(&self.az_path)
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| IdentityError::Timeout(self.timeout_secs))?;

        let output = result.map_err(|e| {
            IdentityError::Internal(format!("Failed to execute az subprocess: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            warn!("az exited with code {}: {}", exit_code, stderr.trim());
            return Err(IdentityError::Api(format!(
                "az exited with code {}: {}",
                exit_code,
                stderr.trim()
            )));
        }

        let handle: IdentityHandle = serde_json::from_slice(&output.stdout).map_err(|e| {
            IdentityError::Internal(format!("Failed to decode az output: {}", e))
        })?;

        debug!("az reported identity {}", handle.id);
        Ok(handle)
    }
}
