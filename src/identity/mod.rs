//! Identity provisioning clients

pub mod az_cli;
pub mod client;
pub mod request;

use async_trait::async_trait;
pub use az_cli::AzCliIdentityClient;
pub use client::IdentityClientConfig;
pub use request::{IdentityError, IdentityHandle, ManagedIdentityRequest};
use tracing::info;

/// Creates or updates a user-assigned managed identity
///
/// Implementations must be idempotent: a second call with the same request
/// converges on the same resource and does not fail because the first call
/// succeeded.
#[async_trait]
pub trait IdentityProvisioner: Send + Sync {
    async fn create_or_update(
        &self,
        request: &ManagedIdentityRequest,
    ) -> Result<IdentityHandle, IdentityError>;
}

#[async_trait]
impl<P: IdentityProvisioner + ?Sized> IdentityProvisioner for Box<P> {
    async fn create_or_update(
        &self,
        request: &ManagedIdentityRequest,
    ) -> Result<IdentityHandle, IdentityError> {
        (**self).create_or_update(request).await
    }
}

/// Provisioner that only logs what it would create
#[derive(Debug, Clone, Default)]
pub struct DryRunProvisioner {
    subscription: Option<String>,
}

impl DryRunProvisioner {
    pub fn new(subscription: Option<String>) -> Self {
        Self { subscription }
    }
}

#[async_trait]
impl IdentityProvisioner for DryRunProvisioner {
    async fn create_or_update(
        &self,
        request: &ManagedIdentityRequest,
    ) -> Result<IdentityHandle, IdentityError> {
        let subscription = self
            .subscription
            .as_deref()
            .unwrap_or("00000000-0000-0000-0000-000000000000");
        let handle = IdentityHandle::for_request(subscription, request);
        info!("[dry-run] would create or update {}", handle.id);
        Ok(handle)
    }
}
