//! Managed identity request and response types

use crate::core::keys::Tags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for identity provisioning
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The control plane rejected the request
    #[error("API error: {0}")]
    Api(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Parameters for a create-or-update of a user-assigned managed identity
///
/// Built from the pipeline context for every run and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedIdentityRequest {
    pub resource_group_name: String,
    pub identity_name: String,
    pub location: String,

    /// Roles a later step binds to the identity; not applied on creation
    pub roles: Vec<String>,

    pub tags: Tags,
}

/// The identity resource as reported by the control plane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityHandle {
    /// ARM resource id
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub principal_id: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,
}

impl IdentityHandle {
    /// Build the handle an ARM deployment would report for `request`
    pub fn for_request(subscription: &str, request: &ManagedIdentityRequest) -> Self {
        Self {
            id: format!(
                "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ManagedIdentity/userAssignedIdentities/{}",
                subscription, request.resource_group_name, request.identity_name
            ),
            name: request.identity_name.clone(),
            principal_id: None,
            client_id: None,
        }
    }
}
