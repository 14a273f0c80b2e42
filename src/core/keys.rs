//! Well-known context keys
//!
//! Each key has one producer and a fixed value type. Consumers must only read
//! a key after the step that produces it has run.

use std::collections::BTreeMap;

/// Resource tags; a `None` value is a tag without a value
pub type Tags = BTreeMap<String, Option<String>>;

/// `String` - name of the resource group everything is provisioned into
pub const RESOURCE_GROUP_NAME: &str = "resourceGroupName";

/// `bool` - the resource group existed before this pipeline ran
pub const IS_EXISTING_RESOURCE_GROUP: &str = "isExistingResourceGroup";

/// `bool` - an earlier step created the resource group in this run
pub const IS_RESOURCE_GROUP_CREATED: &str = "isResourceGroupCreated";

/// `bool`, optional - explicit opt-in/opt-out for identity creation
pub const CREATE_MANAGED_IDENTITY_REQUESTED: &str = "createManagedIdentityRequested";

/// `String`
pub const MANAGED_IDENTITY_NAME: &str = "managedIdentityName";

/// `Vec<String>` - role names bound by a later step, in declaration order
pub const MANAGED_IDENTITY_ROLES: &str = "managedIdentityRoles";

/// `String`
pub const LOCATION: &str = "location";

/// [`Tags`]
pub const TAGS: &str = "tags";

/// [`IdentityOutcome`](crate::steps::IdentityOutcome) - written by the identity step
pub const IDENTITY_CREATED: &str = "identityCreated";

/// `String` - ARM resource id of the identity, written on creation
pub const MANAGED_IDENTITY_RESOURCE_ID: &str = "managedIdentityResourceId";

/// `String` - principal id of the identity, written on creation when known
pub const MANAGED_IDENTITY_PRINCIPAL_ID: &str = "managedIdentityPrincipalId";

/// `bool` - the run was cancelled before all steps ran
pub const CANCELLED: &str = "cancelled";
