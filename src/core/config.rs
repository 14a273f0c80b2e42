//! Provisioning configuration from YAML

use crate::core::{keys, keys::Tags, PipelineContext};
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Azure naming rule for user-assigned identities
const IDENTITY_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_-]{2,127}$";

const MAX_TAGS: usize = 50;
const MAX_TAG_KEY_LEN: usize = 512;
const MAX_TAG_VALUE_LEN: usize = 256;

/// Top-level provisioning configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Pipeline name
    pub name: String,

    /// Azure region for every resource
    pub location: String,

    pub resource_group: ResourceGroupConfig,

    pub managed_identity: ManagedIdentityConfig,

    /// Tags applied to created resources; `~` for a tag without a value
    #[serde(default)]
    pub tags: Tags,
}

/// Resource group settings
///
/// The resource group itself is managed elsewhere; these flags carry that
/// outcome into the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroupConfig {
    pub name: String,

    /// The resource group existed before this pipeline
    #[serde(default)]
    pub existing: bool,

    /// The resource group was created for this pipeline
    #[serde(default)]
    pub created: bool,
}

/// Managed identity settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedIdentityConfig {
    pub name: String,

    /// Set to `false` to turn identity creation off
    #[serde(default)]
    pub create: Option<bool>,

    /// Roles bound to the identity by a later step
    #[serde(default)]
    pub roles: Vec<String>,
}

impl ProvisionConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ProvisionConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Pipeline name must not be empty");
        }
        if self.location.trim().is_empty() {
            anyhow::bail!("Location must not be empty");
        }
        if self.resource_group.name.trim().is_empty() {
            anyhow::bail!("Resource group name must not be empty");
        }

        let name_pattern = Regex::new(IDENTITY_NAME_PATTERN)?;
        if !name_pattern.is_match(&self.managed_identity.name) {
            anyhow::bail!(
                "Invalid managed identity name '{}': expected 3-128 letters, digits, '-' or '_', starting with a letter or digit",
                self.managed_identity.name
            );
        }

        let mut seen_roles = std::collections::HashSet::new();
        for role in &self.managed_identity.roles {
            if role.trim().is_empty() {
                anyhow::bail!("Managed identity role names must not be empty");
            }
            if !seen_roles.insert(role) {
                anyhow::bail!("Duplicate managed identity role: {}", role);
            }
        }

        if self.tags.len() > MAX_TAGS {
            anyhow::bail!(
                "At most {} tags are supported, got {}",
                MAX_TAGS,
                self.tags.len()
            );
        }
        for (key, value) in &self.tags {
            if key.is_empty() || key.chars().count() > MAX_TAG_KEY_LEN {
                anyhow::bail!(
                    "Tag key '{}' must be between 1 and {} characters",
                    key,
                    MAX_TAG_KEY_LEN
                );
            }
            if let Some(value) = value {
                if value.chars().count() > MAX_TAG_VALUE_LEN {
                    anyhow::bail!(
                        "Value of tag '{}' exceeds {} characters",
                        key,
                        MAX_TAG_VALUE_LEN
                    );
                }
            }
        }

        Ok(())
    }

    /// Write every input the provisioning steps read into the context
    pub fn seed_context(&self, ctx: &mut PipelineContext) {
        ctx.put(keys::RESOURCE_GROUP_NAME, self.resource_group.name.clone());
        ctx.put(keys::IS_EXISTING_RESOURCE_GROUP, self.resource_group.existing);
        ctx.put(keys::IS_RESOURCE_GROUP_CREATED, self.resource_group.created);
        if let Some(create) = self.managed_identity.create {
            ctx.put(keys::CREATE_MANAGED_IDENTITY_REQUESTED, create);
        }
        ctx.put(keys::MANAGED_IDENTITY_NAME, self.managed_identity.name.clone());
        ctx.put(keys::MANAGED_IDENTITY_ROLES, self.managed_identity.roles.clone());
        ctx.put(keys::LOCATION, self.location.clone());
        ctx.put(keys::TAGS, self.tags.clone());
    }
}
