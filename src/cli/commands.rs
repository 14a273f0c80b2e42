//! CLI command definitions

use crate::core::config::ProvisionConfig;
use crate::identity::IdentityClientConfig;
use clap::Args;

/// Run the provisioning pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to provisioning YAML file
    #[arg(short, long)]
    pub file: String,

    /// Override the location
    #[arg(long)]
    pub location: Option<String>,

    /// Override the resource group name
    #[arg(long)]
    pub resource_group: Option<String>,

    /// Treat the resource group as pre-existing
    #[arg(long)]
    pub existing_resource_group: bool,

    /// Override the managed identity name
    #[arg(long)]
    pub identity_name: Option<String>,

    /// Role to bind to the identity; replaces the configured roles (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,

    /// Tag to add or replace (key=value, or key for a tag without a value)
    #[arg(long = "tag", value_parser = parse_tag)]
    pub tags: Vec<(String, Option<String>)>,

    /// Do not create the managed identity
    #[arg(long)]
    pub skip_identity: bool,

    /// Log what would be created without calling Azure
    #[arg(long)]
    pub dry_run: bool,

    /// Path to the az executable
    #[arg(long)]
    pub az_path: Option<String>,

    /// Azure subscription to provision into
    #[arg(long)]
    pub subscription: Option<String>,

    /// Timeout for a single Azure call in seconds
    #[arg(long, default_value_t = 600)]
    pub timeout_secs: u64,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    /// Apply command-line overrides on top of the file configuration
    pub fn apply_overrides(&self, config: &mut ProvisionConfig) {
        if let Some(location) = &self.location {
            config.location = location.clone();
        }
        if let Some(resource_group) = &self.resource_group {
            config.resource_group.name = resource_group.clone();
        }
        if self.existing_resource_group {
            config.resource_group.existing = true;
        }
        if let Some(identity_name) = &self.identity_name {
            config.managed_identity.name = identity_name.clone();
        }
        if !self.roles.is_empty() {
            config.managed_identity.roles = self.roles.clone();
        }
        for (key, value) in &self.tags {
            config.tags.insert(key.clone(), value.clone());
        }
        if self.skip_identity {
            config.managed_identity.create = Some(false);
        }
    }

    /// Configuration for the az-backed client
    pub fn client_config(&self) -> IdentityClientConfig {
        let mut config = IdentityClientConfig::new().with_timeout(self.timeout_secs);
        if let Some(az_path) = &self.az_path {
            config = config.with_az_path(az_path.clone());
        }
        if let Some(subscription) = &self.subscription {
            config = config.with_subscription(subscription.clone());
        }
        config
    }
}

/// Validate a provisioning configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to provisioning YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse a tag given as `key=value`, `key=` or `key`
pub fn parse_tag(s: &str) -> Result<(String, Option<String>), String> {
    let (key, value) = match s.split_once('=') {
        Some((key, "")) => (key, None),
        Some((key, value)) => (key, Some(value.to_string())),
        None => (s, None),
    };
    if key.is_empty() {
        return Err(format!("Invalid tag: {}", s));
    }
    Ok((key.to_string(), value))
}
