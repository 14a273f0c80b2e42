//! Identity client configuration

/// Configuration for the `az`-backed identity client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClientConfig {
    /// Path to the `az` executable
    ///
    /// If not provided, defaults to "az" (assumes it's on PATH).
    pub az_path: Option<String>,

    /// Subscription to provision into; the CLI default when unset
    pub subscription: Option<String>,

    /// Timeout for a single create-or-update in seconds
    pub timeout_secs: u64,
}

impl Default for IdentityClientConfig {
    fn default() -> Self {
        Self {
            az_path: None,
            subscription: None,
            timeout_secs: 600,
        }
    }
}

impl IdentityClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_az_path(mut self, az_path: String) -> Self {
        self.az_path = Some(az_path);
        self
    }

    pub fn with_subscription(mut self, subscription: String) -> Self {
        self.subscription = Some(subscription);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
