//! Configuration types for apihub
//!
//! This module defines the static description of a service and the registry
//! settings. Both are fixed at construction and never mutated afterward.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::AuthScheme;
use crate::backoff::BackoffPolicy;

/// Static description of one third-party service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique service name (registry key)
    pub name: String,

    /// Base URL all request paths are joined onto
    pub base_url: String,

    /// How the credential is presented
    pub auth_scheme: AuthScheme,

    /// Per-attempt timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total number of attempts for one logical request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff (in milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl ServiceDescriptor {
    /// Create a descriptor with default timeout and retry settings
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, auth_scheme: AuthScheme) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            auth_scheme,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }

    /// Set the per-attempt timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the total number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay
    pub fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Replace the base URL (useful for pointing a client at a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-attempt timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The backoff policy described by this descriptor
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.retry_delay_ms),
            self.max_retries,
        )
    }

    /// Validate the descriptor
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::config("Service name cannot be empty"));
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Service '{}' base URL must use HTTP or HTTPS scheme. Got: '{}'",
                self.name, self.base_url
            )));
        }

        if self.max_retries == 0 {
            return Err(crate::Error::config(format!(
                "Service '{}' max_retries must be >= 1",
                self.name
            )));
        }

        if self.timeout_secs == 0 {
            return Err(crate::Error::config(format!(
                "Service '{}' timeout must be > 0",
                self.name
            )));
        }

        Ok(())
    }

    /// Check that a credential's scheme is the one this service expects
    pub fn ensure_scheme(&self, scheme: AuthScheme) -> Result<(), crate::Error> {
        if self.auth_scheme != scheme {
            return Err(crate::Error::config(format!(
                "Service '{}' expects {} auth but the credential uses {}",
                self.name, self.auth_scheme, scheme
            )));
        }
        Ok(())
    }
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum number of health probes in flight at once
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
}

impl RegistryConfig {
    /// Validate the registry configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.probe_concurrency == 0 {
            return Err(crate::Error::config("probe_concurrency must be > 0"));
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            probe_concurrency: default_probe_concurrency(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_probe_concurrency() -> usize {
    8
}
