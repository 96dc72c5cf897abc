//! Core traits for apihub
//!
//! - [`ServiceClient`]: the per-service capability (auth headers + probe)
//! - [`ServiceFactory`]: lazy construction for the registry
//! - [`ProbeSpec`]: a reusable probe request and its interpretation

pub mod health_probe;
pub mod service_client;

pub use health_probe::{HealthRule, ProbeSpec};
pub use service_client::{ServiceClient, ServiceFactory};
