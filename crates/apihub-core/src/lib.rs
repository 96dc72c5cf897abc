// # apihub-core
//
// Core library for talking to many third-party HTTP APIs through one
// uniform, resilient client surface.
//
// ## Architecture Overview
//
// - **AuthStrategy / Credential**: turns a secret into per-request headers
// - **BackoffPolicy**: the retry schedule (base delay doubling per attempt)
// - **RequestExecutor**: issues one logical request with timeout + retries
// - **ApiResponse**: uniform envelope; transport failures never raise
// - **ServiceClient**: per-service capability (auth headers + health probe)
// - **ServiceRegistry**: lazy singletons and concurrent health sweeps
//
// ## Design Principles
//
// 1. **Failures are data**: request methods always return an envelope
// 2. **Errors are configuration**: only unknown services and bad descriptors raise
// 3. **Isolation**: one failing service never hides another's health
// 4. **Library-First**: the health CLI is a thin layer over this crate

pub mod auth;
pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod registry;
pub mod response;
pub mod traits;
pub mod transport;

// Re-export core types for convenience
pub use auth::{AuthScheme, AuthStrategy, Credential};
pub use backoff::BackoffPolicy;
pub use client::HttpServiceClient;
pub use config::{RegistryConfig, ServiceDescriptor};
pub use error::{Error, Result};
pub use executor::{ApiRequest, RequestExecutor};
pub use registry::ServiceRegistry;
pub use response::{ApiResponse, HealthCheckResult, ResponseBody};
pub use traits::{HealthRule, ProbeSpec, ServiceClient, ServiceFactory};
pub use transport::{HttpTransport, ReqwestTransport, TransportError, TransportRequest, TransportResponse};
