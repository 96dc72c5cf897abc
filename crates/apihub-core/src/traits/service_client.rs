// # Service Client Trait
//
// Defines the capability every third-party service integration provides.
//
// ## Implementations
//
// - `HttpServiceClient` (this crate): data-only services
// - `apihub-services` crate: Cloudflare, GitHub, Vercel, DigitalOcean, Anthropic
//
// ## Usage
//
// ```rust,ignore
// use apihub_core::ServiceClient;
//
// async fn check(client: &dyn ServiceClient) {
//     let response = client.get("/rate_limit").await;
//     if !response.success() {
//         eprintln!("{}: {:?}", client.name(), response.error());
//     }
//
//     let health = client.probe().await?;
//     println!("{} healthy: {}", client.name(), health.healthy);
// }
// ```

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::sync::Arc;

use crate::config::ServiceDescriptor;
use crate::executor::{ApiRequest, RequestExecutor};
use crate::response::{ApiResponse, HealthCheckResult};

/// Trait for third-party service clients
///
/// Two operations are service-specific and must be provided:
/// [`auth_headers`](ServiceClient::auth_headers) and
/// [`probe`](ServiceClient::probe). Everything else is derived from the
/// client's [`RequestExecutor`].
///
/// # Thread Safety
///
/// Implementations must be thread-safe; the registry hands out one shared
/// instance per service to every caller.
///
/// # Error Contract
///
/// Request methods never fail: transport and HTTP failures are encoded in
/// the returned [`ApiResponse`]. `probe` returns `Err` only when the probe
/// itself misbehaves; an unreachable service is an `Ok` result with
/// `healthy == false`.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The executor carrying this service's descriptor and transport
    fn executor(&self) -> &RequestExecutor;

    /// Headers attached to every request
    ///
    /// Usually the output of the service's [`Credential`](crate::auth::Credential);
    /// services may add or replace headers.
    fn auth_headers(&self) -> HeaderMap;

    /// Issue the service's characteristic probe request and interpret it
    async fn probe(&self) -> crate::Result<HealthCheckResult>;

    /// The static service description
    fn descriptor(&self) -> &ServiceDescriptor {
        self.executor().descriptor()
    }

    /// Unique service name
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Execute a request with this service's auth headers
    async fn execute(&self, request: ApiRequest) -> ApiResponse {
        self.executor().execute(self.auth_headers(), request).await
    }

    /// `GET path`
    async fn get(&self, path: &str) -> ApiResponse {
        self.execute(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body
    async fn post(&self, path: &str, body: serde_json::Value) -> ApiResponse {
        self.execute(ApiRequest::post(path).json(body)).await
    }

    /// `PUT path` with a JSON body
    async fn put(&self, path: &str, body: serde_json::Value) -> ApiResponse {
        self.execute(ApiRequest::put(path).json(body)).await
    }

    /// `PATCH path` with a JSON body
    async fn patch(&self, path: &str, body: serde_json::Value) -> ApiResponse {
        self.execute(ApiRequest::patch(path).json(body)).await
    }

    /// `DELETE path`
    async fn delete(&self, path: &str) -> ApiResponse {
        self.execute(ApiRequest::delete(path)).await
    }

    /// Quick health check returning only the verdict
    ///
    /// A misbehaving probe counts as unhealthy.
    async fn is_healthy(&self) -> bool {
        match self.probe().await {
            Ok(result) => result.healthy,
            Err(e) => {
                tracing::warn!("{}: probe failed: {}", self.name(), e);
                false
            }
        }
    }
}

/// Helper trait for constructing service clients on first use
pub trait ServiceFactory: Send + Sync {
    /// Create the client
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn ServiceClient>)`: the constructed client
    /// - `Err(Error)`: configuration error (bad descriptor, bad credential)
    fn create(&self) -> crate::Result<Arc<dyn ServiceClient>>;
}

impl<F> ServiceFactory for F
where
    F: Fn() -> crate::Result<Arc<dyn ServiceClient>> + Send + Sync,
{
    fn create(&self) -> crate::Result<Arc<dyn ServiceClient>> {
        self()
    }
}
