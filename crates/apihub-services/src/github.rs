//! GitHub REST API client
//!
//! The probe doubles as the rate-limit query, so a health sweep costs no
//! quota.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use apihub_core::{
    ApiResponse, AuthScheme, Credential, HealthCheckResult, HttpServiceClient, ProbeSpec,
    RequestExecutor, Result, ServiceClient, ServiceDescriptor,
};

/// Registry name
pub const NAME: &str = "github";

/// GitHub API base URL
pub const BASE_URL: &str = "https://api.github.com";

/// Environment variable holding the token
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const RATE_LIMIT_PATH: &str = "/rate_limit";
const ACCEPT: &str = "application/vnd.github+json";

/// Default descriptor for the GitHub API
pub fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new(NAME, BASE_URL, AuthScheme::Bearer)
}

/// Core rate-limit bucket as reported by `GET /rate_limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub used: u64,
    /// Unix time at which the window resets
    pub reset: i64,
}

impl RateLimit {
    /// Extract the core bucket from a rate-limit response
    pub fn from_response(response: &ApiResponse) -> Option<Self> {
        let core = response.data()?.as_json()?.pointer("/resources/core")?;
        serde_json::from_value(core.clone()).ok()
    }

    /// Whether the quota is used up
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// GitHub client
#[derive(Debug)]
pub struct GithubClient {
    inner: HttpServiceClient,
}

impl GithubClient {
    pub fn new(descriptor: ServiceDescriptor, credential: Credential) -> Result<Self> {
        let inner = HttpServiceClient::new(descriptor, credential, ProbeSpec::get(RATE_LIMIT_PATH))?
            .with_static_header("accept", ACCEPT)?;
        Ok(Self { inner })
    }

    /// Create a client from `GITHUB_TOKEN`
    pub fn from_env() -> Result<Self> {
        Self::new(descriptor(), crate::credential_from_env(NAME, AuthScheme::Bearer, TOKEN_ENV)?)
    }

    /// Query the current rate-limit status
    pub async fn rate_limit(&self) -> ApiResponse {
        self.get(RATE_LIMIT_PATH).await
    }
}

#[async_trait]
impl ServiceClient for GithubClient {
    fn executor(&self) -> &RequestExecutor {
        self.inner.executor()
    }

    fn auth_headers(&self) -> HeaderMap {
        self.inner.auth_headers()
    }

    async fn probe(&self) -> Result<HealthCheckResult> {
        self.inner.probe().await
    }
}
