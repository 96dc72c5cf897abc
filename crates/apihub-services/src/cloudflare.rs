// # Cloudflare
//
// Cloudflare API v4 client with Workers KV helpers.
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Verify token: GET `/user/tokens/verify`
// - Read KV value: GET `/accounts/:account_id/storage/kv/namespaces/:namespace_id/values/:key`
// - Write KV value: PUT `/accounts/:account_id/storage/kv/namespaces/:namespace_id/values/:key`
//
// ## Security
//
// - API token is read from `CLOUDFLARE_API_TOKEN` and never logged
// - KV helpers require `CLOUDFLARE_ACCOUNT_ID`

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::sync::Arc;

use apihub_core::transport::HttpTransport;
use apihub_core::{
    ApiResponse, AuthScheme, Credential, Error, HealthCheckResult, HttpServiceClient, ProbeSpec,
    RequestExecutor, Result, ServiceClient, ServiceDescriptor,
};

/// Registry name
pub const NAME: &str = "cloudflare";

/// Cloudflare API base URL
pub const BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

/// Environment variable holding the account ID
pub const ACCOUNT_ENV: &str = "CLOUDFLARE_ACCOUNT_ID";

const PROBE_PATH: &str = "/user/tokens/verify";

/// Default descriptor for the Cloudflare API
pub fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new(NAME, BASE_URL, AuthScheme::Bearer)
}

/// Cloudflare client
///
/// Health is judged by token verification, so a revoked or mistyped token
/// shows up as unhealthy even though the API itself is reachable.
#[derive(Debug)]
pub struct CloudflareClient {
    inner: HttpServiceClient,
    account_id: Option<String>,
}

impl CloudflareClient {
    /// Create a client
    ///
    /// # Parameters
    ///
    /// - `descriptor`: service description (see [`descriptor`])
    /// - `credential`: bearer API token
    /// - `account_id`: account owning the KV namespaces, if KV is used
    pub fn new(
        descriptor: ServiceDescriptor,
        credential: Credential,
        account_id: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            inner: HttpServiceClient::new(descriptor, credential, ProbeSpec::get(PROBE_PATH))?,
            account_id: account_id.filter(|id| !id.is_empty()),
        })
    }

    /// Create a client over a specific transport
    pub fn with_transport(
        descriptor: ServiceDescriptor,
        credential: Credential,
        account_id: Option<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        Ok(Self {
            inner: HttpServiceClient::with_transport(
                descriptor,
                credential,
                ProbeSpec::get(PROBE_PATH),
                transport,
            )?,
            account_id: account_id.filter(|id| !id.is_empty()),
        })
    }

    /// Create a client from `CLOUDFLARE_API_TOKEN` and `CLOUDFLARE_ACCOUNT_ID`
    pub fn from_env() -> Result<Self> {
        Self::new(
            descriptor(),
            crate::credential_from_env(NAME, AuthScheme::Bearer, TOKEN_ENV)?,
            std::env::var(ACCOUNT_ENV).ok(),
        )
    }

    /// Account ID used for KV paths
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// Read a value from a Workers KV namespace
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no account ID is configured. Request
    /// failures are reported in the returned envelope.
    pub async fn kv_get(&self, namespace_id: &str, key: &str) -> Result<ApiResponse> {
        let path = self.kv_path(namespace_id, key)?;
        Ok(self.get(&path).await)
    }

    /// Write a value to a Workers KV namespace
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no account ID is configured.
    pub async fn kv_put(&self, namespace_id: &str, key: &str, value: &str) -> Result<ApiResponse> {
        let path = self.kv_path(namespace_id, key)?;
        Ok(self.put(&path, serde_json::json!({ "value": value })).await)
    }

    fn kv_path(&self, namespace_id: &str, key: &str) -> Result<String> {
        let account_id = self.account_id.as_deref().ok_or_else(|| {
            Error::config(format!("{} must be set to use Workers KV", ACCOUNT_ENV))
        })?;

        Ok(format!(
            "/accounts/{}/storage/kv/namespaces/{}/values/{}",
            account_id, namespace_id, key
        ))
    }
}

#[async_trait]
impl ServiceClient for CloudflareClient {
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, account_id: Option<&str>) -> CloudflareClient {
        CloudflareClient::new(
            descriptor().with_base_url(server.uri()).with_max_retries(1),
            Credential::new(AuthScheme::Bearer, Some("cf-token".to_string())).unwrap(),
            account_id.map(str::to_string),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_probe_verifies_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/tokens/verify"))
            .and(header("authorization", "Bearer cf-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "result": {"status": "active"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server, None).probe().await.unwrap();

        assert!(result.healthy);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(result.endpoint, format!("{}/user/tokens/verify", server.uri()));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_rejected_token_is_unhealthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/tokens/verify"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API Token"))
            .mount(&server)
            .await;

        let result = client(&server, None).probe().await.unwrap();

        assert!(!result.healthy);
        assert_eq!(result.status_code, Some(401));
        assert_eq!(result.error.as_deref(), Some("Invalid API Token"));
    }

    #[tokio::test]
    async fn test_kv_put_and_get() {
        let server = MockServer::start().await;
        let kv = "/accounts/acct/storage/kv/namespaces/ns1/values/state";

        Mock::given(method("PUT"))
            .and(path(kv))
            .and(body_json(serde_json::json!({"value": "v1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(kv))
            .respond_with(ResponseTemplate::new(200).set_body_string("v1"))
            .expect(1)
            .mount(&server)
            .await;

        let cf = client(&server, Some("acct"));

        let put = cf.kv_put("ns1", "state", "v1").await.unwrap();
        assert!(put.success());

        let get = cf.kv_get("ns1", "state").await.unwrap();
        assert!(get.success());
        assert_eq!(get.data().map(|d| d.to_text()).as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_kv_requires_account_id() {
        let server = MockServer::start().await;
        let cf = client(&server, Some(""));

        assert!(cf.account_id().is_none());
        let err = cf.kv_get("ns1", "state").await.unwrap_err();
        assert!(err.is_configuration());
    }
}
