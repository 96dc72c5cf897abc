// # Anthropic Messages API
//
// The probe sends a one-token message. Any answer that proves the API is up
// and routing (200, or a 400/401/429 rejection) counts as healthy; only
// server errors and transport failures do not.
//
// ## API Reference
//
// - https://docs.anthropic.com/en/api/messages
// - Every request carries `anthropic-version`

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;

use apihub_core::transport::HttpTransport;
use apihub_core::{
    AuthScheme, AuthStrategy, Credential, HealthCheckResult, HealthRule, ProbeSpec,
    RequestExecutor, Result, ServiceClient, ServiceDescriptor,
};

/// Registry name
pub const NAME: &str = "anthropic";

/// Anthropic API base URL
pub const BASE_URL: &str = "https://api.anthropic.com/v1";

/// Environment variable holding the API key
pub const KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// API version sent with every request
pub const API_VERSION: &str = "2023-06-01";

/// Statuses that show the API is reachable
pub const REACHABLE_STATUSES: [u16; 4] = [200, 400, 401, 429];

const VERSION_HEADER: HeaderName = HeaderName::from_static("anthropic-version");
const PROBE_MODEL: &str = "claude-3-5-haiku-20241022";

/// Default descriptor for the Anthropic API
pub fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new(NAME, BASE_URL, AuthScheme::ApiKeyHeader)
}

fn probe_spec() -> ProbeSpec {
    ProbeSpec::post(
        "/messages",
        serde_json::json!({
            "model": PROBE_MODEL,
            "max_tokens": 1,
            "messages": [{ "role": "user", "content": "ping" }]
        }),
    )
    .with_rule(HealthRule::StatusIn(REACHABLE_STATUSES.to_vec()))
}

/// Anthropic client
#[derive(Debug)]
pub struct AnthropicClient {
    executor: RequestExecutor,
    credential: Credential,
    probe: ProbeSpec,
}

impl AnthropicClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the descriptor is invalid or the
    /// credential is not an API-key credential.
    pub fn new(descriptor: ServiceDescriptor, credential: Credential) -> Result<Self> {
        descriptor.ensure_scheme(credential.scheme())?;
        Ok(Self {
            executor: RequestExecutor::new(descriptor)?,
            credential,
            probe: probe_spec(),
        })
    }

    pub fn with_transport(
        descriptor: ServiceDescriptor,
        credential: Credential,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        descriptor.ensure_scheme(credential.scheme())?;
        Ok(Self {
            executor: RequestExecutor::with_transport(descriptor, transport)?,
            credential,
            probe: probe_spec(),
        })
    }

    /// Create a client from `ANTHROPIC_API_KEY`
    pub fn from_env() -> Result<Self> {
        Self::new(descriptor(), crate::credential_from_env(NAME, AuthScheme::ApiKeyHeader, KEY_ENV)?)
    }
}

#[async_trait]
impl ServiceClient for AnthropicClient {
    fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = self.credential.auth_headers();
        headers.insert(VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        headers
    }

    async fn probe(&self) -> Result<HealthCheckResult> {
        Ok(self.probe.run(self).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn probe_with_status(status: u16) -> HealthCheckResult {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_partial_json(serde_json::json!({ "max_tokens": 1 })))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(serde_json::json!({"type": "error", "error": {"type": "test"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::new(
            descriptor().with_base_url(format!("{}/v1", server.uri())),
            Credential::new(AuthScheme::ApiKeyHeader, Some("sk-test".to_string())).unwrap(),
        )
        .unwrap();

        client.probe().await.unwrap()
    }

    #[tokio::test]
    async fn test_client_errors_count_as_reachable() {
        for status in [200, 400, 401, 429] {
            let result = probe_with_status(status).await;
            assert!(result.healthy, "status {} should be healthy", status);
            assert_eq!(result.status_code, Some(status));
            assert!(result.error.is_none());
        }
    }

    #[tokio::test]
    async fn test_server_error_is_unhealthy() {
        let result = probe_with_status(500).await;

        assert!(!result.healthy);
        assert_eq!(result.status_code, Some(500));
        assert!(result.error.is_some());
    }

    #[test]
    fn test_version_header_added_without_key() {
        let client = AnthropicClient::new(descriptor(), Credential::anonymous(AuthScheme::ApiKeyHeader)).unwrap();
        let headers = client.auth_headers();

        assert_eq!(headers["anthropic-version"], API_VERSION);
        assert!(!headers.contains_key("x-api-key"));
    }

    #[test]
    fn test_bearer_credential_is_rejected() {
        let bearer = Credential::new(AuthScheme::Bearer, Some("sk-test".to_string())).unwrap();

        let err = AnthropicClient::new(descriptor(), bearer.clone()).unwrap_err();
        assert!(err.is_configuration());

        let transport: Arc<dyn HttpTransport> = Arc::new(apihub_core::transport::ReqwestTransport::from_client(
            reqwest::Client::new(),
        ));
        let err = AnthropicClient::with_transport(descriptor(), bearer, transport).unwrap_err();
        assert!(err.is_configuration());
    }
}
