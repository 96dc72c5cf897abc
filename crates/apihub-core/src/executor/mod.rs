//! Request execution with retry and backoff
//!
//! The `RequestExecutor` turns one logical request into at most
//! `max_retries` transport attempts and always yields an [`ApiResponse`].
//!
//! ## Retry Rules
//!
//! ```text
//! attempt ──► completed exchange (any status) ──► return envelope
//!    │
//!    └──► timeout / connection failure ──► sleep base·2^n ──► next attempt
//!                                     └──► last attempt ──► status 0 envelope
//! ```
//!
//! A response that arrived is authoritative, including 4xx/5xx. Only
//! exchanges that never completed are retried.

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backoff::BackoffPolicy;
use crate::config::ServiceDescriptor;
use crate::error::Result;
use crate::response::{ApiResponse, ResponseBody};
use crate::transport::{HttpTransport, ReqwestTransport, TransportError, TransportRequest};

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("apihub/", env!("CARGO_PKG_VERSION"));

/// One logical request relative to a service's base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
}

impl ApiRequest {
    /// Create a request for `path` (joined onto the base URL)
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            headers: HeaderMap::new(),
        }
    }

    /// `GET` request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH` request
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set an extra header; extra headers override defaults and auth headers
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base URL
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Executes requests for one service
///
/// ## Threading
///
/// The executor is immutable after construction and safe to share across
/// tasks as long as its transport is.
pub struct RequestExecutor {
    descriptor: ServiceDescriptor,
    backoff: BackoffPolicy,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("descriptor", &self.descriptor)
            .field("backoff", &self.backoff)
            .field("has_transport", &self.transport.is_some())
            .finish()
    }
}

impl RequestExecutor {
    /// Create an executor using the default `reqwest` transport
    ///
    /// If the HTTP client cannot be built the executor is still created, and
    /// every request returns a failed envelope explaining why.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the descriptor is invalid.
    pub fn new(descriptor: ServiceDescriptor) -> Result<Self> {
        descriptor.validate()?;

        let transport: Option<Arc<dyn HttpTransport>> =
            match ReqwestTransport::new(descriptor.timeout()) {
                Ok(transport) => Some(Arc::new(transport)),
                Err(e) => {
                    warn!(service = %descriptor.name, error = %e, "HTTP transport unavailable");
                    None
                }
            };

        Ok(Self::assemble(descriptor, transport))
    }

    /// Create an executor over an existing `reqwest::Client`
    ///
    /// Lets several services share one connection pool. The descriptor's
    /// timeout still bounds each attempt.
    pub fn with_client(descriptor: ServiceDescriptor, client: reqwest::Client) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self::assemble(
            descriptor,
            Some(Arc::new(ReqwestTransport::from_client(client))),
        ))
    }

    /// Create an executor over a specific transport
    pub fn with_transport(
        descriptor: ServiceDescriptor,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self::assemble(descriptor, Some(transport)))
    }

    /// Create an executor with no transport
    ///
    /// Every request returns `success=false, status_code=0`.
    pub fn without_transport(descriptor: ServiceDescriptor) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self::assemble(descriptor, None))
    }

    fn assemble(descriptor: ServiceDescriptor, transport: Option<Arc<dyn HttpTransport>>) -> Self {
        Self {
            backoff: descriptor.backoff(),
            descriptor,
            transport,
        }
    }

    /// The service this executor talks to
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    /// The retry schedule in effect
    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Full URL for a path, with exactly one slash after the base URL
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.descriptor.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Execute a request
    ///
    /// Never fails: transport and HTTP failures are encoded in the returned
    /// envelope.
    ///
    /// # Parameters
    ///
    /// - `auth_headers`: headers produced by the service's auth strategy
    /// - `request`: the request to execute
    pub async fn execute(&self, auth_headers: HeaderMap, request: ApiRequest) -> ApiResponse {
        let service = self.descriptor.name.as_str();

        let Some(transport) = &self.transport else {
            return ApiResponse::transport_failure(
                format!("No HTTP transport available for service '{}'", service),
                0.0,
            );
        };

        let url = self.url_for(&request.path);
        let headers = self.merge_headers(auth_headers, &request.headers);
        let max_attempts = self.backoff.max_attempts().max(1);
        let started = Instant::now();
        let mut last_error: Option<TransportError> = None;

        for attempt in 0..max_attempts {
            debug!(
                service,
                attempt = attempt + 1,
                method = %request.method,
                %url,
                "sending request"
            );

            let attempt_started = Instant::now();
            let outcome = self
                .attempt(
                    transport.as_ref(),
                    TransportRequest {
                        method: request.method.clone(),
                        url: url.clone(),
                        query: request.query.clone(),
                        headers: headers.clone(),
                        body: request.body.clone(),
                    },
                )
                .await;

            match outcome {
                Ok(response) => {
                    let elapsed_ms = millis(attempt_started.elapsed());
                    debug!(
                        service,
                        attempt = attempt + 1,
                        status = response.status,
                        elapsed_ms,
                        "received response"
                    );

                    return ApiResponse::completed(
                        response.status,
                        ResponseBody::parse(&response.body),
                        response.headers,
                        elapsed_ms,
                    );
                }
                Err(err) if !err.is_retryable() => {
                    warn!(service, %url, error = %err, "request cannot be sent");
                    return ApiResponse::transport_failure(err.to_string(), millis(started.elapsed()));
                }
                Err(err) => {
                    if let Some(delay) = self.backoff.delay_after(attempt) {
                        warn!(
                            "{}: retry {}/{} after {:?}: {}",
                            service,
                            attempt + 1,
                            max_attempts,
                            delay,
                            err
                        );
                        last_error = Some(err);
                        tokio::time::sleep(delay).await;
                    } else {
                        last_error = Some(err);
                    }
                }
            }
        }

        let error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Request failed".to_string());

        warn!(
            "{}: giving up on {} {} after {} attempt(s): {}",
            service, request.method, url, max_attempts, error
        );

        ApiResponse::transport_failure(error, millis(started.elapsed()))
    }

    /// Perform one attempt under the per-attempt timeout
    async fn attempt(
        &self,
        transport: &dyn HttpTransport,
        request: TransportRequest,
    ) -> std::result::Result<crate::transport::TransportResponse, TransportError> {
        match tokio::time::timeout(self.descriptor.timeout(), transport.send(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    /// Defaults, then auth headers, then per-request headers
    fn merge_headers(&self, auth_headers: HeaderMap, extra: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        overlay(&mut headers, &auth_headers);
        overlay(&mut headers, extra);
        headers
    }
}

/// Replace every header in `target` that `source` also names
fn overlay(target: &mut HeaderMap, source: &HeaderMap) {
    for name in source.keys() {
        target.remove(name);
        for value in source.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthScheme, AuthStrategy, Credential};
    use reqwest::header::AUTHORIZATION;

    fn descriptor(base_url: &str) -> ServiceDescriptor {
        ServiceDescriptor::new("test", base_url, AuthScheme::Bearer)
    }

    #[test]
    fn test_url_join_has_exactly_one_slash() {
        let executor = RequestExecutor::without_transport(descriptor("https://api.example.com/v2/")).unwrap();

        assert_eq!(executor.url_for("/account"), "https://api.example.com/v2/account");
        assert_eq!(executor.url_for("account"), "https://api.example.com/v2/account");

        let executor = RequestExecutor::without_transport(descriptor("https://api.example.com")).unwrap();
        assert_eq!(executor.url_for("//rate_limit"), "https://api.example.com/rate_limit");
    }

    #[test]
    fn test_extra_headers_win_over_auth_and_defaults() {
        let executor = RequestExecutor::without_transport(descriptor("https://api.example.com")).unwrap();
        let auth = Credential::new(AuthScheme::Bearer, Some("tok".to_string()))
            .unwrap()
            .auth_headers();

        let mut extra = HeaderMap::new();
        extra.insert(AUTHORIZATION, HeaderValue::from_static("Bearer override"));
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let merged = executor.merge_headers(auth, &extra);
        assert_eq!(merged[AUTHORIZATION], "Bearer override");
        assert_eq!(merged[CONTENT_TYPE], "text/plain");
        assert_eq!(merged[USER_AGENT], DEFAULT_USER_AGENT);
        assert_eq!(merged.get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn test_auth_headers_apply_when_no_override() {
        let executor = RequestExecutor::without_transport(descriptor("https://api.example.com")).unwrap();
        let auth = Credential::new(AuthScheme::Bearer, Some("tok".to_string()))
            .unwrap()
            .auth_headers();

        let merged = executor.merge_headers(auth, &HeaderMap::new());
        assert_eq!(merged[AUTHORIZATION], "Bearer tok");
        assert_eq!(merged[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_missing_transport_yields_failed_envelope() {
        let executor = RequestExecutor::without_transport(descriptor("https://api.example.com")).unwrap();

        let response = tokio_test::block_on(executor.execute(HeaderMap::new(), ApiRequest::get("/x")));

        assert!(!response.success());
        assert_eq!(response.status_code(), 0);
        assert!(response.error().unwrap().contains("No HTTP transport"));
    }

    #[tokio::test]
    async fn test_shared_client_serves_several_executors() {
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"pong": true})))
            .expect(2)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let auth = Credential::new(AuthScheme::Bearer, Some("tok".to_string()))
            .unwrap()
            .auth_headers();

        for name in ["first", "second"] {
            let descriptor = ServiceDescriptor::new(name, server.uri(), AuthScheme::Bearer);
            let executor = RequestExecutor::with_client(descriptor, client.clone()).unwrap();

            let response = executor.execute(auth.clone(), ApiRequest::get("/ping")).await;
            assert!(response.success(), "{}: {:?}", name, response.error());
        }
    }

    #[test]
    fn test_shared_client_still_validates_descriptor() {
        let descriptor = descriptor("https://api.example.com").with_max_retries(0);
        let result = RequestExecutor::with_client(descriptor, reqwest::Client::new());
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_invalid_descriptor_fails_construction() {
        let result = RequestExecutor::new(descriptor("https://api.example.com").with_max_retries(0));
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::post("/messages")
            .json(serde_json::json!({"max_tokens": 1}))
            .query("beta", "true");

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/messages");
        assert_eq!(request.query, vec![("beta".to_string(), "true".to_string())]);
    }
}
