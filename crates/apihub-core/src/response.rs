//! Normalized results
//!
//! [`ApiResponse`] is the envelope returned for every logical call, successful
//! or not. [`HealthCheckResult`] is the outcome of a probe, which is a
//! service-specific interpretation of a response rather than its HTTP success
//! flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parsed response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// Body parsed as JSON
    Json(serde_json::Value),
    /// Body that did not parse, kept verbatim
    Text(String),
}

impl ResponseBody {
    /// Parse raw bytes, falling back to (lossy) text when they are not JSON
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// The JSON value, if the body parsed
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Render the body as text
    pub fn to_text(&self) -> String {
        match self {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text.clone(),
        }
    }
}

/// Result of exactly one logical call, after all retries
///
/// # Invariants
///
/// - `success == true` implies `error().is_none()`
/// - `status_code() == 0` means the transport never produced a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    success: bool,
    status_code: u16,
    data: Option<ResponseBody>,
    error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    elapsed_ms: f64,
    timestamp: DateTime<Utc>,
}

impl ApiResponse {
    /// Envelope for a completed HTTP exchange
    ///
    /// Success follows the usual `ok` rule: any status below 400. For failures
    /// the error message is the body text, or the status when the body is
    /// empty.
    pub fn completed(
        status_code: u16,
        data: ResponseBody,
        headers: BTreeMap<String, String>,
        elapsed_ms: f64,
    ) -> Self {
        let success = is_ok_status(status_code);
        let error = if success {
            None
        } else {
            let text = data.to_text();
            Some(if text.trim().is_empty() {
                format!("HTTP {}", status_code)
            } else {
                text
            })
        };

        Self {
            success,
            status_code,
            data: Some(data),
            error,
            headers,
            elapsed_ms,
            timestamp: Utc::now(),
        }
    }

    /// Envelope for a call that never completed an exchange
    pub fn transport_failure(error: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            success: false,
            status_code: 0,
            data: None,
            error: Some(error.into()),
            headers: BTreeMap::new(),
            elapsed_ms,
            timestamp: Utc::now(),
        }
    }

    /// Whether the call succeeded
    pub fn success(&self) -> bool {
        self.success
    }

    /// HTTP status, or 0 for transport-level failures
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Parsed body, if a response arrived
    pub fn data(&self) -> Option<&ResponseBody> {
        self.data.as_ref()
    }

    /// Error message, present iff the call failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Response headers (lowercase names)
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Time spent, in milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// When the call completed
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether the failure happened below HTTP (timeout, connection)
    pub fn is_transport_failure(&self) -> bool {
        self.status_code == 0
    }
}

/// Outcome of a health probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Probed endpoint (or service name when no request was made)
    pub endpoint: String,
    /// Service-specific verdict
    pub healthy: bool,
    /// HTTP status, when a response arrived
    pub status_code: Option<u16>,
    /// Probe latency in milliseconds
    pub latency_ms: f64,
    /// Why the service is unhealthy
    pub error: Option<String>,
    /// When the probe finished
    pub timestamp: DateTime<Utc>,
}

impl HealthCheckResult {
    /// Build a result from a probe response and its verdict
    ///
    /// A healthy verdict carries no error even when the response itself was
    /// a failure (e.g. a 400 that proves the service is reachable).
    pub fn from_response(
        endpoint: impl Into<String>,
        response: &ApiResponse,
        healthy: bool,
        latency_ms: f64,
    ) -> Self {
        let error = if healthy {
            None
        } else {
            Some(
                response
                    .error()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Unhealthy response (status {})", response.status_code())),
            )
        };

        Self {
            endpoint: endpoint.into(),
            healthy,
            status_code: (response.status_code() != 0).then_some(response.status_code()),
            latency_ms,
            error,
            timestamp: Utc::now(),
        }
    }

    /// An unhealthy result for a probe that could not run or misbehaved
    pub fn failed(endpoint: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            endpoint: endpoint.into(),
            healthy: false,
            status_code: None,
            latency_ms: 0.0,
            error: Some(if error.is_empty() {
                "probe failed".to_string()
            } else {
                error
            }),
            timestamp: Utc::now(),
        }
    }
}

fn is_ok_status(status: u16) -> bool {
    (200..400).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_parse_json_or_text() {
        assert_eq!(
            ResponseBody::parse(br#"{"ok":true}"#),
            ResponseBody::Json(serde_json::json!({"ok": true}))
        );
        assert_eq!(
            ResponseBody::parse(b"<html>oops</html>"),
            ResponseBody::Text("<html>oops</html>".to_string())
        );
        assert_eq!(ResponseBody::parse(b""), ResponseBody::Text(String::new()));
    }

    #[test]
    fn test_success_has_no_error() {
        let response = ApiResponse::completed(
            200,
            ResponseBody::Json(serde_json::json!({"id": 1})),
            BTreeMap::new(),
            12.0,
        );

        assert!(response.success());
        assert!(response.error().is_none());
        assert!(!response.is_transport_failure());
    }

    #[test]
    fn test_client_error_carries_body_as_error() {
        let response = ApiResponse::completed(
            404,
            ResponseBody::Json(serde_json::json!({"message": "Not Found"})),
            BTreeMap::new(),
            5.0,
        );

        assert!(!response.success());
        assert_eq!(response.status_code(), 404);
        assert_eq!(response.error(), Some(r#"{"message":"Not Found"}"#));
    }

    #[test]
    fn test_empty_error_body_falls_back_to_status() {
        let response =
            ApiResponse::completed(503, ResponseBody::Text(String::new()), BTreeMap::new(), 1.0);
        assert_eq!(response.error(), Some("HTTP 503"));
    }

    #[test]
    fn test_transport_failure_has_status_zero() {
        let response = ApiResponse::transport_failure("Request timed out", 30.0);

        assert!(!response.success());
        assert_eq!(response.status_code(), 0);
        assert!(response.is_transport_failure());
        assert!(response.data().is_none());
    }

    #[test]
    fn test_health_result_from_rejected_but_reachable_response() {
        let response = ApiResponse::completed(
            400,
            ResponseBody::Json(serde_json::json!({"error": "invalid"})),
            BTreeMap::new(),
            40.0,
        );

        let healthy = HealthCheckResult::from_response("https://x/messages", &response, true, 41.0);
        assert!(healthy.healthy);
        assert_eq!(healthy.status_code, Some(400));
        assert!(healthy.error.is_none());

        let unhealthy = HealthCheckResult::from_response("https://x/messages", &response, false, 41.0);
        assert_eq!(unhealthy.error.as_deref(), Some(r#"{"error":"invalid"}"#));
    }

    #[test]
    fn test_health_result_omits_status_for_transport_failures() {
        let response = ApiResponse::transport_failure("Connection error: refused", 3.0);
        let result = HealthCheckResult::from_response("svc", &response, false, 3.0);

        assert_eq!(result.status_code, None);
        assert_eq!(result.error.as_deref(), Some("Connection error: refused"));
    }

    #[test]
    fn test_failed_result_never_has_empty_error() {
        let result = HealthCheckResult::failed("svc", "");
        assert!(!result.healthy);
        assert!(!result.error.unwrap().is_empty());
    }
}
