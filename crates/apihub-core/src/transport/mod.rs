// # HTTP Transport
//
// The seam between the request executor and the network.
//
// A transport performs exactly one HTTP exchange and reports how it ended:
// either a completed response (any status) or a classified
// [`TransportError`]. It never retries and never sleeps; retry policy is
// owned by `RequestExecutor`.
//
// ## Implementations
//
// - `ReqwestTransport`: the default, backed by `reqwest::Client`
// - Test doubles in `tests/common` script outcomes without a network

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;

/// One fully-resolved HTTP request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Query parameters appended to the URL
    pub query: Vec<(String, String)>,
    /// Final merged headers
    pub headers: HeaderMap,
    /// JSON body, if any
    pub body: Option<serde_json::Value>,
}

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers keyed by lowercase name
    pub headers: BTreeMap<String, String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Convenience constructor for a response with no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// JSON response with a matching content type
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body: value.to_string().into_bytes(),
        }
    }
}

/// Why an exchange did not complete
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No response within the per-attempt timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection refused, reset or otherwise broken
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request could not be built (bad URL, bad header); retrying cannot help
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other failure before a response was read
    #[error("Request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::InvalidRequest(_))
    }
}

/// Performs single HTTP exchanges
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use; one transport instance is
/// shared by every caller of a client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one exchange
    ///
    /// # Returns
    ///
    /// - `Ok(TransportResponse)`: a response arrived, whatever its status
    /// - `Err(TransportError)`: no response was obtained
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Connection("reset".to_string()).is_retryable());
        assert!(TransportError::Other("eof".to_string()).is_retryable());
        assert!(!TransportError::InvalidRequest("bad url".to_string()).is_retryable());
    }
}
