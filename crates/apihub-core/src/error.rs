//! Error types for apihub
//!
//! Only configuration-class problems and probe failures are represented here.
//! Transport and HTTP-level failures never surface as `Err`; they are encoded
//! in [`ApiResponse`](crate::response::ApiResponse) instead.

use thiserror::Error;

/// Result type alias for apihub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for apihub
#[derive(Error, Debug)]
pub enum Error {
    /// A service name was looked up that was never registered
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// An auth scheme tag that no strategy handles
    #[error("Unsupported auth scheme: {0}")]
    UnsupportedAuthScheme(String),

    /// A credential that cannot be carried in an HTTP header
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Descriptor or registry configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A health probe misbehaved (as opposed to reporting unhealthy)
    #[error("Probe failed ({service}): {message}")]
    Probe {
        /// Service name
        service: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an unknown service error
    pub fn unknown_service(name: impl Into<String>) -> Self {
        Self::UnknownService(name.into())
    }

    /// Create an unsupported auth scheme error
    pub fn unsupported_scheme(tag: impl Into<String>) -> Self {
        Self::UnsupportedAuthScheme(tag.into())
    }

    /// Create an invalid credential error
    pub fn invalid_credential(msg: impl Into<String>) -> Self {
        Self::InvalidCredential(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a probe failure
    pub fn probe(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Probe {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Whether this error indicates programmer or configuration error
    ///
    /// Configuration errors are the only ones allowed to propagate out of
    /// registry lookup and client construction.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownService(_)
                | Self::UnsupportedAuthScheme(_)
                | Self::InvalidCredential(_)
                | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::unknown_service("nope").is_configuration());
        assert!(Error::unsupported_scheme("digest").is_configuration());
        assert!(Error::config("bad").is_configuration());
        assert!(!Error::probe("svc", "boom").is_configuration());
        assert!(Error::invalid_credential("newline in secret").is_configuration());
    }

    #[test]
    fn test_probe_error_display() {
        let err = Error::probe("github", "stub exploded");
        assert_eq!(err.to_string(), "Probe failed (github): stub exploded");
    }
}
