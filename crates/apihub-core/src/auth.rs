//! Authentication header strategies
//!
//! A [`Credential`] pairs a secret with an [`AuthScheme`] and renders the
//! headers attached to every request:
//!
//! - `bearer` → `Authorization: Bearer <secret>`
//! - `api-key-header` → `x-api-key: <secret>`
//! - `basic` → `Authorization: Basic <base64(secret)>`
//!
//! The headers are rendered once at construction, so an unusable credential
//! fails there rather than on the first request.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Header used by the `api-key-header` scheme
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication scheme, static per service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <secret>`
    Bearer,
    /// `x-api-key: <secret>`
    #[serde(alias = "x-api-key")]
    ApiKeyHeader,
    /// `Authorization: Basic <base64(secret)>`
    Basic,
}

impl AuthScheme {
    /// The canonical tag for this scheme
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "bearer",
            AuthScheme::ApiKeyHeader => "api-key-header",
            AuthScheme::Basic => "basic",
        }
    }
}

impl FromStr for AuthScheme {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(AuthScheme::Bearer),
            "api-key-header" | "x-api-key" => Ok(AuthScheme::ApiKeyHeader),
            "basic" => Ok(AuthScheme::Basic),
            other => Err(Error::unsupported_scheme(other)),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces the authentication headers for a request
///
/// [`Credential`] is the default implementation. Services that need more
/// (a versioning header, a token obtained out of band) implement this
/// themselves or layer on top of a credential.
pub trait AuthStrategy: Send + Sync {
    /// Headers to attach to every request
    fn auth_headers(&self) -> HeaderMap;
}

/// An opaque secret plus the scheme used to present it
///
/// # Security
///
/// The Debug implementation never exposes the secret.
#[derive(Clone)]
pub struct Credential {
    scheme: AuthScheme,
    secret: Option<String>,
    headers: HeaderMap,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .field(
                "secret",
                &if self.secret.is_some() { "<REDACTED>" } else { "<none>" },
            )
            .finish()
    }
}

impl Credential {
    /// Create a credential from an explicit secret
    ///
    /// `None` or an empty string produce an anonymous credential that adds no
    /// headers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] if the secret cannot be carried in
    /// a header value.
    pub fn new(scheme: AuthScheme, secret: Option<String>) -> Result<Self> {
        let secret = secret.filter(|s| !s.is_empty());
        let headers = match &secret {
            Some(secret) => render_headers(scheme, secret)?,
            None => HeaderMap::new(),
        };

        Ok(Self {
            scheme,
            secret,
            headers,
        })
    }

    /// Create a credential from a scheme tag such as `"bearer"`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAuthScheme`] for unknown tags.
    pub fn from_tag(tag: &str, secret: Option<String>) -> Result<Self> {
        Self::new(tag.parse()?, secret)
    }

    /// Create a credential whose secret is read from an environment variable
    ///
    /// A missing variable yields an anonymous credential.
    pub fn from_env(scheme: AuthScheme, var: &str) -> Result<Self> {
        Self::new(scheme, std::env::var(var).ok())
    }

    /// Create a credential that adds no headers
    pub fn anonymous(scheme: AuthScheme) -> Self {
        Self {
            scheme,
            secret: None,
            headers: HeaderMap::new(),
        }
    }

    /// The scheme this credential is presented with
    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// Whether a secret is present
    pub fn is_present(&self) -> bool {
        self.secret.is_some()
    }
}

impl AuthStrategy for Credential {
    fn auth_headers(&self) -> HeaderMap {
        self.headers.clone()
    }
}

fn render_headers(scheme: AuthScheme, secret: &str) -> Result<HeaderMap> {
    let (name, value) = match scheme {
        AuthScheme::Bearer => (AUTHORIZATION, format!("Bearer {}", secret)),
        AuthScheme::ApiKeyHeader => (HeaderName::from_static(API_KEY_HEADER), secret.to_string()),
        AuthScheme::Basic => (
            AUTHORIZATION,
            format!("Basic {}", BASE64.encode(secret.as_bytes())),
        ),
    };

    let mut value = HeaderValue::from_str(&value).map_err(|_| {
        Error::invalid_credential(format!(
            "{} credential contains characters not allowed in a header",
            scheme
        ))
    })?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(name, value);
    Ok(headers)
}
