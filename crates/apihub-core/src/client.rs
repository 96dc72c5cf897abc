//! Data-only service client
//!
//! Most integrations differ only in base URL, auth scheme, probe endpoint
//! and maybe a fixed header or two. `HttpServiceClient` covers all of them
//! without a dedicated type; services with real behavior wrap it.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;

use crate::auth::{AuthStrategy, Credential};
use crate::config::ServiceDescriptor;
use crate::error::{Error, Result};
use crate::executor::RequestExecutor;
use crate::response::HealthCheckResult;
use crate::traits::{ProbeSpec, ServiceClient};
use crate::transport::HttpTransport;

/// Generic service client: descriptor + credential + probe
#[derive(Debug)]
pub struct HttpServiceClient {
    executor: RequestExecutor,
    credential: Credential,
    probe: ProbeSpec,
    static_headers: HeaderMap,
}

impl HttpServiceClient {
    /// Create a client over the default transport
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the descriptor is invalid or the
    /// credential's scheme does not match the descriptor's.
    pub fn new(descriptor: ServiceDescriptor, credential: Credential, probe: ProbeSpec) -> Result<Self> {
        descriptor.ensure_scheme(credential.scheme())?;
        Ok(Self {
            executor: RequestExecutor::new(descriptor)?,
            credential,
            probe,
            static_headers: HeaderMap::new(),
        })
    }

    /// Create a client over a specific transport
    pub fn with_transport(
        descriptor: ServiceDescriptor,
        credential: Credential,
        probe: ProbeSpec,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        descriptor.ensure_scheme(credential.scheme())?;
        Ok(Self {
            executor: RequestExecutor::with_transport(descriptor, transport)?,
            credential,
            probe,
            static_headers: HeaderMap::new(),
        })
    }

    /// Add a fixed header sent with every request (e.g. an API version)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the name or value is not a valid header.
    pub fn with_static_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::config(format!("Invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::config(format!("Invalid value for header {}", name)))?;

        self.static_headers.insert(name, value);
        Ok(self)
    }

    /// The credential this client presents
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The probe this client runs
    pub fn probe_spec(&self) -> &ProbeSpec {
        &self.probe
    }
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = self.credential.auth_headers();
        for (name, value) in &self.static_headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    async fn probe(&self) -> Result<HealthCheckResult> {
        Ok(self.probe.run(self).await)
    }
}
