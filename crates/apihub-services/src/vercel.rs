//! Vercel API
//!
//! Data-only: a descriptor, a bearer token and `GET /v2/user` as the probe.

use apihub_core::{AuthScheme, Credential, HttpServiceClient, ProbeSpec, Result, ServiceDescriptor};

/// Registry name
pub const NAME: &str = "vercel";

/// Vercel API base URL
pub const BASE_URL: &str = "https://api.vercel.com";

/// Environment variable holding the token
pub const TOKEN_ENV: &str = "VERCEL_TOKEN";

/// Default descriptor for the Vercel API
pub fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new(NAME, BASE_URL, AuthScheme::Bearer)
}

/// Probe: the authenticated user
pub fn probe() -> ProbeSpec {
    ProbeSpec::get("/v2/user")
}

/// Create a client for a descriptor and token
pub fn client(descriptor: ServiceDescriptor, credential: Credential) -> Result<HttpServiceClient> {
    HttpServiceClient::new(descriptor, credential, probe())
}

/// Create a client from `VERCEL_TOKEN`
pub fn from_env() -> Result<HttpServiceClient> {
    client(descriptor(), crate::credential_from_env(NAME, AuthScheme::Bearer, TOKEN_ENV)?)
}
