//! DigitalOcean API

use apihub_core::{AuthScheme, Credential, HttpServiceClient, ProbeSpec, Result, ServiceDescriptor};

/// Registry name
pub const NAME: &str = "digitalocean";

/// DigitalOcean API base URL
pub const BASE_URL: &str = "https://api.digitalocean.com/v2";

/// Environment variable holding the token
pub const TOKEN_ENV: &str = "DIGITALOCEAN_TOKEN";

/// Default descriptor for the DigitalOcean API
pub fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new(NAME, BASE_URL, AuthScheme::Bearer)
}

/// Probe: account information
pub fn probe() -> ProbeSpec {
    ProbeSpec::get("/account")
}

/// Create a client for a descriptor and token
pub fn client(descriptor: ServiceDescriptor, credential: Credential) -> Result<HttpServiceClient> {
    HttpServiceClient::new(descriptor, credential, probe())
}

/// Create a client from `DIGITALOCEAN_TOKEN`
pub fn from_env() -> Result<HttpServiceClient> {
    client(descriptor(), crate::credential_from_env(NAME, AuthScheme::Bearer, TOKEN_ENV)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apihub_core::ServiceClient;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_server_error_is_unhealthy_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/account"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let digitalocean = client(
            descriptor().with_base_url(format!("{}/v2", server.uri())),
            Credential::new(AuthScheme::Bearer, Some("do-token".to_string())).unwrap(),
        )
        .unwrap();

        let result = digitalocean.probe().await.unwrap();
        assert!(!result.healthy);
        assert_eq!(result.status_code, Some(503));
        assert_eq!(result.error.as_deref(), Some("HTTP 503"));
    }
}
