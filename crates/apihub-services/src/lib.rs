// # apihub-services
//
// Built-in clients for the third-party services apihub knows about.
//
// ## Services
//
// | Name           | Auth           | Credential env         | Probe                     |
// |----------------|----------------|------------------------|---------------------------|
// | `cloudflare`   | bearer         | `CLOUDFLARE_API_TOKEN` | `GET /user/tokens/verify` |
// | `github`       | bearer         | `GITHUB_TOKEN`         | `GET /rate_limit`         |
// | `vercel`       | bearer         | `VERCEL_TOKEN`         | `GET /v2/user`            |
// | `digitalocean` | bearer         | `DIGITALOCEAN_TOKEN`   | `GET /account`            |
// | `anthropic`    | api-key-header | `ANTHROPIC_API_KEY`    | `POST /messages`          |
//
// A missing credential variable is not an error: the client is built
// anonymous and its probe reports the service's answer (usually 401).
//
// ## Usage
//
// ```rust,ignore
// let registry = apihub_core::ServiceRegistry::new();
// apihub_services::register(&registry);
// let results = registry.health_check_all().await;
// ```

pub mod anthropic;
pub mod cloudflare;
pub mod digitalocean;
pub mod github;
pub mod vercel;

pub use anthropic::AnthropicClient;
pub use cloudflare::CloudflareClient;
pub use github::{GithubClient, RateLimit};

use apihub_core::{AuthScheme, Credential, Result, ServiceClient, ServiceRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Names of every built-in service, in registration order
pub const SERVICE_NAMES: &[&str] = &[
    cloudflare::NAME,
    github::NAME,
    vercel::NAME,
    digitalocean::NAME,
    anthropic::NAME,
];

/// Older names accepted in place of a built-in name
pub const ALIASES: &[(&str, &str)] = &[("claude", anthropic::NAME)];

/// Resolve an alias to its built-in name
///
/// Names that are not aliases are returned unchanged.
pub fn canonical_name(name: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

/// Read a service credential from the environment
///
/// An unset or empty variable yields an anonymous credential.
pub(crate) fn credential_from_env(service: &str, scheme: AuthScheme, var: &str) -> Result<Credential> {
    credential_from_lookup(service, scheme, var, |key| std::env::var(key).ok())
}

fn credential_from_lookup(
    service: &str,
    scheme: AuthScheme,
    var: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Credential> {
    let credential = Credential::new(scheme, lookup(var)).inspect_err(|e| {
        warn!("Credential in {} rejected for {}: {}", var, service, e);
    })?;

    if !credential.is_present() {
        debug!("{} is not set, {} client is anonymous", var, service);
    }

    Ok(credential)
}

/// Register every built-in service with a registry
///
/// Nothing is constructed here; each client reads its environment on first
/// `get`.
pub fn register(registry: &ServiceRegistry) {
    registry.register(cloudflare::NAME, cloudflare_factory);
    registry.register(github::NAME, github_factory);
    registry.register(vercel::NAME, vercel_factory);
    registry.register(digitalocean::NAME, digitalocean_factory);
    registry.register(anthropic::NAME, anthropic_factory);
}

fn cloudflare_factory() -> Result<Arc<dyn ServiceClient>> {
    Ok(Arc::new(CloudflareClient::from_env()?))
}

fn github_factory() -> Result<Arc<dyn ServiceClient>> {
    Ok(Arc::new(GithubClient::from_env()?))
}

fn vercel_factory() -> Result<Arc<dyn ServiceClient>> {
    Ok(Arc::new(vercel::from_env()?))
}

fn digitalocean_factory() -> Result<Arc<dyn ServiceClient>> {
    Ok(Arc::new(digitalocean::from_env()?))
}

fn anthropic_factory() -> Result<Arc<dyn ServiceClient>> {
    Ok(Arc::new(AnthropicClient::from_env()?))
}
