//! Minimal embedding example for apihub-core
//!
//! Registers the built-in services next to a custom one, makes a call through
//! the shared client and runs a health sweep. Set `GITHUB_TOKEN` (or any other
//! service credential) to see authenticated results.

use apihub_core::{
    ApiRequest, AuthScheme, Credential, HealthCheckResult, HealthRule, HttpServiceClient,
    ProbeSpec, RequestExecutor, Result, ServiceClient, ServiceDescriptor, ServiceRegistry,
};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A hand-written client: public status page, no credential
struct StatusPage {
    executor: RequestExecutor,
}

impl StatusPage {
    fn new() -> Result<Self> {
        let descriptor = ServiceDescriptor::new(
            "githubstatus",
            "https://www.githubstatus.com/api/v2",
            AuthScheme::Bearer,
        )
        .with_timeout_secs(10)
        .with_max_retries(2);

        Ok(Self {
            executor: RequestExecutor::new(descriptor)?,
        })
    }
}

#[async_trait::async_trait]
impl ServiceClient for StatusPage {
    fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    fn auth_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    async fn probe(&self) -> Result<HealthCheckResult> {
        fn operational(response: &apihub_core::ApiResponse) -> bool {
            response
                .data()
                .and_then(|d| d.as_json())
                .and_then(|v| v.pointer("/status/indicator"))
                .and_then(|v| v.as_str())
                == Some("none")
        }

        Ok(ProbeSpec::get("/status.json")
            .with_rule(HealthRule::Custom(operational))
            .run(self)
            .await)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let registry = ServiceRegistry::new();
    apihub_services::register(&registry);

    registry.register("githubstatus", || Ok(Arc::new(StatusPage::new()?) as Arc<dyn ServiceClient>));

    // A data-only service needs no type of its own
    registry.register("httpbin", || {
        let descriptor = ServiceDescriptor::new("httpbin", "https://httpbin.org", AuthScheme::Basic);
        let credential = Credential::new(AuthScheme::Basic, Some("demo:demo".to_string()))?;
        Ok(Arc::new(HttpServiceClient::new(
            descriptor,
            credential,
            ProbeSpec::get("/basic-auth/demo/demo"),
        )?) as Arc<dyn ServiceClient>)
    });

    let github = registry.get("github")?;
    let response = github
        .execute(ApiRequest::get("/search/repositories").query("q", "tokio").query("per_page", "1"))
        .await;
    if response.success() {
        info!("GitHub search answered in {:.0}ms", response.elapsed_ms());
    } else {
        warn!("GitHub search failed: {:?}", response.error());
    }

    for (name, result) in registry.health_check_all().await {
        println!(
            "{:<14} healthy={:<5} status={:?} error={:?}",
            name, result.healthy, result.status_code, result.error
        );
    }

    Ok(())
}
