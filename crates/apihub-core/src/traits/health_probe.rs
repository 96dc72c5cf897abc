//! Health probe descriptions
//!
//! A [`ProbeSpec`] names one cheap, side-effect-free request and the
//! [`HealthRule`] used to read its outcome. The rule is per service: some
//! services answer a deliberately minimal probe with a client error while
//! being perfectly reachable.

use reqwest::Method;
use tokio::time::Instant;

use crate::executor::ApiRequest;
use crate::response::{ApiResponse, HealthCheckResult};
use crate::traits::ServiceClient;

/// How a probe response is judged
#[derive(Debug, Clone, Default)]
pub enum HealthRule {
    /// Healthy iff the response was successful
    #[default]
    Success,
    /// Healthy iff the status is one of these
    StatusIn(Vec<u16>),
    /// Arbitrary predicate over the response
    Custom(fn(&ApiResponse) -> bool),
}

impl HealthRule {
    /// Judge a response
    pub fn is_healthy(&self, response: &ApiResponse) -> bool {
        match self {
            HealthRule::Success => response.success(),
            HealthRule::StatusIn(statuses) => statuses.contains(&response.status_code()),
            HealthRule::Custom(predicate) => predicate(response),
        }
    }
}

/// A probe request plus its interpretation
#[derive(Debug, Clone)]
pub struct ProbeSpec {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    rule: HealthRule,
}

impl ProbeSpec {
    /// `GET path`, healthy on success
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            rule: HealthRule::Success,
        }
    }

    /// `POST path` with a JSON body, healthy on success
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            rule: HealthRule::Success,
        }
    }

    /// Replace the interpretation rule
    pub fn with_rule(mut self, rule: HealthRule) -> Self {
        self.rule = rule;
        self
    }

    /// Probe path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Interpretation rule
    pub fn rule(&self) -> &HealthRule {
        &self.rule
    }

    /// Run the probe through a client
    ///
    /// Latency covers the whole logical request, retries included.
    pub async fn run<C>(&self, client: &C) -> HealthCheckResult
    where
        C: ServiceClient + ?Sized,
    {
        let mut request = ApiRequest::new(self.method.clone(), self.path.clone());
        if let Some(body) = &self.body {
            request = request.json(body.clone());
        }

        let started = Instant::now();
        let response = client.execute(request).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let healthy = self.rule.is_healthy(&response);
        tracing::debug!(
            service = client.name(),
            healthy,
            status = response.status_code(),
            latency_ms,
            "probe finished"
        );

        HealthCheckResult::from_response(
            client.executor().url_for(&self.path),
            &response,
            healthy,
            latency_ms,
        )
    }
}
