//! Test doubles and common utilities for contract tests
//!
//! Nothing here touches the network: transports replay a script and stub
//! services answer probes from a fixed behavior.

#![allow(dead_code)]

use apihub_core::error::{Error, Result};
use apihub_core::transport::{HttpTransport, TransportError, TransportRequest, TransportResponse};
use apihub_core::{
    AuthScheme, HealthCheckResult, RequestExecutor, ServiceClient, ServiceDescriptor,
};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted transport outcome
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A completed exchange
    Respond(TransportResponse),
    /// A transport error returned immediately
    Fail(TransportError),
    /// Never answer; the executor's per-attempt timeout must fire
    Hang,
}

impl Outcome {
    pub fn status(status: u16) -> Self {
        Outcome::Respond(TransportResponse::json(status, &serde_json::json!({ "status": status })))
    }

    /// A completed exchange with a plain-text body and no content type
    pub fn text(status: u16, body: &str) -> Self {
        Outcome::Respond(TransportResponse::new(status, body))
    }
}

/// A transport that replays a queue of outcomes, then repeats a fallback
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    calls: Arc<AtomicUsize>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Outcome>, fallback: Outcome) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always produce the same outcome
    pub fn always(outcome: Outcome) -> Self {
        Self::new(Vec::new(), outcome)
    }

    /// Number of exchanges attempted
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match next {
            Outcome::Respond(response) => Ok(response),
            Outcome::Fail(err) => Err(err),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

/// How a [`StubService`] answers its probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubBehavior {
    Healthy,
    Unhealthy,
    Erroring,
    Panicking,
}

/// A service client with a canned probe and no transport
pub struct StubService {
    executor: RequestExecutor,
    behavior: StubBehavior,
    probes: Arc<AtomicUsize>,
}

impl StubService {
    pub fn new(name: &str, behavior: StubBehavior) -> Self {
        let descriptor = ServiceDescriptor::new(name, "https://stub.invalid", AuthScheme::Bearer);
        Self {
            executor: RequestExecutor::without_transport(descriptor).unwrap(),
            behavior,
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceClient for StubService {
    fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    fn auth_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    async fn probe(&self) -> Result<HealthCheckResult> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            StubBehavior::Healthy => Ok(HealthCheckResult {
                endpoint: self.executor.url_for("/health"),
                healthy: true,
                status_code: Some(200),
                latency_ms: 1.0,
                error: None,
                timestamp: chrono::Utc::now(),
            }),
            StubBehavior::Unhealthy => Ok(HealthCheckResult::failed(
                self.executor.url_for("/health"),
                "HTTP 503",
            )),
            StubBehavior::Erroring => Err(Error::probe(self.name(), "stub exploded")),
            StubBehavior::Panicking => panic!("stub probe panicked"),
        }
    }
}

/// A descriptor tuned for fast, deterministic retry tests
pub fn fast_descriptor(name: &str, max_retries: u32) -> ServiceDescriptor {
    ServiceDescriptor::new(name, "https://api.example.test", AuthScheme::Bearer)
        .with_timeout_secs(1)
        .with_max_retries(max_retries)
        .with_retry_delay_ms(100)
}
