//! Service registry
//!
//! The registry maps service names to factories and memoizes one client per
//! service, built on first access. It is an explicit context object: create
//! one at startup and pass it to whatever needs service access.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use apihub_core::ServiceRegistry;
//!
//! let registry = ServiceRegistry::new();
//! apihub_services::register(&registry);
//!
//! let github = registry.get("github")?;
//! let response = github.get("/rate_limit").await;
//!
//! for (name, result) in registry.health_check_all().await {
//!     println!("{}: {}", name, result.healthy);
//! }
//! ```
//!
//! ## Registration
//!
//! Service crates register themselves during initialization:
//!
//! ```rust,ignore
//! pub fn register(registry: &ServiceRegistry) {
//!     registry.register("github", || Ok(Arc::new(GithubClient::from_env()?)));
//! }
//! ```

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::response::HealthCheckResult;
use crate::traits::{ServiceClient, ServiceFactory};

/// Registry of service factories and their singleton clients
///
/// ## Thread Safety
///
/// Factories sit behind a `RwLock` (concurrent lookups, exclusive
/// registration). Instances sit behind a `Mutex` that is held while a client
/// is constructed, so concurrent first calls to [`get`](Self::get) build
/// exactly one instance.
pub struct ServiceRegistry {
    /// Registered factories, in registration order
    factories: RwLock<Vec<(String, Arc<dyn ServiceFactory>)>>,

    /// Constructed singletons
    instances: Mutex<HashMap<String, Arc<dyn ServiceClient>>>,

    /// Registry settings
    config: RegistryConfig,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self {
            factories: RwLock::new(Vec::new()),
            instances: Mutex::new(HashMap::new()),
            config: RegistryConfig::default(),
        }
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.list())
            .field("config", &self.config)
            .finish()
    }
}

impl ServiceRegistry {
    /// Create an empty registry with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with explicit settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid.
    pub fn with_config(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Register a factory closure for a service
    ///
    /// Re-registering a name replaces its factory (last registration wins)
    /// and keeps its position in [`list`](Self::list). A client that was
    /// already constructed stays cached.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use apihub_core::{ServiceRegistry, HttpServiceClient, ServiceDescriptor, Credential, AuthScheme, ProbeSpec};
    /// # use std::sync::Arc;
    /// let registry = ServiceRegistry::new();
    /// registry.register("vercel", || {
    ///     let descriptor = ServiceDescriptor::new("vercel", "https://api.vercel.com", AuthScheme::Bearer);
    ///     let credential = Credential::from_env(AuthScheme::Bearer, "VERCEL_TOKEN")?;
    ///     Ok(Arc::new(HttpServiceClient::new(descriptor, credential, ProbeSpec::get("/v2/user"))?))
    /// });
    /// ```
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn ServiceClient>> + Send + Sync + 'static,
    {
        self.register_factory(name, Arc::new(factory));
    }

    /// Register a factory object for a service
    pub fn register_factory(&self, name: impl Into<String>, factory: Arc<dyn ServiceFactory>) {
        let name = name.into();
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);

        match factories.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => {
                debug!("Replacing factory for service {}", name);
                entry.1 = factory;
            }
            None => factories.push((name.clone(), factory)),
        }
        drop(factories);

        let instantiated = self
            .instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&name);
        if instantiated {
            warn!(
                "Service {} re-registered after construction; the cached client is kept",
                name
            );
        }
    }

    /// Get the singleton client for a service, constructing it on first use
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn ServiceClient>)`: the shared client
    /// - `Err(Error::UnknownService)`: the name was never registered
    /// - `Err(Error)`: the factory failed (nothing is cached)
    pub fn get(&self, name: &str) -> Result<Arc<dyn ServiceClient>> {
        let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(client) = instances.get(name) {
            return Ok(Arc::clone(client));
        }

        let factory = self
            .factory(name)
            .ok_or_else(|| Error::unknown_service(name))?;

        let client = factory.create()?;
        info!("Constructed client for service {}", name);
        instances.insert(name.to_string(), Arc::clone(&client));

        Ok(client)
    }

    /// List all registered service names in registration order
    pub fn list(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Check if a service is registered
    pub fn has(&self, name: &str) -> bool {
        self.factory(name).is_some()
    }

    /// Check if a service's client has been constructed
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Probe a single service
    ///
    /// Unlike the sweeps, lookup and probe errors are returned as-is.
    pub async fn probe(&self, name: &str) -> Result<HealthCheckResult> {
        let client = self.get(name)?;
        client.probe().await
    }

    /// Probe every registered service
    ///
    /// See [`health_check`](Self::health_check).
    pub async fn health_check_all(&self) -> BTreeMap<String, HealthCheckResult> {
        let names = self.list();
        self.health_check(&names).await
    }

    /// Probe the named services concurrently
    ///
    /// At most `probe_concurrency` probes run at once. Any failure to build or
    /// probe a service (an error, a panic in the factory or the probe, an
    /// unknown name) becomes an unhealthy result for that service; it never
    /// affects the others.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn health_check(&self, names: &[String]) -> BTreeMap<String, HealthCheckResult> {
        let permits = Arc::new(Semaphore::new(self.config.probe_concurrency.max(1)));
        let mut results = BTreeMap::new();
        let mut pending = Vec::with_capacity(names.len());

        for name in names {
            let constructed = panic::catch_unwind(AssertUnwindSafe(|| self.get(name)));
            let client = match constructed {
                Ok(Ok(client)) => client,
                Ok(Err(e)) => {
                    warn!("Health check for {} skipped: {}", name, e);
                    results.insert(name.clone(), HealthCheckResult::failed(name.as_str(), e.to_string()));
                    continue;
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!("Factory for {} panicked: {}", name, message);
                    results.insert(
                        name.clone(),
                        HealthCheckResult::failed(
                            name.as_str(),
                            format!("client construction panicked: {}", message),
                        ),
                    );
                    continue;
                }
            };

            let permits = Arc::clone(&permits);
            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                client.probe().await
            });
            pending.push((name.clone(), handle));
        }

        for (name, handle) in pending {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    warn!("Health probe for {} failed: {}", name, e);
                    HealthCheckResult::failed(name.as_str(), e.to_string())
                }
                Err(join_error) => {
                    warn!("Health probe for {} aborted: {}", name, join_error);
                    HealthCheckResult::failed(
                        name.as_str(),
                        format!("probe task aborted: {}", join_error),
                    )
                }
            };
            results.insert(name, result);
        }

        results
    }

    fn factory(&self, name: &str) -> Option<Arc<dyn ServiceFactory>> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, factory)| Arc::clone(factory))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthScheme, Credential};
    use crate::client::HttpServiceClient;
    use crate::config::ServiceDescriptor;
    use crate::traits::ProbeSpec;

    fn make(name: &'static str) -> impl Fn() -> Result<Arc<dyn ServiceClient>> + Send + Sync + 'static {
        move || {
            let descriptor = ServiceDescriptor::new(name, "https://example.invalid", AuthScheme::Bearer);
            Ok(Arc::new(HttpServiceClient::new(
                descriptor,
                Credential::anonymous(AuthScheme::Bearer),
                ProbeSpec::get("/health"),
            )?))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ServiceRegistry::new();

        assert!(!registry.has("alpha"));

        registry.register("alpha", make("alpha"));

        assert!(registry.has("alpha"));
        assert!(!registry.is_instantiated("alpha"));
        assert!(registry.list().contains(&"alpha".to_string()));
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let registry = ServiceRegistry::new();
        registry.register("zeta", make("zeta"));
        registry.register("alpha", make("alpha"));
        registry.register("mid", make("mid"));
        registry.register("zeta", make("zeta"));

        assert_eq!(registry.list(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_get_memoizes() {
        let registry = ServiceRegistry::new();
        registry.register("alpha", make("alpha"));

        let first = registry.get("alpha").unwrap();
        let second = registry.get("alpha").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.is_instantiated("alpha"));
        assert_eq!(first.name(), "alpha");
    }

    #[test]
    fn test_unknown_service_is_configuration_error() {
        let registry = ServiceRegistry::new();

        let err = registry.get("unknown").err().unwrap();
        assert!(matches!(err, Error::UnknownService(ref name) if name == "unknown"));
        assert!(err.is_configuration());
        assert!(!registry.is_instantiated("unknown"));
    }

    #[test]
    fn test_failing_factory_caches_nothing() {
        let registry = ServiceRegistry::new();
        registry.register("broken", || Err(Error::config("missing base url")));

        assert!(registry.get("broken").is_err());
        assert!(!registry.is_instantiated("broken"));
    }

    #[test]
    fn test_zero_probe_concurrency_rejected() {
        let result = ServiceRegistry::with_config(RegistryConfig { probe_concurrency: 0 });
        assert!(result.is_err());
    }
}
