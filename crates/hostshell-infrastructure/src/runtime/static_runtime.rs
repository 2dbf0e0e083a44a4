use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use hostshell_core::error::{HostError, Result};
use hostshell_core::remote::{
    CompositionRuntime, RemoteComponent, RemoteId, RemoteModule, RuntimePlugin,
};

use super::{RemoteRegistry, run_error_load_hooks};

/// In-process composition runtime.
///
/// Remotes can be taken offline at runtime to exercise the failure path.
pub struct StaticRuntime {
    registry: RemoteRegistry,
    latency: Option<Duration>,
    plugins: Vec<Arc<dyn RuntimePlugin>>,
    /// Scopes whose entry bundle is currently unreachable, with the reason.
    outages: RwLock<HashMap<String, String>>,
}

impl StaticRuntime {
    pub fn new(registry: RemoteRegistry) -> Self {
        Self {
            registry,
            latency: None,
            plugins: Vec::new(),
            outages: RwLock::new(HashMap::new()),
        }
    }

    /// Delay applied to every load, to make the loading state observable.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn RuntimePlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn register(&mut self, id: RemoteId, component: Arc<dyn RemoteComponent>) {
        self.registry.register(id, component);
    }

    /// Makes every module of `scope` fail to fetch with `reason`.
    pub fn take_offline(&self, scope: &str, reason: impl Into<String>) {
        self.outages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(scope.to_string(), reason.into());
    }

    pub fn bring_online(&self, scope: &str) {
        self.outages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(scope);
    }

    fn fetch_entry(&self, id: &RemoteId) -> Result<()> {
        let outages = self.outages.read().unwrap_or_else(PoisonError::into_inner);
        match outages.get(id.scope()) {
            Some(reason) => Err(HostError::remote_load(id.as_str(), reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CompositionRuntime for StaticRuntime {
    async fn load_remote(&self, id: &RemoteId) -> Result<RemoteModule> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.fetch_entry(id) {
            Ok(()) => self.registry.instantiate(id),
            Err(error) => run_error_load_hooks(&self.plugins, id, error),
        }
    }
}
