use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use hostshell_core::config::HostConfig;
use hostshell_core::error::{HostError, Result};
use hostshell_core::remote::{CompositionRuntime, RemoteId, RemoteModule, RuntimePlugin};

use super::{RemoteRegistry, run_error_load_hooks};

/// Composition runtime that fetches each remote's entry bundle over HTTP.
///
/// The bundle itself is not executed; a successful fetch makes the
/// registered component for the id available.
pub struct HttpRuntime {
    client: reqwest::Client,
    config: HostConfig,
    registry: RemoteRegistry,
    plugins: Vec<Arc<dyn RuntimePlugin>>,
}

impl HttpRuntime {
    pub fn new(config: HostConfig, registry: RemoteRegistry) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HostError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            registry,
            plugins: Vec::new(),
        })
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn RuntimePlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Entry bundle URL for `id`, from the configured endpoint of its scope.
    pub fn entry_url(&self, id: &RemoteId) -> Result<String> {
        self.config
            .endpoint(id.scope())
            .map(|endpoint| endpoint.entry_url())
            .ok_or_else(|| {
                HostError::remote_load(
                    id.as_str(),
                    format!("no endpoint configured for '{}'", id.scope()),
                )
            })
    }

    async fn fetch_entry(&self, id: &RemoteId) -> Result<()> {
        let url = self.entry_url(id)?;
        tracing::debug!("[Runtime] Fetching entry bundle {}", url);

        self.client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| match HostError::from(e) {
                HostError::RemoteLoad { reason, .. } => {
                    HostError::remote_load(id.as_str(), reason)
                }
                other => other,
            })?;

        Ok(())
    }
}

#[async_trait]
impl CompositionRuntime for HttpRuntime {
    async fn load_remote(&self, id: &RemoteId) -> Result<RemoteModule> {
        match self.fetch_entry(id).await {
            Ok(()) => self.registry.instantiate(id),
            Err(error) => run_error_load_hooks(&self.plugins, id, error),
        }
    }
}
