//! Composition runtimes.
//!
//! - `StaticRuntime`: in-process registry, optional simulated latency and
//!   outages; used for demos and tests
//! - `HttpRuntime`: checks that each remote's entry bundle is reachable
//!   before instantiating it
//!
//! Both hand entry-bundle failures to their `RuntimePlugin`s, in
//! registration order; the first substitute module wins.

mod http_runtime;
mod static_runtime;

pub use http_runtime::HttpRuntime;
pub use static_runtime::StaticRuntime;

use std::collections::HashMap;
use std::sync::Arc;

use hostshell_core::error::{HostError, Result};
use hostshell_core::remote::{
    LoadErrorArgs, RemoteComponent, RemoteId, RemoteModule, RuntimePlugin,
};

/// Components the host can instantiate once a remote's bundle is available.
#[derive(Clone, Default)]
pub struct RemoteRegistry {
    components: HashMap<RemoteId, Arc<dyn RemoteComponent>>,
}

impl RemoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: RemoteId, component: Arc<dyn RemoteComponent>) {
        self.components.insert(id, component);
    }

    pub fn instantiate(&self, id: &RemoteId) -> Result<RemoteModule> {
        self.components
            .get(id)
            .map(|component| RemoteModule::new(id.clone(), component.clone()))
            .ok_or_else(|| {
                let module = id.module().unwrap_or("<none>");
                HostError::remote_load(
                    id.as_str(),
                    format!("module '{}' is not exposed by {}", module, id.scope()),
                )
            })
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Gives each plugin a chance to substitute a module for a failed load.
///
/// Returns the original error when no plugin handles it.
pub(crate) fn run_error_load_hooks(
    plugins: &[Arc<dyn RuntimePlugin>],
    id: &RemoteId,
    error: HostError,
) -> Result<RemoteModule> {
    tracing::warn!("[Runtime] Failed to load remote {}: {}", id, error);

    for plugin in plugins {
        let args = LoadErrorArgs {
            id: id.as_str(),
            error: Some(&error),
        };
        if let Some(module) = plugin.error_load_remote(args) {
            tracing::info!(
                "[Runtime] Plugin '{}' substituted a module for {}",
                plugin.name(),
                id
            );
            return Ok(module);
        }
    }

    Err(error)
}
