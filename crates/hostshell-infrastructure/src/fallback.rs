//! Offline fallback for remotes whose entry bundle cannot be fetched.
//!
//! Registered as a runtime plugin; the runtime calls it from its failure path
//! and mounts whatever module it returns in place of the real one.

use std::sync::Arc;

use hostshell_core::error::Result;
use hostshell_core::remote::{
    LoadErrorArgs, RemoteComponent, RemoteId, RemoteModule, RuntimePlugin, SharedStateHandle,
};

pub const OFFLINE_PLUGIN_NAME: &str = "host-remote-offline-runtime-plugin";

/// Stand-in component naming the unreachable remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOfflineFallback {
    remote_name: String,
    reason: Option<String>,
}

impl RemoteOfflineFallback {
    pub fn new(id: &str, reason: Option<String>) -> Self {
        Self {
            remote_name: RemoteId::new(id).display_name(),
            reason,
        }
    }

    pub fn message(&self) -> String {
        match &self.reason {
            Some(reason) => format!(
                "Remote Unavailable: {} failed to load ({})",
                self.remote_name, reason
            ),
            None => format!("Remote Unavailable: {} failed to load", self.remote_name),
        }
    }
}

impl RemoteComponent for RemoteOfflineFallback {
    fn name(&self) -> &str {
        "RemoteOfflineFallback"
    }

    fn render(&self, _shared: &dyn SharedStateHandle) -> Result<String> {
        Ok(self.message())
    }
}

/// Runtime plugin producing `RemoteOfflineFallback` modules.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFallbackPlugin;

impl OfflineFallbackPlugin {
    /// Builds the substitute module for a failed load.
    pub fn create_offline_module(&self, args: LoadErrorArgs<'_>) -> RemoteModule {
        let reason = args.error.and_then(|error| match error.load_reason() {
            Some(reason) => Some(reason.to_string()),
            None if error.is_remote_load() => None,
            None => Some(error.to_string()),
        });

        RemoteModule::new(
            RemoteId::new(args.id),
            Arc::new(RemoteOfflineFallback::new(args.id, reason)),
        )
    }
}

impl RuntimePlugin for OfflineFallbackPlugin {
    fn name(&self) -> &str {
        OFFLINE_PLUGIN_NAME
    }

    fn error_load_remote(&self, args: LoadErrorArgs<'_>) -> Option<RemoteModule> {
        Some(self.create_offline_module(args))
    }
}
