//! Remote resolution.
//!
//! Wraps the composition runtime's loader so that every outcome, including
//! a panicking or hung loader, comes back as a `Resolution` value.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use hostshell_core::remote::{CompositionRuntime, RemoteId, RemoteModule};
use tokio::task::AbortHandle;

/// Outcome of resolving one remote.
#[derive(Debug, Clone)]
pub enum Resolution {
    Ready(RemoteModule),
    Failed(String),
}

pub struct RemoteResolver {
    runtime: Arc<dyn CompositionRuntime>,
    timeout: Option<Duration>,
}

impl RemoteResolver {
    pub fn new(runtime: Arc<dyn CompositionRuntime>) -> Self {
        Self {
            runtime,
            timeout: None,
        }
    }

    /// Bounds each resolution; a load still pending after `timeout` fails.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolves `id`. Never panics; failures come back as `Failed`.
    pub async fn resolve(&self, id: &RemoteId) -> Resolution {
        let runtime = self.runtime.clone();
        let task_id = id.clone();
        let mut handle = tokio::spawn(async move { runtime.load_remote(&task_id).await });
        // Dropping this future (e.g. on unmount) must not leave the load running
        let _abort = AbortOnDrop(handle.abort_handle());

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!("[Resolver] {} timed out after {:?}", id, limit);
                    return Resolution::Failed(format!("timed out after {:?}", limit));
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(module)) => {
                tracing::debug!("[Resolver] {} resolved to {}", id, module.component.name());
                Resolution::Ready(module)
            }
            Ok(Err(e)) => {
                tracing::warn!("[Resolver] {} failed: {}", id, e);
                Resolution::Failed(
                    e.load_reason()
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string()),
                )
            }
            Err(e) if e.is_panic() => {
                tracing::error!("[Resolver] Loader for {} panicked", id);
                Resolution::Failed("remote loader panicked".to_string())
            }
            Err(_) => Resolution::Failed("remote load was cancelled".to_string()),
        }
    }
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Placeholder shown while a remote resolves.
///
/// Stateless; it only names the remote being loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingPlaceholder {
    pub remote: RemoteId,
}

impl LoadingPlaceholder {
    pub fn new(remote: RemoteId) -> Self {
        Self { remote }
    }
}

impl fmt::Display for LoadingPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Loading {}...", self.remote.display_name())
    }
}
