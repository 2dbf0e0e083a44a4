//! Composition runtime seam.
//!
//! The runtime is what actually fetches and instantiates a remote's entry
//! bundle. The host only consumes it through these traits.

use async_trait::async_trait;

use crate::error::{HostError, Result};
use crate::remote::component::RemoteModule;
use crate::remote::model::RemoteId;

/// Dynamic-loading primitive of the composition runtime.
#[async_trait]
pub trait CompositionRuntime: Send + Sync {
    /// Loads the module exposed under `id`.
    async fn load_remote(&self, id: &RemoteId) -> Result<RemoteModule>;
}

/// Arguments handed to `RuntimePlugin::error_load_remote`.
#[derive(Debug, Clone, Copy)]
pub struct LoadErrorArgs<'a> {
    pub id: &'a str,
    pub error: Option<&'a HostError>,
}

/// Hook invoked by a runtime when an entry bundle cannot be fetched.
pub trait RuntimePlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Produces a substitute module, or `None` to let the failure through.
    ///
    /// Called synchronously from the runtime's failure path.
    fn error_load_remote(&self, args: LoadErrorArgs<'_>) -> Option<RemoteModule>;
}
