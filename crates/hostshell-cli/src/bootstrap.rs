use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use hostshell_application::{CompositionGateway, RemoteResolver, SharedStateStore};
use hostshell_core::config::HostConfig;
use hostshell_core::remote::{CompositionRuntime, REMOTES};
use hostshell_core::state::PersistenceAdapter;
use hostshell_infrastructure::{
    ConfigService, HostPaths, HttpRuntime, JsonFileStorage, MemoryStorage, OfflineFallbackPlugin,
    StaticRuntime, UnavailableStorage,
};

use crate::remotes;

/// Command-line choices that shape the composition root.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    pub config_path: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
    pub ephemeral: bool,
    /// Start with every remote unreachable.
    pub offline: bool,
    /// Probe remote entry bundles over HTTP instead of loading in-process.
    pub http: bool,
    /// Base directory replacing the platform config/data directories.
    pub base_dir: Option<PathBuf>,
}

pub struct HostBootstrap {
    pub config: HostConfig,
    pub store: Arc<SharedStateStore>,
    pub gateway: Arc<CompositionGateway>,
    /// Present when remotes load in-process, so outages can be toggled.
    pub static_runtime: Option<Arc<StaticRuntime>>,
}

impl HostBootstrap {
    /// Wires storage, runtime, store and gateway, then hydrates and starts
    /// the gateway's watcher.
    pub async fn build(options: BootstrapOptions) -> Result<Self> {
        let paths = HostPaths::new(options.base_dir.clone());
        let config_service = match &options.config_path {
            Some(path) => ConfigService::with_path(path.clone()),
            None => ConfigService::new(&paths)?,
        };
        let mut config = config_service.get_config()?;
        tracing::info!("[Bootstrap] Configuration loaded from {:?}", config_service.path());

        if let Some(dir) = &options.state_dir {
            config.storage.state_dir = Some(dir.clone());
        }
        if options.ephemeral {
            config.storage.ephemeral = true;
        }

        let adapter = select_storage(&config, &paths);
        tracing::info!("[Bootstrap] Persistence: {}", adapter.describe());

        let (runtime, static_runtime): (Arc<dyn CompositionRuntime>, Option<Arc<StaticRuntime>>) =
            if options.http {
                let runtime = HttpRuntime::new(config.clone(), remotes::registry())?
                    .with_plugin(Arc::new(OfflineFallbackPlugin));
                tracing::info!("[Bootstrap] Loading remotes over HTTP");
                (Arc::new(runtime), None)
            } else {
                let runtime = Arc::new(
                    StaticRuntime::new(remotes::registry())
                        .with_plugin(Arc::new(OfflineFallbackPlugin)),
                );
                if options.offline {
                    for descriptor in REMOTES {
                        runtime.take_offline(descriptor.scope, "connection refused");
                    }
                    tracing::info!("[Bootstrap] All remotes start offline");
                }
                (runtime.clone(), Some(runtime))
            };

        let store = SharedStateStore::create(adapter);
        let resolver =
            RemoteResolver::new(runtime).with_timeout(config.composition.resolve_timeout());
        let gateway = CompositionGateway::new(
            store.clone(),
            resolver,
            config.composition.capability_set(),
        );

        store.hydrate().await?;
        gateway.watch();

        tracing::info!(
            "[Bootstrap] Host ready: store={}, state={:?}, capabilities={:?}",
            store.instance_id(),
            gateway.state(),
            gateway.capabilities()
        );

        Ok(Self {
            config,
            store,
            gateway,
            static_runtime,
        })
    }

    /// Stops the gateway and flushes pending writes.
    pub async fn shutdown(&self) {
        self.gateway.shutdown();
        self.store.dispose().await;
    }
}

/// Picks the persistence medium for `config`.
///
/// Falls back to `UnavailableStorage` when no state directory can be
/// resolved or created.
pub fn select_storage(config: &HostConfig, paths: &HostPaths) -> Arc<dyn PersistenceAdapter> {
    if config.storage.ephemeral {
        return Arc::new(MemoryStorage::new());
    }

    let dir = match &config.storage.state_dir {
        Some(dir) => dir.clone(),
        None => match paths.data_dir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("[Bootstrap] No state directory ({}); state is not persisted", e);
                return Arc::new(UnavailableStorage);
            }
        },
    };

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            "[Bootstrap] Cannot create state directory {:?} ({}); state is not persisted",
            dir,
            e
        );
        return Arc::new(UnavailableStorage);
    }

    Arc::new(JsonFileStorage::new(&dir))
}
