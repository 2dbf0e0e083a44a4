//! Configuration service implementation.
//!
//! Loads `HostConfig` from `config.toml`, writing a default file on first run,
//! then applies the `REMOTE*_URL` environment overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use hostshell_core::config::{HostConfig, RemoteEndpoint};
use hostshell_core::error::Result;
use hostshell_core::remote::REMOTES;

use crate::paths::HostPaths;

/// Configuration service that loads and caches the host configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<HostConfig>>>,
}

impl ConfigService {
    /// Uses the default `config.toml` location.
    pub fn new(paths: &HostPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A file that cannot be parsed is reported, not replaced.
    pub fn get_config(&self) -> Result<HostConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = Self::load_or_create(&self.path)?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    fn load_or_create(path: &Path) -> Result<HostConfig> {
        if !path.exists() {
            let default_config = HostConfig::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, toml::to_string_pretty(&default_config)?)?;
            tracing::info!("[Config] Wrote default configuration to {:?}", path);
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)?;
        let mut config: HostConfig = toml::from_str(&content)?;
        fill_missing_endpoints(&mut config);
        Ok(config)
    }
}

/// Restores default endpoints for remotes absent from the file.
fn fill_missing_endpoints(config: &mut HostConfig) {
    let defaults = HostConfig::default();
    for descriptor in REMOTES {
        if !config.remotes.contains_key(descriptor.scope)
            && let Some(endpoint) = defaults.endpoint(descriptor.scope)
        {
            config
                .remotes
                .insert(descriptor.scope.to_string(), endpoint.clone());
        }
    }
}

/// Applies `REMOTE1_URL`-style overrides from `lookup`.
pub fn apply_env_overrides<F>(config: &mut HostConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for descriptor in REMOTES {
        if let Some(url) = lookup(descriptor.url_env).filter(|url| !url.trim().is_empty()) {
            tracing::debug!(
                "[Config] {} overridden by {}",
                descriptor.scope,
                descriptor.url_env
            );
            config.remotes.insert(
                descriptor.scope.to_string(),
                RemoteEndpoint {
                    url: url.trim().to_string(),
                },
            );
        }
    }
}
