//! Host configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer. Every section has
//! defaults so an empty or missing file yields a working host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::remote::REMOTES;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    pub storage: StorageConfig,
    /// Remote endpoints keyed by scope (`remote1`, `remote2`).
    pub remotes: BTreeMap<String, RemoteEndpoint>,
    pub composition: CompositionConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        let remotes = REMOTES
            .iter()
            .enumerate()
            .map(|(index, descriptor)| {
                (
                    descriptor.scope.to_string(),
                    RemoteEndpoint {
                        url: format!("http://localhost:{}", 3001 + index),
                    },
                )
            })
            .collect();

        Self {
            storage: StorageConfig::default(),
            remotes,
            composition: CompositionConfig::default(),
        }
    }
}

impl HostConfig {
    pub fn endpoint(&self, scope: &str) -> Option<&RemoteEndpoint> {
        self.remotes.get(scope)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the state blob. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Keep shared state in memory only.
    pub ephemeral: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RemoteEndpoint {
    /// Base URL the remote is served from.
    pub url: String,
}

impl RemoteEndpoint {
    /// Location of the remote's entry bundle.
    pub fn entry_url(&self) -> String {
        format!(
            "{}/_next/static/chunks/remoteEntry.js",
            self.url.trim_end_matches('/')
        )
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CompositionConfig {
    /// Whether mounted remotes may read and toggle the theme.
    pub share_theme: bool,
    /// Upper bound on a single remote resolution. `0` disables the bound.
    pub resolve_timeout_secs: u64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            share_theme: true,
            resolve_timeout_secs: 10,
        }
    }
}

impl CompositionConfig {
    pub fn capability_set(&self) -> CapabilitySet {
        if self.share_theme {
            CapabilitySet::NotificationsAndTheme
        } else {
            CapabilitySet::NotificationsOnly
        }
    }

    pub fn resolve_timeout(&self) -> Option<Duration> {
        (self.resolve_timeout_secs > 0).then(|| Duration::from_secs(self.resolve_timeout_secs))
    }
}

/// Which shared-state operations a mounted remote receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilitySet {
    NotificationsOnly,
    #[default]
    NotificationsAndTheme,
}

impl CapabilitySet {
    pub fn shares_theme(&self) -> bool {
        matches!(self, CapabilitySet::NotificationsAndTheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_remote() {
        let config = HostConfig::default();
        assert_eq!(config.endpoint("remote1").unwrap().url, "http://localhost:3001");
        assert_eq!(config.endpoint("remote2").unwrap().url, "http://localhost:3002");
        assert_eq!(
            config.composition.capability_set(),
            CapabilitySet::NotificationsAndTheme
        );
    }

    #[test]
    fn test_entry_url_trims_trailing_slash() {
        let endpoint = RemoteEndpoint {
            url: "https://cdn.example.com/app/".to_string(),
        };
        assert_eq!(
            endpoint.entry_url(),
            "https://cdn.example.com/app/_next/static/chunks/remoteEntry.js"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: HostConfig = toml::from_str(
            r#"
            [composition]
            share_theme = false
            "#,
        )
        .unwrap();
        assert_eq!(config.composition.capability_set(), CapabilitySet::NotificationsOnly);
        assert_eq!(config.composition.resolve_timeout(), Some(Duration::from_secs(10)));
        assert!(config.endpoint("remote1").is_some());
        assert!(!config.storage.ephemeral);
    }
}
