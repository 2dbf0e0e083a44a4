//! Unified path management for hostshell files.
//!
//! ```text
//! ~/.config/hostshell/         # Config directory
//! ├── config.toml              # Host configuration
//! └── logs/                    # Application logs
//!     └── hostshell.log.YYYY-MM-DD
//!
//! ~/.local/share/hostshell/    # Data directory
//! └── hostshell.global-state.json
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "hostshell";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for hostshell_core::HostError {
    fn from(err: PathError) -> Self {
        hostshell_core::HostError::config(err.to_string())
    }
}

/// Path resolution for hostshell.
///
/// With a base directory every path lives under it (tests, portable
/// installs); without one the platform config/data directories are used.
#[derive(Debug, Clone, Default)]
pub struct HostPaths {
    base: Option<PathBuf>,
}

impl HostPaths {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// Returns the hostshell configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.join("config")),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the hostshell data directory, where the state blob lives.
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}
