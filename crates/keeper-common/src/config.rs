//! Global configuration model for Keeper.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::context::Context;
use crate::error::{KeeperError, Result};

/// Root configuration shared by the CLI and the file-backed collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    /// Base directory for Keeper state and data.
    pub data_dir: PathBuf,
    /// Path to the runtime state index.
    pub state_file: PathBuf,
    /// Directory of the durable config store.
    pub config_dir: PathBuf,
    /// Path to the service registry file.
    pub registry_file: PathBuf,
    /// Directory of the local image catalog.
    pub image_dir: PathBuf,
    /// Runtime namespace threaded through every call.
    pub namespace: String,
    /// Whether remote image sources are refused.
    pub offline: bool,
    /// Deadline for one CLI invocation, in seconds. Zero disables it.
    pub timeout_secs: u64,
}

impl KeeperConfig {
    /// Builds a configuration whose paths all live under `data_dir`.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            state_file: data_dir.join(constants::STATE_FILE_NAME),
            config_dir: data_dir.join(constants::CONFIG_DIR_NAME),
            registry_file: data_dir.join(constants::REGISTRY_FILE_NAME),
            image_dir: data_dir.join(constants::IMAGE_DIR_NAME),
            data_dir,
            namespace: constants::DEFAULT_NAMESPACE.to_string(),
            offline: false,
            timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Loads a configuration file, falling back to defaults when it does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| KeeperError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Returns a call context carrying this configuration's namespace and
    /// deadline.
    #[must_use]
    pub fn context(&self) -> Context {
        let ctx = Context::new(self.namespace.clone());
        if self.timeout_secs == 0 {
            ctx
        } else {
            ctx.with_timeout(Duration::from_secs(self.timeout_secs))
        }
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self::with_data_dir(constants::data_dir().clone())
    }
}
