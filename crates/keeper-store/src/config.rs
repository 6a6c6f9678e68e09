//! Durable config store.

use std::path::{Path, PathBuf};

use keeper_common::context::Context;
use keeper_common::error::{KeeperError, Result};
use keeper_common::manifest::ContainerConfig;
use keeper_common::types::ContainerId;

/// Persists declarative configuration independently of the runtime.
pub trait ConfigStore {
    /// Writes a container's configuration, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not writable.
    fn write(&self, ctx: &Context, config: &ContainerConfig) -> Result<()>;

    /// Reads a container's configuration.
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::NotFound` if nothing is stored for `id`.
    fn read(&self, ctx: &Context, id: &ContainerId) -> Result<ContainerConfig>;
}

/// Parses a stored configuration document.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid configuration.
pub fn unmarshal_config(bytes: &[u8]) -> Result<ContainerConfig> {
    let config: ContainerConfig = serde_json::from_slice(bytes)?;
    config.validate()?;
    Ok(config)
}

/// Config store keeping one JSON file per container.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    root: PathBuf,
}

impl FileConfigStore {
    /// Opens or creates the store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| KeeperError::Io {
            path: root.clone(),
            source: e,
        })?;
        tracing::debug!(path = %root.display(), "config store opened");
        Ok(Self { root })
    }

    /// Returns the file path holding `id`'s configuration.
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::Config` if `id` would resolve outside the
    /// store root.
    pub fn config_path(&self, id: &ContainerId) -> Result<PathBuf> {
        id.validate()?;
        Ok(self.root.join(format!("{id}.json")))
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ConfigStore for FileConfigStore {
    fn write(&self, ctx: &Context, config: &ContainerConfig) -> Result<()> {
        ctx.check("config write")?;
        config.validate()?;
        let path = self.config_path(&config.id)?;
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(config)?;
        std::fs::write(&tmp, json).map_err(|e| KeeperError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| KeeperError::Io {
            path: path.clone(),
            source: e,
        })?;
        tracing::info!(id = %config.id, path = %path.display(), "config written");
        Ok(())
    }

    fn read(&self, ctx: &Context, id: &ContainerId) -> Result<ContainerConfig> {
        ctx.check("config read")?;
        let path = self.config_path(id)?;
        if !path.exists() {
            return Err(KeeperError::NotFound {
                kind: "config",
                id: id.to_string(),
            });
        }
        let bytes = std::fs::read(&path).map_err(|e| KeeperError::Io { path, source: e })?;
        unmarshal_config(&bytes)
    }
}
