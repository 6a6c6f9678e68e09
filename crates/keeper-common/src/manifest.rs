//! Declarative container configuration.
//!
//! A [`ContainerConfig`] is the desired state of one workload: the image it
//! runs, its process, mounts, published services, and resource limits. It
//! is persisted by the config store and embedded in the runtime record as
//! the current (and previous) configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, Result};
use crate::types::{ContainerId, ResourceLimits};

/// Desired configuration of a managed container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Container identifier.
    pub id: ContainerId,
    /// Image reference the container runs.
    pub image: String,
    /// Process arguments, argv[0] first.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Bind and tmpfs mounts.
    #[serde(default)]
    pub mounts: Vec<Mount>,
    /// Services published to the registry, keyed by name.
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
    /// Resource limits.
    #[serde(default)]
    pub resources: ResourceLimits,
    /// Network mode.
    #[serde(default)]
    pub network: NetworkMode,
    /// Free-form labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// A filesystem mount inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Host path (or `tmpfs` for tmpfs mounts).
    pub source: String,
    /// Absolute path inside the container.
    pub destination: String,
    /// Mount kind.
    #[serde(default)]
    pub kind: MountKind,
    /// Mount options such as `ro` or `rbind`.
    #[serde(default)]
    pub options: Vec<String>,
}

/// Kind of a [`Mount`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountKind {
    /// Host path bound into the container.
    #[default]
    Bind,
    /// Memory-backed filesystem.
    Tmpfs,
}

/// A service endpoint registered on behalf of the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Port the service listens on.
    pub port: u16,
    /// Registry labels (tags).
    #[serde(default)]
    pub labels: Vec<String>,
    /// Health check interval in seconds, if checked.
    #[serde(default)]
    pub check_interval_secs: Option<u64>,
}

/// Network mode of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// No networking.
    #[default]
    None,
    /// Share the host network namespace.
    Host,
    /// Bridged network with its own address.
    Bridge,
}

impl ContainerConfig {
    /// Creates a minimal configuration for `id` running `image`.
    #[must_use]
    pub fn new(id: ContainerId, image: impl Into<String>) -> Self {
        Self {
            id,
            image: image.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            mounts: Vec::new(),
            services: BTreeMap::new(),
            resources: ResourceLimits::default(),
            network: NetworkMode::default(),
            labels: BTreeMap::new(),
        }
    }

    /// Reads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`ContainerConfig::validate`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read(path).map_err(|e| KeeperError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_slice(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::Config` for an id that fails
    /// [`ContainerId::validate`], an empty image, or a mount whose
    /// destination is not absolute.
    pub fn validate(&self) -> Result<()> {
        self.id.validate()?;
        if self.image.is_empty() {
            return Err(KeeperError::Config {
                message: format!("container {} has no image", self.id),
            });
        }
        if let Some(m) = self.mounts.iter().find(|m| !m.destination.starts_with('/')) {
            return Err(KeeperError::Config {
                message: format!(
                    "container {}: mount destination {} is not absolute",
                    self.id, m.destination
                ),
            });
        }
        Ok(())
    }

    /// Iterates over the bind mounts.
    pub fn bind_mounts(&self) -> impl Iterator<Item = &Mount> {
        self.mounts.iter().filter(|m| m.kind == MountKind::Bind)
    }
}
