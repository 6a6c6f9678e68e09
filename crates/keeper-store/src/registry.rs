//! Service registry.
//!
//! Records which services each container publishes so that clients can
//! discover them. Entries are keyed by `(container id, service name)`.

use std::path::{Path, PathBuf};

use keeper_common::error::{KeeperError, Result};
use keeper_common::manifest::Service;
use keeper_common::types::ContainerId;
use serde::{Deserialize, Serialize};

/// Service discovery backend.
pub trait ServiceRegistry {
    /// Registers (or replaces) a container's service.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached.
    fn register(&self, id: &ContainerId, name: &str, service: &Service) -> Result<()>;

    /// Removes a container's service.
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::NotFound` if no such entry exists, or an
    /// error if the registry cannot be reached.
    fn deregister(&self, id: &ContainerId, name: &str) -> Result<()>;
}

/// One registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Container publishing the service.
    pub container_id: ContainerId,
    /// Service name.
    pub name: String,
    /// Service definition.
    pub service: Service,
}

/// Registry backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    /// Opens the registry at `path`, creating its parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| KeeperError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        Ok(Self { path })
    }

    /// Returns the registry file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists all registrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry file cannot be read or parsed.
    pub fn entries(&self) -> Result<Vec<RegistryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| KeeperError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Lists the registrations of one container.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry file cannot be read or parsed.
    pub fn services_of(&self, id: &ContainerId) -> Result<Vec<RegistryEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.container_id == *id)
            .collect())
    }

    /// Replaces the registry file through a sibling temporary file.
    fn write_entries(&self, entries: &[RegistryEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| KeeperError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| KeeperError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl ServiceRegistry for FileRegistry {
    fn register(&self, id: &ContainerId, name: &str, service: &Service) -> Result<()> {
        let mut entries = self.entries()?;
        entries.retain(|e| !(e.container_id == *id && e.name == name));
        entries.push(RegistryEntry {
            container_id: id.clone(),
            name: name.to_string(),
            service: service.clone(),
        });
        self.write_entries(&entries)?;
        tracing::info!(id = %id, service = name, port = service.port, "service registered");
        Ok(())
    }

    fn deregister(&self, id: &ContainerId, name: &str) -> Result<()> {
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|e| !(e.container_id == *id && e.name == name));
        if entries.len() == before {
            return Err(KeeperError::NotFound {
                kind: "service",
                id: format!("{id}/{name}"),
            });
        }
        self.write_entries(&entries)?;
        tracing::info!(id = %id, service = name, "service deregistered");
        Ok(())
    }
}
