//! Persistent state management.
//!
//! Maintains a local JSON index of all containers and their current
//! records, enabling daemon-less lifecycle management.

use std::path::Path;

use keeper_common::error::{KeeperError, Result};
use serde::{Deserialize, Serialize};

use crate::handle::ContainerInfo;

/// On-disk state index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    /// All known containers.
    pub containers: Vec<ContainerInfo>,
}

/// Loads the state index from disk.
///
/// A missing file is an empty index.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_state(path: &Path) -> Result<StateFile> {
    tracing::debug!(path = %path.display(), "loading state index");
    if !path.exists() {
        return Ok(StateFile::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| KeeperError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Persists the state index to disk atomically.
///
/// Writes a sibling temporary file and renames it over `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_state(path: &Path, state: &StateFile) -> Result<()> {
    tracing::debug!(path = %path.display(), containers = state.containers.len(), "saving state index");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| KeeperError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| KeeperError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| KeeperError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
