//! Container handle and task contracts.

use std::collections::BTreeMap;

use keeper_common::context::Context;
use keeper_common::error::{KeeperError, Result};
use keeper_common::manifest::ContainerConfig;
use keeper_common::types::{ContainerId, ContainerState, Image};
use serde::{Deserialize, Serialize};

/// Runtime record of a managed container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Unique identifier.
    pub id: ContainerId,
    /// Image reference the container currently runs.
    pub image: String,
    /// Current lifecycle state.
    pub state: ContainerState,
    /// PID of the task's init process (if any).
    pub pid: Option<u32>,
    /// Runtime labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Configuration currently in effect.
    #[serde(default)]
    pub current_config: Option<ContainerConfig>,
    /// Configuration in effect before the last config update.
    #[serde(default)]
    pub previous_config: Option<ContainerConfig>,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
    /// ISO-8601 timestamp of the last committed update.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A single mutation of a container's stored record.
///
/// Options passed together to [`ContainerHandle::update`] are applied in
/// order and committed only if all of them succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOpt {
    /// Point the container at a new image, preserving its identity.
    Upgrade(Image),
    /// Snapshot the current configuration as the previous one.
    SetPreviousConfig,
    /// Replace the current configuration and the image it resolved to.
    WithConfig(Box<ContainerConfig>, Image),
}

impl UpdateOpt {
    /// Applies this option to a record.
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::Config` if a new configuration belongs to a
    /// different container or fails validation.
    pub fn apply(&self, record: &mut ContainerInfo) -> Result<()> {
        match self {
            Self::Upgrade(image) => {
                record.image.clone_from(&image.name);
            }
            Self::SetPreviousConfig => {
                record.previous_config.clone_from(&record.current_config);
            }
            Self::WithConfig(config, image) => {
                if config.id != record.id {
                    return Err(KeeperError::Config {
                        message: format!(
                            "config for {} cannot be applied to container {}",
                            config.id, record.id
                        ),
                    });
                }
                config.validate()?;
                record.current_config = Some(config.as_ref().clone());
                record.image.clone_from(&image.name);
            }
        }
        Ok(())
    }
}

/// The runtime's live process for a container.
///
/// Handles are obtained fresh from [`ContainerHandle::task`] for every
/// operation and never cached.
pub trait Task {
    /// PID of the task's init process.
    fn pid(&self) -> u32;

    /// Returns the task's current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot report the state.
    fn status(&self, ctx: &Context) -> Result<ContainerState>;

    /// Freezes execution of the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is not running or cannot be frozen.
    fn pause(&self, ctx: &Context) -> Result<()>;

    /// Resumes execution of a paused task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is not paused or cannot be thawed.
    fn resume(&self, ctx: &Context) -> Result<()>;
}

/// Reference to a managed workload, borrowed from the runtime for the
/// duration of one call.
pub trait ContainerHandle {
    /// Container identifier.
    fn id(&self) -> &ContainerId;

    /// Looks up the container's live task.
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::NotFound` when the container has no task, or
    /// any other error if the lookup itself failed.
    fn task(&self, ctx: &Context) -> Result<Box<dyn Task + '_>>;

    /// Applies update options to the stored record as one unit.
    ///
    /// # Errors
    ///
    /// Returns an error if any option fails; nothing is committed then.
    fn update(&self, ctx: &Context, opts: &[UpdateOpt]) -> Result<()>;

    /// Returns a snapshot of the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn info(&self, ctx: &Context) -> Result<ContainerInfo>;
}
