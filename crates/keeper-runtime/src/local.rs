//! Daemon-less runtime backed by the JSON state index.
//!
//! Every operation reloads the index, so handles never observe stale
//! records and tasks are always looked up fresh.

use std::path::{Path, PathBuf};

use keeper_common::context::Context;
use keeper_common::error::{KeeperError, Result};
use keeper_common::manifest::ContainerConfig;
use keeper_common::types::{ContainerId, ContainerState, Image};

use crate::handle::{ContainerHandle, ContainerInfo, Task, UpdateOpt};
use crate::state::{load_state, save_state};

/// Runtime that records containers in a state file and controls their
/// tasks with signals.
#[derive(Debug, Clone)]
pub struct LocalRuntime {
    state_file: PathBuf,
}

impl LocalRuntime {
    /// Opens the runtime over the given state index.
    #[must_use]
    pub fn open(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
        }
    }

    /// Returns the state index path.
    #[must_use]
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Records a new container from its configuration.
    ///
    /// With `pid`, the existing process becomes the container's running
    /// task; without it the container is `Created` and has no task.
    ///
    /// # Errors
    ///
    /// Returns an error if `pid` is 0, a container with the same ID
    /// exists, or the state index cannot be written.
    pub fn create(
        &self,
        ctx: &Context,
        config: &ContainerConfig,
        image: &Image,
        pid: Option<u32>,
    ) -> Result<LocalContainer<'_>> {
        ctx.check("create")?;
        config.validate()?;
        if pid == Some(0) {
            return Err(KeeperError::Config {
                message: format!("container {}: pid 0 cannot be attached as a task", config.id),
            });
        }
        let mut state = load_state(&self.state_file)?;
        if state.containers.iter().any(|c| c.id == config.id) {
            return Err(KeeperError::Config {
                message: format!("container {} already exists", config.id),
            });
        }
        state.containers.push(ContainerInfo {
            id: config.id.clone(),
            image: image.name.clone(),
            state: if pid.is_some() {
                ContainerState::Running
            } else {
                ContainerState::Created
            },
            pid,
            labels: config.labels.clone(),
            current_config: Some(config.clone()),
            previous_config: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            updated_at: None,
        });
        save_state(&self.state_file, &state)?;
        tracing::info!(id = %config.id, image = %image.name, ?pid, "container created");
        Ok(LocalContainer {
            runtime: self,
            id: config.id.clone(),
        })
    }

    /// Returns a handle to an existing container.
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::NotFound` if no such container exists.
    pub fn container(&self, ctx: &Context, id: &ContainerId) -> Result<LocalContainer<'_>> {
        ctx.check("container")?;
        let _ = self.record(id)?;
        Ok(LocalContainer {
            runtime: self,
            id: id.clone(),
        })
    }

    /// Lists all containers.
    ///
    /// # Errors
    ///
    /// Returns an error if the state index cannot be read.
    pub fn containers(&self, ctx: &Context) -> Result<Vec<ContainerInfo>> {
        ctx.check("list")?;
        Ok(load_state(&self.state_file)?.containers)
    }

    /// Discards a container record.
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::NotFound` if no such container exists.
    pub fn remove(&self, ctx: &Context, id: &ContainerId) -> Result<()> {
        ctx.check("remove")?;
        let mut state = load_state(&self.state_file)?;
        let before = state.containers.len();
        state.containers.retain(|c| c.id != *id);
        if state.containers.len() == before {
            return Err(not_found("container", id));
        }
        save_state(&self.state_file, &state)?;
        tracing::info!(id = %id, "container record discarded");
        Ok(())
    }

    fn record(&self, id: &ContainerId) -> Result<ContainerInfo> {
        load_state(&self.state_file)?
            .containers
            .into_iter()
            .find(|c| c.id == *id)
            .ok_or_else(|| not_found("container", id))
    }

    /// Loads, mutates a copy of, and commits one record.
    fn modify<F>(&self, id: &ContainerId, f: F) -> Result<()>
    where
        F: FnOnce(&mut ContainerInfo) -> Result<()>,
    {
        let mut state = load_state(&self.state_file)?;
        let slot = state
            .containers
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| not_found("container", id))?;
        let mut draft = slot.clone();
        f(&mut draft)?;
        *slot = draft;
        save_state(&self.state_file, &state)
    }
}

fn not_found(kind: &'static str, id: &ContainerId) -> KeeperError {
    KeeperError::NotFound {
        kind,
        id: id.to_string(),
    }
}

/// Handle to one container of a [`LocalRuntime`].
#[derive(Debug, Clone)]
pub struct LocalContainer<'a> {
    runtime: &'a LocalRuntime,
    id: ContainerId,
}

impl ContainerHandle for LocalContainer<'_> {
    fn id(&self) -> &ContainerId {
        &self.id
    }

    fn task(&self, ctx: &Context) -> Result<Box<dyn Task + '_>> {
        ctx.check("task")?;
        let record = self.runtime.record(&self.id)?;
        let pid = match (record.state.has_task(), record.pid) {
            (true, Some(pid)) if crate::process::is_alive(pid) => pid,
            _ => return Err(not_found("task", &self.id)),
        };
        tracing::debug!(id = %self.id, pid, state = %record.state, "task loaded");
        Ok(Box::new(LocalTask {
            runtime: self.runtime,
            id: self.id.clone(),
            pid,
        }))
    }

    fn update(&self, ctx: &Context, opts: &[UpdateOpt]) -> Result<()> {
        ctx.check("update")?;
        self.runtime.modify(&self.id, |record| {
            for opt in opts {
                opt.apply(record)?;
            }
            record.updated_at = Some(chrono::Utc::now().to_rfc3339());
            Ok(())
        })?;
        tracing::info!(id = %self.id, options = opts.len(), "container updated");
        Ok(())
    }

    fn info(&self, ctx: &Context) -> Result<ContainerInfo> {
        ctx.check("info")?;
        self.runtime.record(&self.id)
    }
}

/// Live task of a [`LocalContainer`].
#[derive(Debug)]
pub struct LocalTask<'a> {
    runtime: &'a LocalRuntime,
    id: ContainerId,
    pid: u32,
}

impl LocalTask<'_> {
    fn transition(&self, from: ContainerState, to: ContainerState) -> Result<()> {
        self.runtime.modify(&self.id, |record| {
            if record.state != from {
                return Err(KeeperError::Runtime {
                    message: format!("task {} is {}, expected {from}", self.id, record.state),
                });
            }
            record.state = to;
            Ok(())
        })
    }

    fn expect_state(&self, expected: ContainerState) -> Result<()> {
        let state = self.runtime.record(&self.id)?.state;
        if state == expected {
            Ok(())
        } else {
            Err(KeeperError::Runtime {
                message: format!("task {} is {state}, expected {expected}", self.id),
            })
        }
    }
}

impl Task for LocalTask<'_> {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn status(&self, ctx: &Context) -> Result<ContainerState> {
        ctx.check("status")?;
        Ok(self.runtime.record(&self.id)?.state)
    }

    fn pause(&self, ctx: &Context) -> Result<()> {
        ctx.check("pause")?;
        // Record first so that no error is returned once the process is stopped.
        self.transition(ContainerState::Running, ContainerState::Paused)?;
        if let Err(e) = crate::process::freeze(self.pid) {
            if let Err(revert) = self.transition(ContainerState::Paused, ContainerState::Running) {
                tracing::error!(id = %self.id, pid = self.pid, error = %revert, "cannot revert record after failed freeze");
            }
            return Err(e);
        }
        tracing::info!(id = %self.id, pid = self.pid, "task paused");
        Ok(())
    }

    fn resume(&self, ctx: &Context) -> Result<()> {
        ctx.check("resume")?;
        self.expect_state(ContainerState::Paused)?;
        crate::process::thaw(self.pid)?;
        self.transition(ContainerState::Paused, ContainerState::Running)?;
        tracing::info!(id = %self.id, pid = self.pid, "task resumed");
        Ok(())
    }
}
