//! Fail-fast application of ordered changes.

use keeper_common::context::Context;
use keeper_common::error::Result;
use keeper_runtime::handle::ContainerHandle;

use crate::change::{Change, Collaborators};
use crate::quiesce::pause_and_run;

/// Applies change lists to containers.
///
/// Changes run strictly in order, each with the container's task paused.
/// The first failure stops the sequence and is returned verbatim; changes
/// already applied stay applied. Callers must serialize updates to the
/// same container.
#[derive(Debug, Clone, Copy)]
pub struct Orchestrator<'a> {
    deps: Collaborators<'a>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator that hands `deps` to every change.
    #[must_use]
    pub const fn new(deps: Collaborators<'a>) -> Self {
        Self { deps }
    }

    /// Applies `changes` to `container` in order.
    ///
    /// # Errors
    ///
    /// Returns the first failing change's error; later changes are not
    /// attempted.
    pub fn apply_changes(
        &self,
        ctx: &Context,
        container: &dyn ContainerHandle,
        changes: Vec<Change>,
    ) -> Result<()> {
        let id = container.id();
        let total = changes.len();
        for (step, change) in changes.into_iter().enumerate() {
            let step = step + 1;
            tracing::info!(id = %id, step, total, change = change.kind(), "applying change");
            if let Err(err) = pause_and_run(ctx, container, || {
                change.update(ctx, &self.deps, container)
            }) {
                tracing::error!(id = %id, step, total, change = change.kind(), error = %err, "change failed, stopping");
                return Err(err);
            }
        }
        tracing::info!(id = %id, total, "changes applied");
        Ok(())
    }
}
