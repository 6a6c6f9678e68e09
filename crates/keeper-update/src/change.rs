//! Mutation kinds applied to a container.

use keeper_common::context::Context;
use keeper_common::error::Result;
use keeper_common::manifest::ContainerConfig;
use keeper_image::resolver::{ImageResolver, ResolveOptions};
use keeper_runtime::handle::{ContainerHandle, UpdateOpt};
use keeper_store::config::ConfigStore;
use keeper_store::registry::ServiceRegistry;

/// External services a change may call.
///
/// Passed in by the orchestrator so that a [`Change`] carries only its
/// payload.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Image lookup and fetch.
    pub images: &'a dyn ImageResolver,
    /// Service discovery.
    pub registry: &'a dyn ServiceRegistry,
    /// Durable configuration.
    pub store: &'a dyn ConfigStore,
    /// How image changes resolve their reference.
    pub resolve: ResolveOptions,
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("resolve", &self.resolve)
            .finish_non_exhaustive()
    }
}

/// One unit of mutation. Built right before use and consumed by one
/// application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Resolve `reference` (fetching if allowed) and upgrade the container
    /// to it.
    ImageUpdate {
        /// Target image reference.
        reference: String,
    },
    /// Remove the container's `name` service from the registry.
    Deregister {
        /// Service name.
        name: String,
    },
    /// Rewrite the container's effective configuration, keeping the old
    /// one as its previous configuration.
    Config(Box<ContainerConfig>),
    /// Persist the configuration to the config store only.
    Files(Box<ContainerConfig>),
}

impl Change {
    /// Short name of the change kind, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ImageUpdate { .. } => "image",
            Self::Deregister { .. } => "deregister",
            Self::Config(_) => "config",
            Self::Files(_) => "files",
        }
    }

    /// Applies the change to `container`.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error unchanged: image resolution or
    /// lookup, registry I/O, store I/O, or the runtime update.
    pub fn update(
        &self,
        ctx: &Context,
        deps: &Collaborators<'_>,
        container: &dyn ContainerHandle,
    ) -> Result<()> {
        match self {
            Self::ImageUpdate { reference } => {
                let image = deps.images.resolve(ctx, reference, &deps.resolve)?;
                container.update(ctx, &[UpdateOpt::Upgrade(image)])
            }
            Self::Deregister { name } => deps.registry.deregister(container.id(), name),
            Self::Config(config) => {
                let image = deps.images.get(ctx, &config.image)?;
                container.update(
                    ctx,
                    &[
                        UpdateOpt::SetPreviousConfig,
                        UpdateOpt::WithConfig(config.clone(), image),
                    ],
                )
            }
            Self::Files(config) => deps.store.write(ctx, config),
        }
    }
}
