//! `kpr create` — Register a container from a config file.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use keeper_common::context::Context;
use keeper_common::manifest::ContainerConfig;
use keeper_image::resolver::ImageResolver;
use keeper_store::config::ConfigStore;
use keeper_store::registry::ServiceRegistry;

use super::Host;

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Path to the container's JSON config.
    pub config: PathBuf,

    /// PID of an already-running process to attach as the live task.
    #[arg(long)]
    pub pid: Option<u32>,
}

/// Executes the `create` command.
///
/// Resolves the image, records the container in the runtime, persists its
/// config, and registers its services.
///
/// # Errors
///
/// Returns an error if the config is invalid, the image cannot be
/// resolved, or any collaborator write fails. After a failed config write
/// or registration, the runtime record and the registrations made so far
/// are discarded; the stored config is left in place.
pub fn execute(host: &Host, args: CreateArgs) -> anyhow::Result<()> {
    let ctx = host.context();
    let config = ContainerConfig::from_file(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let image = host
        .images
        .resolve(&ctx, &config.image, &host.resolve_options())?;
    let _ = host.runtime.create(&ctx, &config, &image, args.pid)?;

    let mut registered = Vec::new();
    if let Err(err) = publish(host, &ctx, &config, &mut registered) {
        discard(host, &ctx, &config, &registered);
        return Err(err.into());
    }
    tracing::info!(id = %config.id, image = %image.name, "container ready");
    println!("{}", config.id);
    Ok(())
}

/// Persists the config and registers each service, noting what succeeded.
fn publish<'c>(
    host: &Host,
    ctx: &Context,
    config: &'c ContainerConfig,
    registered: &mut Vec<&'c str>,
) -> keeper_common::error::Result<()> {
    host.store.write(ctx, config)?;
    for (name, service) in &config.services {
        host.registry.register(&config.id, name, service)?;
        registered.push(name);
    }
    Ok(())
}

fn discard(host: &Host, ctx: &Context, config: &ContainerConfig, registered: &[&str]) {
    tracing::warn!(id = %config.id, "create failed, discarding container");
    for name in registered {
        if let Err(e) = host.registry.deregister(&config.id, name) {
            tracing::error!(id = %config.id, service = *name, error = %e, "cannot undo registration");
        }
    }
    if let Err(e) = host.runtime.remove(ctx, &config.id) {
        tracing::error!(id = %config.id, error = %e, "cannot discard runtime record");
    }
}
