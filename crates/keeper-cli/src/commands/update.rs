//! `kpr update` — Apply a new config file to a container.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use keeper_common::manifest::ContainerConfig;
use keeper_common::types::ContainerId;
use keeper_runtime::handle::ContainerHandle;
use keeper_update::plan::plan_update;

use super::Host;

/// Arguments for the `update` command.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Container to update.
    pub id: String,

    /// Path to the desired JSON config.
    pub config: PathBuf,
}

/// Executes the `update` command.
///
/// Writes the config to the store, applies it to the runtime, then
/// deregisters services the new config no longer publishes.
///
/// # Errors
///
/// Returns an error if the config is invalid or any change fails.
pub fn execute(host: &Host, args: UpdateArgs) -> anyhow::Result<()> {
    let ctx = host.context();
    let id = ContainerId::new(args.id);
    let desired = ContainerConfig::from_file(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    anyhow::ensure!(
        desired.id == id,
        "config {} describes container {}, not {id}",
        args.config.display(),
        desired.id
    );
    let previous = host.runtime.container(&ctx, &id)?.info(&ctx)?.current_config;
    host.apply(&ctx, &id, plan_update(previous.as_ref(), desired))?;
    println!("{id} updated");
    Ok(())
}
