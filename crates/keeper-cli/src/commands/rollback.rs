//! `kpr rollback` — Restore a container's previous config.

use clap::Args;
use keeper_common::types::ContainerId;
use keeper_runtime::handle::ContainerHandle;
use keeper_update::plan::plan_rollback;

use super::Host;

/// Arguments for the `rollback` command.
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Container to roll back.
    pub id: String,
}

/// Executes the `rollback` command.
///
/// # Errors
///
/// Returns an error if the container has no previous config or a change
/// fails.
pub fn execute(host: &Host, args: &RollbackArgs) -> anyhow::Result<()> {
    let ctx = host.context();
    let id = ContainerId::new(args.id.as_str());
    let info = host.runtime.container(&ctx, &id)?.info(&ctx)?;
    host.apply(&ctx, &id, plan_rollback(&info)?)?;
    println!("{id} rolled back");
    Ok(())
}
