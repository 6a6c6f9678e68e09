//! `kpr upgrade` — Move a container to a new image.

use clap::Args;
use keeper_common::types::ContainerId;
use keeper_update::plan::plan_upgrade;

use super::Host;

/// Arguments for the `upgrade` command.
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Container to upgrade.
    pub id: String,

    /// Image reference to upgrade to.
    pub reference: String,
}

/// Executes the `upgrade` command.
///
/// # Errors
///
/// Returns an error if the image cannot be resolved or the runtime
/// update fails.
pub fn execute(host: &Host, args: UpgradeArgs) -> anyhow::Result<()> {
    let ctx = host.context();
    let id = ContainerId::new(args.id);
    host.apply(&ctx, &id, plan_upgrade(args.reference.clone()))?;
    println!("{id} upgraded to {}", args.reference);
    Ok(())
}
