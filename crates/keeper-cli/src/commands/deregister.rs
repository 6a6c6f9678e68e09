//! `kpr deregister` — Remove one of a container's service registrations.

use clap::Args;
use keeper_common::types::ContainerId;
use keeper_update::plan::plan_deregister;

use super::Host;

/// Arguments for the `deregister` command.
#[derive(Args, Debug)]
pub struct DeregisterArgs {
    /// Container owning the service.
    pub id: String,

    /// Service name.
    pub service: String,
}

/// Executes the `deregister` command.
///
/// # Errors
///
/// Returns an error if the registration does not exist or the registry
/// cannot be written.
pub fn execute(host: &Host, args: DeregisterArgs) -> anyhow::Result<()> {
    let ctx = host.context();
    let id = ContainerId::new(args.id);
    host.apply(&ctx, &id, plan_deregister(args.service))?;
    Ok(())
}
