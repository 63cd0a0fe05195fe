//! Delete path

use super::{ETCDADM, NODEADM, binding, install_helpers};
use crate::context::Context;
use crate::error::CctlError;
use objects::{DEFAULT_NAMESPACE, Machine};
use tracing::info;

/// Reset the machine's host and forget the machine
///
/// Masters also leave etcd; their member and API endpoint are dropped from the
/// cluster status. The provisioned machine is released for reuse.
pub async fn delete_machine(ctx: &mut Context<'_>, name: &str) -> Result<(), CctlError> {
    let machine = ctx.machine(name)?;
    let exec = ctx.connect(&machine).await?;
    install_helpers(ctx.settings, exec.as_ref(), &machine).await?;

    info!("Resetting node on {}", name);
    exec.run_checked(&format!("{} reset", NODEADM)).await?;

    if machine.is_master() {
        info!("Removing {} from etcd", name);
        exec.run_checked(&format!("{} reset", ETCDADM)).await?;
        if let Some(mut cluster) = ctx.find_cluster() {
            if let Some(member) = &machine.status.etcd_member {
                cluster.status.etcd_members.remove(member);
            }
            if let Some(host) = machine.ssh_host() {
                cluster.status.remove_api_endpoints_for(host);
            }
            ctx.store.update_status(&cluster)?;
        }
    }

    binding::release(ctx.store, &machine)?;
    ctx.store.delete::<Machine>(DEFAULT_NAMESPACE, name)?;
    info!("Deleted machine {}", name);
    Ok(())
}
