//! Machine to provisioned-machine binding
//!
//! A provisioned machine is reserved by at most one machine. The reservation
//! lives in the provisioned machine's `status.machineRef`; the machine names
//! its provisioned machine in `spec.provisionedMachineName` and carries a copy
//! of its SSH config in status.

use crate::error::CctlError;
use objects::{Cluster, DEFAULT_NAMESPACE, Machine, MachineRole, Object, ProvisionedMachine};
use state::ObjectStore;
use tracing::{debug, info};

/// Whether `pm` can host a machine with `role` in `cluster`
///
/// Masters of a cluster with a VIP need an interface to announce it on, either
/// per host or cluster-wide.
pub fn is_compatible(pm: &ProvisionedMachine, cluster: &Cluster, role: MachineRole) -> bool {
    match (&cluster.spec.provider_spec.vip_configuration, role) {
        (Some(vip), MachineRole::Master) => {
            pm.spec.vip_network_interface.is_some() || vip.network_interface.is_some()
        }
        _ => true,
    }
}

/// Pick the provisioned machine for a new machine
///
/// An explicit name must be unbound and compatible. Otherwise the first
/// unbound, compatible one (name-ascending) is chosen.
pub fn select(
    store: &ObjectStore,
    cluster: &Cluster,
    role: MachineRole,
    requested: Option<&str>,
) -> Result<ProvisionedMachine, CctlError> {
    if let Some(name) = requested {
        let pm = store.get::<ProvisionedMachine>(DEFAULT_NAMESPACE, name)?;
        if let Some(owner) = &pm.status.machine_ref {
            return Err(CctlError::AlreadyExists(format!(
                "provisioned machine {} is already bound to machine {}",
                name, owner
            )));
        }
        if !is_compatible(&pm, cluster, role) {
            return Err(CctlError::Validation(format!(
                "provisioned machine {} has no VIP network interface",
                name
            )));
        }
        return Ok(pm);
    }

    store
        .list::<ProvisionedMachine>(DEFAULT_NAMESPACE)
        .into_iter()
        .find(|pm| !pm.is_bound() && is_compatible(pm, cluster, role))
        .ok_or_else(|| {
            CctlError::NotFound(format!("no unbound provisioned machine can host a {}", role))
        })
}

/// Create `machine` bound to `pm`
pub fn bind(
    store: &mut ObjectStore,
    mut machine: Machine,
    mut pm: ProvisionedMachine,
) -> Result<Machine, CctlError> {
    if let Some(owner) = &pm.status.machine_ref {
        return Err(CctlError::AlreadyExists(format!(
            "provisioned machine {} is already bound to machine {}",
            pm.name(),
            owner
        )));
    }

    machine.spec.provisioned_machine_name = Some(pm.name().to_string());
    machine.status.ssh_config = Some(pm.spec.ssh_config.clone());
    if machine.is_master() {
        machine
            .status
            .vip_network_interface
            .clone_from(&pm.spec.vip_network_interface);
    }
    let machine = store.create(machine)?;

    pm.status.machine_ref = Some(machine.name().to_string());
    store.update_status(&pm)?;
    info!("Bound machine {} to provisioned machine {}", machine.name(), pm.name());
    Ok(machine)
}

/// Clear the reservation `machine` holds, if any
pub fn release(store: &mut ObjectStore, machine: &Machine) -> Result<(), CctlError> {
    let Some(name) = &machine.spec.provisioned_machine_name else {
        return Ok(());
    };
    let Some(mut pm) = store.find::<ProvisionedMachine>(DEFAULT_NAMESPACE, name) else {
        debug!("Provisioned machine {} is gone, nothing to release", name);
        return Ok(());
    };
    if pm.status.machine_ref.as_deref() == Some(machine.name()) {
        pm.status.machine_ref = None;
        store.update_status(&pm)?;
        debug!("Released provisioned machine {}", name);
    }
    Ok(())
}
