//! Provisioning actuator
//!
//! Takes a declared machine to a running master or node, and back down again.
//!
//! Both paths share a preamble: open a session to the bound host and install
//! the declared versions of the etcd and node installers. Masters then receive
//! the cluster's CAs, bring up or join etcd, and run `nodeadm init`; nodes fetch
//! the bootstrap token and run `nodeadm join`. Every remote step is fail-fast
//! and the store only records what a host has reported.

pub mod binding;
mod delete;
mod master;
mod node;
pub mod nodeadm_config;

pub use delete::delete_machine;
pub(crate) use master::install_etcd_ca;

use crate::context::Context;
use crate::error::CctlError;
use crate::settings::Settings;
use objects::{Machine, Object};
use ssh_client::{RemoteExecutor, shell_quote};
use tracing::info;

/// Where helpers are installed
pub const BIN_DIR: &str = "/opt/bin";
/// Etcd installer
pub const ETCDADM: &str = "/opt/bin/etcdadm";
/// Node installer
pub const NODEADM: &str = "/opt/bin/nodeadm";
/// Kubernetes admin tool, installed by the node installer
pub const KUBEADM: &str = "/opt/bin/kubeadm";
/// Etcd client wrapper, installed by the etcd installer
pub const ETCDCTL: &str = "/opt/bin/etcdctl.sh";
/// Node installer configuration
pub const NODEADM_CONFIG_PATH: &str = "/etc/nodeadm.yaml";

/// Etcd CA certificate and key on masters
pub const ETCD_CA_CERT_PATH: &str = "/etc/etcd/pki/ca.crt";
pub const ETCD_CA_KEY_PATH: &str = "/etc/etcd/pki/ca.key";
/// Kubernetes CA certificate and key on masters
pub const API_SERVER_CA_CERT_PATH: &str = "/etc/kubernetes/pki/ca.crt";
pub const API_SERVER_CA_KEY_PATH: &str = "/etc/kubernetes/pki/ca.key";
/// Front-proxy CA certificate and key on masters
pub const FRONT_PROXY_CA_CERT_PATH: &str = "/etc/kubernetes/pki/front-proxy-ca.crt";
pub const FRONT_PROXY_CA_KEY_PATH: &str = "/etc/kubernetes/pki/front-proxy-ca.key";
/// Service-account signing key pair on masters
pub const SERVICE_ACCOUNT_KEY_PATH: &str = "/etc/kubernetes/pki/sa.key";
pub const SERVICE_ACCOUNT_PUB_PATH: &str = "/etc/kubernetes/pki/sa.pub";

/// Deploy the machine named `name`, which must already be bound
pub async fn create_machine(ctx: &mut Context<'_>, name: &str) -> Result<(), CctlError> {
    let machine = ctx.machine(name)?;
    let cluster = ctx.cluster()?;
    cluster.validate_for_deploy()?;

    let exec = ctx.connect(&machine).await?;
    install_helpers(ctx.settings, exec.as_ref(), &machine).await?;

    if machine.is_master() {
        master::deploy(ctx, exec.as_ref(), &machine).await?;
    } else {
        node::deploy(ctx, exec.as_ref(), &machine).await?;
    }
    info!("Machine {} is ready", name);
    Ok(())
}

/// Download the machine's etcd and node installer versions into [`BIN_DIR`]
pub(crate) async fn install_helpers(
    settings: &Settings,
    exec: &dyn RemoteExecutor,
    machine: &Machine,
) -> Result<(), CctlError> {
    let versions = &machine.spec.component_versions;
    exec.mkdir_all(BIN_DIR, 0o755).await?;
    for (tool, version) in [
        ("etcdadm", versions.etcdadm_version.as_str()),
        ("nodeadm", versions.nodeadm_version.as_str()),
    ] {
        let url = settings.artifact_url(tool, version);
        let staging = format!("/tmp/{}", tool);
        let target = format!("{}/{}", BIN_DIR, tool);
        info!("Installing {} {} on {}", tool, version, machine.name());
        exec.run_checked(&format!("curl -fsSL {} -o {}", shell_quote(&url), staging))
            .await?;
        exec.move_file(&staging, &target).await?;
        exec.run_checked(&format!("chmod +x {}", target)).await?;
    }
    Ok(())
}
