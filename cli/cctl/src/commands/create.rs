//! `cctl create ...`

use super::Session;
use crate::actuator::{self, binding};
use crate::cli::{ClusterArgs, CreateCommand, CredentialArgs, HostArgs, MachineArgs, ProvisionedMachineArgs, Role};
use crate::context::Context;
use crate::error::CctlError;
use crate::settings::Settings;
use objects::{
    Cluster, ClusterNetworkingConfig, ClusterProviderSpec, ClusterSpec, DEFAULT_NAMESPACE, Machine, MachineRole,
    MachineSpec, Object, ProvisionedMachine, ProvisionedMachineSpec, SSH_CREDENTIAL_SECRET, Secret, SshConfig,
    SshCredential, VipConfiguration,
};
use ssh_client::Connector;
use state::ObjectStore;
use std::fs;
use tracing::info;

/// Common names of the generated CAs
const ETCD_CA_COMMON_NAME: &str = "etcd-ca";
const API_SERVER_CA_COMMON_NAME: &str = "kubernetes";
const FRONT_PROXY_CA_COMMON_NAME: &str = "front-proxy-ca";

pub async fn run(command: CreateCommand, settings: &Settings, connector: &dyn Connector) -> Result<(), CctlError> {
    let mut session = Session::open(&settings.state_path)?;
    let result = match command {
        CreateCommand::Credential(args) => credential(&mut session.store, &args),
        CreateCommand::Secrets => secrets(&mut session.store),
        CreateCommand::Cluster(args) => cluster(&mut session.store, &args),
        CreateCommand::ProvisionedMachine(args) => provisioned_machine(&mut session.store, &args).map(|_| ()),
        CreateCommand::Machine(args) => machine(&mut session.store, &args, settings, connector).await,
    };
    session.close(result)
}

/// Store the SSH login used for every host
pub(crate) fn credential(store: &mut ObjectStore, args: &CredentialArgs) -> Result<(), CctlError> {
    let private_key = fs::read_to_string(&args.private_key).map_err(|source| CctlError::Io {
        path: args.private_key.display().to_string(),
        source,
    })?;
    ssh_client::parse_private_key(&private_key)?;

    let credential = SshCredential {
        username: args.user.clone(),
        private_key,
    };
    store.create(credential.into_secret(SSH_CREDENTIAL_SECRET))?;
    info!("Created credential for user {}", args.user);
    Ok(())
}

/// Generate the cluster's CAs, service-account key pair and empty bootstrap token
///
/// Secret names come from the cluster when one is declared. Nothing is created
/// if any of them already exists.
pub(crate) fn secrets(store: &mut ObjectStore) -> Result<(), CctlError> {
    let names = store
        .list::<Cluster>(DEFAULT_NAMESPACE)
        .into_iter()
        .next()
        .map(|cluster| cluster.spec.provider_spec)
        .unwrap_or_default();

    for name in [
        &names.etcd_ca_secret,
        &names.api_server_ca_secret,
        &names.front_proxy_ca_secret,
        &names.service_account_key_secret,
        &names.bootstrap_token_secret,
    ] {
        if store.contains::<Secret>(DEFAULT_NAMESPACE, name) {
            return Err(CctlError::AlreadyExists(format!("secret {}", name)));
        }
    }

    let generated = [
        pki::ca_secret(&names.etcd_ca_secret, ETCD_CA_COMMON_NAME)?,
        pki::ca_secret(&names.api_server_ca_secret, API_SERVER_CA_COMMON_NAME)?,
        pki::ca_secret(&names.front_proxy_ca_secret, FRONT_PROXY_CA_COMMON_NAME)?,
        pki::service_account_secret(&names.service_account_key_secret)?,
        pki::bootstrap_token_secret(&names.bootstrap_token_secret),
    ];
    for secret in generated {
        info!("Created secret {}", secret.name());
        store.create(secret)?;
    }
    Ok(())
}

/// Declare the cluster; only one may exist
pub(crate) fn cluster(store: &mut ObjectStore, args: &ClusterArgs) -> Result<(), CctlError> {
    if let Some(existing) = store.list::<Cluster>(DEFAULT_NAMESPACE).first() {
        return Err(CctlError::AlreadyExists(format!("cluster {}", existing.name())));
    }

    let mut cluster_network = ClusterNetworkingConfig::new(&args.service_network, &args.pod_network);
    cluster_network.service_domain.clone_from(&args.service_domain);
    let provider_spec = ClusterProviderSpec {
        vip_configuration: args.vip.as_ref().map(|ip| VipConfiguration {
            ip: ip.clone(),
            router_id: args.router_id,
            network_interface: args.vip_interface.clone(),
        }),
        ..ClusterProviderSpec::default()
    };
    let cluster = Cluster::new(
        args.name.clone(),
        ClusterSpec {
            cluster_network,
            provider_spec,
        },
    );
    cluster.validate_for_deploy()?;

    store.create(cluster)?;
    info!("Created cluster {}", args.name);
    Ok(())
}

/// Register a reachable host under its IP
pub(crate) fn provisioned_machine(
    store: &mut ObjectStore,
    args: &ProvisionedMachineArgs,
) -> Result<ProvisionedMachine, CctlError> {
    let pm = store.create(new_provisioned_machine(&args.ip, &args.host)?)?;
    info!("Created provisioned machine {}", pm.name());
    Ok(pm)
}

fn new_provisioned_machine(ip: &str, host: &HostArgs) -> Result<ProvisionedMachine, CctlError> {
    for key in &host.public_keys {
        ssh_client::parse_public_key(key)?;
    }
    let ssh_config = SshConfig {
        port: host.port,
        public_keys: host.public_keys.clone(),
        ..SshConfig::new(ip)
    };
    Ok(ProvisionedMachine::new(
        ip,
        ProvisionedMachineSpec {
            ssh_config,
            vip_network_interface: host.vip_interface.clone(),
        },
    ))
}

/// Declare a machine, bind it to a host and deploy it
async fn machine(
    store: &mut ObjectStore,
    args: &MachineArgs,
    settings: &Settings,
    connector: &dyn Connector,
) -> Result<(), CctlError> {
    let name = declare_machine(store, args)?;
    let mut ctx = Context::new(store, connector, settings);
    actuator::create_machine(&mut ctx, &name).await
}

/// Bind a new machine to a host and return its name
///
/// With `--ip` the host is registered on the fly if unknown; otherwise the
/// first free, compatible host is taken.
pub(crate) fn declare_machine(store: &mut ObjectStore, args: &MachineArgs) -> Result<String, CctlError> {
    let cluster = store
        .list::<Cluster>(DEFAULT_NAMESPACE)
        .into_iter()
        .next()
        .ok_or_else(|| CctlError::NotFound("no cluster declared; run `cctl create cluster` first".to_string()))?;
    cluster.validate_for_deploy()?;

    let role = match args.role {
        Role::Master => MachineRole::Master,
        Role::Node => MachineRole::Node,
    };
    if let Some(ip) = &args.ip {
        if !store.contains::<ProvisionedMachine>(DEFAULT_NAMESPACE, ip) {
            store.create(new_provisioned_machine(ip, &args.host)?)?;
            info!("Registered provisioned machine {}", ip);
        }
    }
    let pm = binding::select(store, &cluster, role, args.ip.as_deref())?;

    let credential = &pm.spec.ssh_config.credential_secret;
    if !store.contains::<Secret>(DEFAULT_NAMESPACE, credential) {
        return Err(CctlError::NotFound(format!(
            "credential secret {}; run `cctl create credential` first",
            credential
        )));
    }

    let name = args
        .name
        .clone()
        .or_else(|| args.ip.clone())
        .unwrap_or_else(|| pm.name().to_string());

    let mut spec = MachineSpec::with_role(role);
    let versions = &args.versions;
    spec.versions.kubelet.clone_from(&versions.kubernetes_version);
    if role == MachineRole::Master {
        spec.versions.control_plane = Some(versions.kubernetes_version.clone());
    }
    let components = &mut spec.component_versions;
    components.kubernetes_version.clone_from(&versions.kubernetes_version);
    components.nodeadm_version.clone_from(&versions.nodeadm_version);
    components.etcdadm_version.clone_from(&versions.etcdadm_version);
    components.etcd_version.clone_from(&versions.etcd_version);
    components.cni_version.clone_from(&versions.cni_version);
    components.flannel_version.clone_from(&versions.flannel_version);
    components.keepalived_version.clone_from(&versions.keepalived_version);

    let machine = binding::bind(store, Machine::new(name.clone(), spec), pm)?;
    info!("Declared {} {}", role, machine.name());
    Ok(name)
}
