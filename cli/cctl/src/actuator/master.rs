//! Master path

use super::nodeadm_config;
use super::{
    API_SERVER_CA_CERT_PATH, API_SERVER_CA_KEY_PATH, ETCD_CA_CERT_PATH, ETCD_CA_KEY_PATH,
    FRONT_PROXY_CA_CERT_PATH, FRONT_PROXY_CA_KEY_PATH, NODEADM, NODEADM_CONFIG_PATH,
    SERVICE_ACCOUNT_KEY_PATH, SERVICE_ACCOUNT_PUB_PATH,
};
use crate::context::Context;
use crate::error::CctlError;
use crate::etcd;
use objects::{
    ApiEndpoint, Cluster, Machine, Object, PRIVATE_KEY_KEY, PUBLIC_KEY_KEY, Secret, TLS_CERT_KEY,
    TLS_KEY_KEY,
};
use ssh_client::RemoteExecutor;
use tracing::{debug, info};

const CERT_MODE: u32 = 0o644;
const KEY_MODE: u32 = 0o600;

/// One secret key and where it goes on a master
struct Placement {
    key: &'static str,
    path: &'static str,
    mode: u32,
}

const fn placement(key: &'static str, path: &'static str, mode: u32) -> Placement {
    Placement { key, path, mode }
}

const CA_PLACEMENTS: [[Placement; 2]; 3] = [
    [
        placement(TLS_CERT_KEY, ETCD_CA_CERT_PATH, CERT_MODE),
        placement(TLS_KEY_KEY, ETCD_CA_KEY_PATH, KEY_MODE),
    ],
    [
        placement(TLS_CERT_KEY, API_SERVER_CA_CERT_PATH, CERT_MODE),
        placement(TLS_KEY_KEY, API_SERVER_CA_KEY_PATH, KEY_MODE),
    ],
    [
        placement(TLS_CERT_KEY, FRONT_PROXY_CA_CERT_PATH, CERT_MODE),
        placement(TLS_KEY_KEY, FRONT_PROXY_CA_KEY_PATH, KEY_MODE),
    ],
];

const SERVICE_ACCOUNT_PLACEMENTS: [Placement; 2] = [
    placement(PRIVATE_KEY_KEY, SERVICE_ACCOUNT_KEY_PATH, KEY_MODE),
    placement(PUBLIC_KEY_KEY, SERVICE_ACCOUNT_PUB_PATH, CERT_MODE),
];

pub(super) async fn deploy(
    ctx: &mut Context<'_>,
    exec: &dyn RemoteExecutor,
    machine: &Machine,
) -> Result<(), CctlError> {
    let cluster = ctx.cluster()?;
    install_cluster_secrets(ctx, exec, &cluster).await?;

    let machine = etcd::init_or_join(ctx, exec, machine).await?;

    let config = nodeadm_config::master(&cluster, &machine)?;
    exec.place_file(
        NODEADM_CONFIG_PATH,
        KEY_MODE,
        nodeadm_config::render(&config)?.as_bytes(),
    )
    .await?;
    info!("Running nodeadm init on {}", machine.name());
    exec.run_checked(&format!("{} init --cfg {}", NODEADM, NODEADM_CONFIG_PATH))
        .await?;

    let host = machine.ssh_host().unwrap_or(machine.name());
    let endpoint = ApiEndpoint::derive(host, cluster.api_bind_port()?)?;
    let mut cluster = ctx.cluster()?;
    cluster.status.add_api_endpoint(endpoint.clone());
    ctx.store.update_status(&cluster)?;
    info!("Recorded API endpoint {}", endpoint.url());
    Ok(())
}

/// Copy the CA bundles and service-account key pair onto a master
///
/// Secrets that are missing or still empty are skipped.
async fn install_cluster_secrets(
    ctx: &Context<'_>,
    exec: &dyn RemoteExecutor,
    cluster: &Cluster,
) -> Result<(), CctlError> {
    let provider = &cluster.spec.provider_spec;
    let ca_names = [
        &provider.etcd_ca_secret,
        &provider.api_server_ca_secret,
        &provider.front_proxy_ca_secret,
    ];
    for (name, placements) in ca_names.into_iter().zip(CA_PLACEMENTS.iter()) {
        place_secret(ctx, exec, name, placements).await?;
    }
    place_secret(
        ctx,
        exec,
        &provider.service_account_key_secret,
        &SERVICE_ACCOUNT_PLACEMENTS,
    )
    .await
}

async fn place_secret(
    ctx: &Context<'_>,
    exec: &dyn RemoteExecutor,
    name: &str,
    placements: &[Placement],
) -> Result<(), CctlError> {
    let Some(secret) = ctx.populated_secret(name) else {
        debug!("Secret {} not present yet, skipping", name);
        return Ok(());
    };
    write_secret(exec, &secret, placements).await
}

async fn write_secret(
    exec: &dyn RemoteExecutor,
    secret: &Secret,
    placements: &[Placement],
) -> Result<(), CctlError> {
    for placement in placements {
        exec.place_file(placement.path, placement.mode, secret.get(placement.key)?)
            .await?;
        debug!("Placed {} of {} at {}", placement.key, secret.name(), placement.path);
    }
    Ok(())
}

/// Copy the etcd CA onto a master
pub(crate) async fn install_etcd_ca(exec: &dyn RemoteExecutor, secret: &Secret) -> Result<(), CctlError> {
    write_secret(exec, secret, &CA_PLACEMENTS[0]).await
}
