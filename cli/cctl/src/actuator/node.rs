//! Node path

use super::{KUBEADM, NODEADM, NODEADM_CONFIG_PATH, nodeadm_config};
use crate::context::Context;
use crate::error::CctlError;
use objects::{Cluster, DEFAULT_NAMESPACE, Machine, Object, Secret, TLS_KEY_KEY};
use pki::BootstrapToken;
use ssh_client::RemoteExecutor;
use tracing::{info, warn};

pub(super) async fn deploy(
    ctx: &mut Context<'_>,
    exec: &dyn RemoteExecutor,
    machine: &Machine,
) -> Result<(), CctlError> {
    let cluster = ctx.cluster()?;
    let endpoint = cluster.status.api_endpoints.first().cloned().ok_or_else(|| {
        CctlError::NotFound("no API endpoint recorded; create a master first".to_string())
    })?;
    let token = bootstrap_token(ctx, &cluster).await?;

    let config = nodeadm_config::node(machine, &endpoint, &token);
    exec.place_file(
        NODEADM_CONFIG_PATH,
        0o600,
        nodeadm_config::render(&config)?.as_bytes(),
    )
    .await?;
    info!("Joining {} through {}", machine.name(), endpoint.address());
    exec.run_checked(&format!("{} join --cfg {}", NODEADM, NODEADM_CONFIG_PATH))
        .await?;
    Ok(())
}

/// The stored bootstrap token, fetched from a ready master on first use
async fn bootstrap_token(ctx: &mut Context<'_>, cluster: &Cluster) -> Result<BootstrapToken, CctlError> {
    let name = &cluster.spec.provider_spec.bootstrap_token_secret;
    let mut secret = ctx.store.get::<Secret>(DEFAULT_NAMESPACE, name)?;
    if let Some(token) = BootstrapToken::from_secret(&secret)? {
        return Ok(token);
    }

    let master = ctx
        .masters()
        .into_iter()
        .find(|m| {
            m.ssh_host()
                .is_some_and(|host| cluster.status.api_endpoints.iter().any(|e| e.host == host))
        })
        .ok_or_else(|| CctlError::NotFound("no ready master to create a bootstrap token on".to_string()))?;

    info!("Creating bootstrap token on master {}", master.name());
    let exec = ctx.connect(&master).await?;
    let output = exec
        .run_checked(&format!("{} token create --print-join-command", KUBEADM))
        .await?;
    let token = BootstrapToken::parse_join_command(&output.stdout_lossy())?;
    verify_ca_pin(ctx, cluster, &token)?;

    token.apply_to(&mut secret);
    ctx.store.update(secret)?;
    Ok(token)
}

/// The token's CA pin must match the API server CA this tool distributed
fn verify_ca_pin(ctx: &Context<'_>, cluster: &Cluster, token: &BootstrapToken) -> Result<(), CctlError> {
    let name = &cluster.spec.provider_spec.api_server_ca_secret;
    let Some(secret) = ctx.populated_secret(name) else {
        warn!("Secret {} is empty, cannot check the CA hash of the bootstrap token", name);
        return Ok(());
    };
    let pin = pki::pin_of_private_key_pem(secret.get_str(TLS_KEY_KEY)?)?;
    if pin != token.ca_hash {
        return Err(CctlError::Validation(format!(
            "bootstrap token CA hash {} does not match secret {} ({})",
            token.ca_hash, name, pin
        )));
    }
    Ok(())
}
