//! Etcd lifecycle
//!
//! Brings etcd up on masters, takes snapshots and rebuilds the whole etcd
//! cluster from one. Masters are always handled one after another in
//! name order so that exactly one of them initializes a new cluster.
//!
//! A member enters the cluster's member set, and its machine's status, only
//! after the etcd installer has reported it with `etcdadm info`.

use crate::actuator::{ETCDADM, ETCDCTL, install_etcd_ca};
use crate::context::Context;
use crate::error::CctlError;
use objects::{EtcdMember, EtcdMemberSet, Machine, Object};
use ssh_client::{RemoteExecutor, shell_quote};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Where a snapshot being restored is staged on the first master
pub const RESTORE_SNAPSHOT_PATH: &str = "/tmp/etcd.snapshot";

/// Lists running API server containers
const API_SERVER_CONTAINERS: &str =
    "docker ps --filter name=k8s_kube-apiserver --filter status=running -q";

/// Start a new etcd cluster on `machine`, or join the existing one
///
/// Returns the machine with its observed member recorded.
pub async fn init_or_join(
    ctx: &mut Context<'_>,
    exec: &dyn RemoteExecutor,
    machine: &Machine,
) -> Result<Machine, CctlError> {
    let cluster = ctx.cluster()?;
    let version = &machine.spec.component_versions.etcd_version;
    let command = match cluster.status.etcd_members.first() {
        None => {
            info!("Initializing etcd on {}", machine.name());
            format!("{} init --version {}", ETCDADM, version)
        }
        Some(first) => {
            let endpoint = first.first_client_url()?;
            info!("Joining {} to etcd through {}", machine.name(), endpoint);
            format!("{} join {} --version {}", ETCDADM, shell_quote(endpoint), version)
        }
    };
    exec.run_checked(&command).await?;

    let member = read_member(exec).await?;
    record_member(ctx, machine.name(), member)
}

/// Parse what `etcdadm info` reports for the local member
async fn read_member(exec: &dyn RemoteExecutor) -> Result<EtcdMember, CctlError> {
    let output = exec.run_checked(&format!("{} info", ETCDADM)).await?;
    let member = EtcdMember::from_info_output(&output.stdout)?;
    debug!("Etcd member on {}: {} ({})", exec.host(), member.id, member.name);
    Ok(member)
}

/// Store `member` on the machine and in the cluster's member set
///
/// A member the machine reported earlier under another id is dropped from the
/// set.
fn record_member(ctx: &mut Context<'_>, machine_name: &str, member: EtcdMember) -> Result<Machine, CctlError> {
    let mut machine = ctx.machine(machine_name)?;
    let mut cluster = ctx.cluster()?;
    if let Some(previous) = &machine.status.etcd_member {
        if previous.id != member.id {
            cluster.status.etcd_members.remove(previous);
        }
    }
    cluster.status.etcd_members.insert(member.clone());
    machine.status.etcd_member = Some(member.clone());

    ctx.store.update_status(&cluster)?;
    let machine = ctx.store.update_status(&machine)?;
    info!("Recorded etcd member {} ({}) for {}", member.id, member.name, machine_name);
    Ok(machine)
}

/// Save a snapshot taken on the master named, or reached at, `ip` to `dest`
pub async fn snapshot(ctx: &Context<'_>, ip: &str, dest: &Path) -> Result<(), CctlError> {
    let machine = ctx
        .masters()
        .into_iter()
        .find(|m| m.name() == ip || m.ssh_host() == Some(ip))
        .ok_or_else(|| CctlError::NotFound(format!("no master named or reachable at {}", ip)))?;
    let exec = ctx.connect(&machine).await?;

    let remote = format!("/tmp/etcd-snapshot-{}.db", Uuid::new_v4());
    info!("Taking etcd snapshot on {}", machine.name());
    exec.run_checked(&format!("{} snapshot save {}", ETCDCTL, remote))
        .await?;
    let contents = exec.read_file(&remote).await;
    exec.remove(&remote).await?;
    let contents = contents?;

    fs::write(dest, &contents).map_err(|source| CctlError::Io {
        path: dest.display().to_string(),
        source,
    })?;
    info!("Wrote {} byte snapshot to {}", contents.len(), dest.display());
    Ok(())
}

/// Rebuild etcd on every master from the snapshot at `snapshot`
///
/// Every master is reset without contacting the (presumed dead) quorum, the
/// first master initializes from the snapshot and the rest join it. Running
/// API servers are then removed so they restart against the new cluster.
pub async fn recover(ctx: &mut Context<'_>, snapshot: &Path) -> Result<(), CctlError> {
    let contents = fs::read(snapshot).map_err(|source| CctlError::Io {
        path: snapshot.display().to_string(),
        source,
    })?;
    let cluster = ctx.cluster()?;
    let etcd_ca_name = &cluster.spec.provider_spec.etcd_ca_secret;
    let etcd_ca = ctx
        .populated_secret(etcd_ca_name)
        .ok_or_else(|| CctlError::NotFound(format!("etcd CA secret {}", etcd_ca_name)))?;
    let masters = ctx.masters();
    if masters.is_empty() {
        return Err(CctlError::NotFound("no master machines to recover".to_string()));
    }

    let mut sessions = Vec::with_capacity(masters.len());
    for machine in &masters {
        sessions.push(ctx.connect(machine).await?);
    }

    for (machine, exec) in masters.iter().zip(&sessions) {
        info!("Resetting etcd on {}", machine.name());
        exec.run_checked(&format!("{} reset --skip-remove-member", ETCDADM))
            .await?;
    }
    forget_members(ctx, &masters)?;

    for exec in &sessions {
        install_etcd_ca(exec.as_ref(), &etcd_ca).await?;
    }

    let (first, first_exec) = (&masters[0], sessions[0].as_ref());
    let version = &first.spec.component_versions.etcd_version;
    first_exec
        .write_file(RESTORE_SNAPSHOT_PATH, 0o600, &contents)
        .await?;
    info!("Restoring etcd on {} from {}", first.name(), snapshot.display());
    first_exec
        .run_checked(&format!(
            "{} init --snapshot {} --version {}",
            ETCDADM, RESTORE_SNAPSHOT_PATH, version
        ))
        .await?;
    first_exec.remove(RESTORE_SNAPSHOT_PATH).await?;
    let first_member = read_member(first_exec).await?;
    let endpoint = first_member.first_client_url()?.to_string();
    record_member(ctx, first.name(), first_member)?;

    for (machine, exec) in masters.iter().zip(&sessions).skip(1) {
        info!("Joining {} to etcd through {}", machine.name(), endpoint);
        exec.run_checked(&format!(
            "{} join {} --version {}",
            ETCDADM,
            shell_quote(&endpoint),
            machine.spec.component_versions.etcd_version
        ))
        .await?;
        let member = read_member(exec.as_ref()).await?;
        record_member(ctx, machine.name(), member)?;
    }

    for exec in &sessions {
        restart_api_server(exec.as_ref()).await?;
    }
    info!("Recovered etcd on {} masters", masters.len());
    Ok(())
}

/// Empty the member set and every master's recorded member
fn forget_members(ctx: &mut Context<'_>, masters: &[Machine]) -> Result<(), CctlError> {
    let mut cluster = ctx.cluster()?;
    cluster.status.etcd_members = EtcdMemberSet::default();
    ctx.store.update_status(&cluster)?;
    for machine in masters {
        let mut machine = ctx.machine(machine.name())?;
        machine.status.etcd_member = None;
        ctx.store.update_status(&machine)?;
    }
    Ok(())
}

/// Stop and remove the running API server containers so the kubelet restarts them
async fn restart_api_server(exec: &dyn RemoteExecutor) -> Result<(), CctlError> {
    let output = exec.run_checked(API_SERVER_CONTAINERS).await?;
    for id in output.stdout_lossy().split_whitespace() {
        info!("Restarting API server container {} on {}", id, exec.host());
        exec.run_checked(&format!("docker stop {}", shell_quote(id)))
            .await?;
        exec.run_checked(&format!("docker rm {}", shell_quote(id)))
            .await?;
    }
    Ok(())
}

