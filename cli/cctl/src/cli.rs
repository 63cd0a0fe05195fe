//! Command line surface

use clap::{Args, Parser, Subcommand, ValueEnum};
use objects::versions;
use std::path::PathBuf;

/// Default root of helper downloads
pub const DEFAULT_ARTIFACT_BASE_URL: &str = "https://github.com/platform9";

/// Bootstrap and manage an on-prem Kubernetes cluster over SSH
#[derive(Debug, Parser)]
#[command(name = "cctl", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every command
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// State file
    #[arg(long, global = true, env = "CCTL_STATE", default_value = state::DEFAULT_STATE_PATH)]
    pub state: PathBuf,

    /// Log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Skip host key verification
    #[arg(long, global = true, env = "CCTL_INSECURE_IGNORE_HOST_KEY")]
    pub insecure_ignore_host_key: bool,

    /// Root URL helpers are downloaded from
    #[arg(long, global = true, env = "CCTL_ARTIFACT_BASE_URL", default_value = DEFAULT_ARTIFACT_BASE_URL)]
    pub artifact_base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an object
    #[command(subcommand)]
    Create(CreateCommand),

    /// Delete an object
    #[command(subcommand)]
    Delete(DeleteCommand),

    /// Show objects
    Get(GetArgs),

    /// Take a snapshot
    #[command(subcommand)]
    Snapshot(SnapshotCommand),

    /// Recover from a snapshot
    #[command(subcommand)]
    Recover(RecoverCommand),

    /// Bundle the state file and an etcd snapshot into an archive
    Backup(BackupArgs),

    /// Unpack an archive made by `backup`
    Restore(RestoreArgs),

    /// Bring the state file up to the current schema version
    Migrate,
}

#[derive(Debug, Subcommand)]
pub enum CreateCommand {
    /// Store the SSH login used to reach every host
    Credential(CredentialArgs),

    /// Generate the cluster CAs, service-account key and bootstrap token secret
    Secrets,

    /// Declare the cluster
    Cluster(ClusterArgs),

    /// Declare and deploy a master or node
    Machine(MachineArgs),

    /// Register a reachable host
    #[command(name = "provisionedmachine")]
    ProvisionedMachine(ProvisionedMachineArgs),
}

#[derive(Debug, Args)]
pub struct CredentialArgs {
    /// Login user
    #[arg(long)]
    pub user: String,

    /// File holding the PEM/OpenSSH private key
    #[arg(long)]
    pub private_key: PathBuf,
}

#[derive(Debug, Args)]
pub struct ClusterArgs {
    /// Cluster name
    #[arg(long, default_value = "cluster")]
    pub name: String,

    /// Service CIDR
    #[arg(long, default_value = "10.96.0.0/12")]
    pub service_network: String,

    /// Pod CIDR
    #[arg(long, default_value = "10.244.0.0/16")]
    pub pod_network: String,

    /// Service DNS domain
    #[arg(long, default_value = objects::DEFAULT_SERVICE_DOMAIN)]
    pub service_domain: String,

    /// Virtual IP announced by the masters
    #[arg(long)]
    pub vip: Option<String>,

    /// VRRP router id of the virtual IP
    #[arg(long, default_value_t = 0)]
    pub router_id: u8,

    /// Interface the virtual IP is announced on, when the same on every master
    #[arg(long, requires = "vip")]
    pub vip_interface: Option<String>,
}

/// Where a host is and how to reach it
#[derive(Debug, Clone, Args)]
pub struct HostArgs {
    /// SSH port
    #[arg(long, default_value_t = objects::DEFAULT_SSH_PORT)]
    pub port: u16,

    /// Accepted host public key, `authorized_keys` form; repeatable
    #[arg(long = "public-key")]
    pub public_keys: Vec<String>,

    /// Interface this host can announce the virtual IP on
    #[arg(long)]
    pub vip_interface: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProvisionedMachineArgs {
    /// Host IP; also the object's name
    #[arg(long)]
    pub ip: String,

    #[command(flatten)]
    pub host: HostArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Master,
    Node,
}

#[derive(Debug, Args)]
pub struct MachineArgs {
    /// Role of the machine
    #[arg(long, value_enum)]
    pub role: Role,

    /// Host IP; a provisioned machine is registered for it when missing.
    /// Without it the first unbound provisioned machine is used.
    #[arg(long)]
    pub ip: Option<String>,

    /// Machine name, defaults to the host IP
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub host: HostArgs,

    #[command(flatten)]
    pub versions: VersionArgs,
}

#[derive(Debug, Clone, Args)]
pub struct VersionArgs {
    #[arg(long, default_value = versions::KUBERNETES_VERSION)]
    pub kubernetes_version: String,

    #[arg(long, default_value = versions::NODEADM_VERSION)]
    pub nodeadm_version: String,

    #[arg(long, default_value = versions::ETCDADM_VERSION)]
    pub etcdadm_version: String,

    #[arg(long, default_value = versions::ETCD_VERSION)]
    pub etcd_version: String,

    #[arg(long, default_value = versions::CNI_VERSION)]
    pub cni_version: String,

    #[arg(long, default_value = versions::FLANNEL_VERSION)]
    pub flannel_version: String,

    #[arg(long, default_value = versions::KEEPALIVED_VERSION)]
    pub keepalived_version: String,
}

#[derive(Debug, Subcommand)]
pub enum DeleteCommand {
    /// Remove the SSH credential
    Credential,

    /// Tear down a machine and forget it
    Machine(DeleteMachineArgs),
}

#[derive(Debug, Args)]
pub struct DeleteMachineArgs {
    /// Machine name
    #[arg(long)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Noun {
    Cluster,
    Machine,
    #[value(name = "provisionedmachine")]
    ProvisionedMachine,
    Credential,
    Secrets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Yaml,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// What to show
    #[arg(value_enum)]
    pub noun: Noun,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Save an etcd snapshot taken on one master
    Etcd(SnapshotArgs),
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Master to take the snapshot on, by name or SSH host
    #[arg(long)]
    pub ip: String,

    /// Local destination
    #[arg(long)]
    pub snapshot: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum RecoverCommand {
    /// Rebuild etcd on every master from a snapshot
    Etcd(RecoverArgs),
}

#[derive(Debug, Args)]
pub struct RecoverArgs {
    /// Snapshot to restore
    #[arg(long)]
    pub snapshot: PathBuf,
}

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Archive to write
    #[arg(long)]
    pub archive: PathBuf,

    /// Etcd snapshot to include
    #[arg(long)]
    pub snapshot: PathBuf,
}

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Archive to read
    #[arg(long)]
    pub archive: PathBuf,

    /// Where to put the extracted etcd snapshot
    #[arg(long)]
    pub snapshot: PathBuf,
}
