//! Machine object
//!
//! A declared master or node. Its status records what was actually observed
//! while provisioning it.

use crate::cluster::CLUSTER_API_VERSION;
use crate::etcd::EtcdMember;
use crate::meta::{ObjectMeta, impl_object};
use crate::provisioned_machine::SshConfig;
use crate::versions;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_api_version() -> String {
    CLUSTER_API_VERSION.to_string()
}

fn default_kind() -> String {
    "Machine".to_string()
}

/// Role a machine plays in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineRole {
    /// Control plane plus etcd member
    Master,
    /// Worker
    Node,
}

impl fmt::Display for MachineRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineRole::Master => write!(f, "Master"),
            MachineRole::Node => write!(f, "Node"),
        }
    }
}

/// A declared host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    /// Always [`CLUSTER_API_VERSION`]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Always "Machine"
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Object metadata
    pub metadata: ObjectMeta,

    /// Desired state
    pub spec: MachineSpec,

    /// Observed state
    #[serde(default)]
    pub status: MachineStatus,
}

impl_object!(Machine, "Machine", CLUSTER_API_VERSION, status);

impl Machine {
    /// New machine with empty status
    pub fn new(name: impl Into<String>, spec: MachineSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::new(name),
            spec,
            status: MachineStatus::default(),
        }
    }

    /// Whether the machine carries the master role
    pub fn is_master(&self) -> bool {
        self.spec.roles.contains(&MachineRole::Master)
    }

    /// Whether the machine carries the node role
    pub fn is_node(&self) -> bool {
        self.spec.roles.contains(&MachineRole::Node)
    }

    /// SSH host recorded at bind time
    pub fn ssh_host(&self) -> Option<&str> {
        self.status.ssh_config.as_ref().map(|c| c.host.as_str())
    }
}

/// Desired machine state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    /// Roles
    pub roles: Vec<MachineRole>,

    /// Name of the bound provisioned machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_machine_name: Option<String>,

    /// Kubernetes versions
    #[serde(default)]
    pub versions: MachineVersionInfo,

    /// Helper and addon versions
    #[serde(default)]
    pub component_versions: ComponentVersions,
}

impl MachineSpec {
    /// Spec with one role and default versions
    pub fn with_role(role: MachineRole) -> Self {
        let versions = MachineVersionInfo {
            kubelet: versions::KUBERNETES_VERSION.to_string(),
            control_plane: (role == MachineRole::Master)
                .then(|| versions::KUBERNETES_VERSION.to_string()),
        };
        Self {
            roles: vec![role],
            provisioned_machine_name: None,
            versions,
            component_versions: ComponentVersions::default(),
        }
    }
}

/// Kubernetes versions of a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineVersionInfo {
    /// kubelet version
    pub kubelet: String,

    /// Control-plane version, masters only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane: Option<String>,
}

impl Default for MachineVersionInfo {
    fn default() -> Self {
        Self {
            kubelet: versions::KUBERNETES_VERSION.to_string(),
            control_plane: None,
        }
    }
}

/// Versions of the helpers and addons installed on a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentVersions {
    /// nodeadm
    pub nodeadm_version: String,
    /// etcdadm
    pub etcdadm_version: String,
    /// Kubernetes binaries
    pub kubernetes_version: String,
    /// CNI plugins
    pub cni_version: String,
    /// flannel
    pub flannel_version: String,
    /// keepalived
    pub keepalived_version: String,
    /// etcd
    pub etcd_version: String,
}

impl Default for ComponentVersions {
    fn default() -> Self {
        Self {
            nodeadm_version: versions::NODEADM_VERSION.to_string(),
            etcdadm_version: versions::ETCDADM_VERSION.to_string(),
            kubernetes_version: versions::KUBERNETES_VERSION.to_string(),
            cni_version: versions::CNI_VERSION.to_string(),
            flannel_version: versions::FLANNEL_VERSION.to_string(),
            keepalived_version: versions::KEEPALIVED_VERSION.to_string(),
            etcd_version: versions::ETCD_VERSION.to_string(),
        }
    }
}

/// Observed machine state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatus {
    /// SSH config copied from the bound provisioned machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_config: Option<SshConfig>,

    /// VIP interface, masters only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip_network_interface: Option<String>,

    /// Observed etcd member, masters only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd_member: Option<EtcdMember>,
}
