//! Cluster object
//!
//! The single logical cluster: its networks, the names of the secrets that hold
//! its trust roots, an optional virtual IP, and the observed API endpoints and
//! etcd members.

use crate::cluster_config::ClusterConfig;
use crate::error::ObjectError;
use crate::etcd::EtcdMemberSet;
use crate::meta::{ObjectMeta, impl_object};
use crate::secret::{
    API_SERVER_CA_SECRET, BOOTSTRAP_TOKEN_SECRET, ETCD_CA_SECRET, FRONT_PROXY_CA_SECRET,
    SERVICE_ACCOUNT_KEY_SECRET,
};
use serde::{Deserialize, Serialize};

/// API group shared by Cluster and Machine
pub const CLUSTER_API_VERSION: &str = "cluster.k8s.io/v1alpha1";

/// Port the API server binds when nothing else is configured
pub const DEFAULT_API_BIND_PORT: u16 = 6443;

/// Default DNS domain of in-cluster services
pub const DEFAULT_SERVICE_DOMAIN: &str = "cluster.local";

/// Highest VRRP router id accepted for the VIP
pub const MAX_ROUTER_ID: u8 = 254;

fn default_api_version() -> String {
    CLUSTER_API_VERSION.to_string()
}

fn default_kind() -> String {
    "Cluster".to_string()
}

fn default_service_domain() -> String {
    DEFAULT_SERVICE_DOMAIN.to_string()
}

/// The logical Kubernetes cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Always [`CLUSTER_API_VERSION`]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Always "Cluster"
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Object metadata
    pub metadata: ObjectMeta,

    /// Desired state
    pub spec: ClusterSpec,

    /// Observed state
    #[serde(default)]
    pub status: ClusterStatus,
}

impl_object!(Cluster, "Cluster", CLUSTER_API_VERSION, status);

impl Cluster {
    /// New cluster with empty status
    pub fn new(name: impl Into<String>, spec: ClusterSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::new(name),
            spec,
            status: ClusterStatus::default(),
        }
    }

    /// Port the API server binds on masters: kube-apiserver `secure-port` if
    /// tuned, otherwise [`DEFAULT_API_BIND_PORT`]
    pub fn api_bind_port(&self) -> Result<u16, ObjectError> {
        match self
            .spec
            .provider_spec
            .cluster_config
            .as_ref()
            .and_then(ClusterConfig::api_server_secure_port)
        {
            Some(port) => parse_port(port),
            None => Ok(DEFAULT_API_BIND_PORT),
        }
    }

    /// Whether masters announce a virtual IP
    pub fn has_vip(&self) -> bool {
        self.spec.provider_spec.vip_configuration.is_some()
    }

    /// Checks the invariants that must hold before any machine is deployed
    pub fn validate_for_deploy(&self) -> Result<(), ObjectError> {
        let network = &self.spec.cluster_network;
        network.services.single_block("service")?;
        network.pods.single_block("pod")?;
        if let Some(vip) = &self.spec.provider_spec.vip_configuration {
            vip.validate()?;
        }
        Ok(())
    }
}

/// Desired cluster state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Service and pod networks
    pub cluster_network: ClusterNetworkingConfig,

    /// Provider-specific settings
    pub provider_spec: ClusterProviderSpec,
}

/// Service and pod networks of the cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetworkingConfig {
    /// Service CIDR
    #[serde(default)]
    pub services: NetworkRanges,

    /// Pod CIDR
    #[serde(default)]
    pub pods: NetworkRanges,

    /// DNS domain of services
    #[serde(default = "default_service_domain")]
    pub service_domain: String,
}

impl ClusterNetworkingConfig {
    /// Networks with a single service and pod block each
    pub fn new(service_cidr: &str, pod_cidr: &str) -> Self {
        Self {
            services: NetworkRanges::single(service_cidr),
            pods: NetworkRanges::single(pod_cidr),
            service_domain: default_service_domain(),
        }
    }
}

/// A list of CIDR blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRanges {
    /// CIDR blocks
    #[serde(default)]
    pub cidr_blocks: Vec<String>,
}

impl NetworkRanges {
    /// One block
    pub fn single(cidr: &str) -> Self {
        Self {
            cidr_blocks: vec![cidr.to_string()],
        }
    }

    /// The only block; zero or several blocks are rejected
    pub fn single_block(&self, what: &str) -> Result<&str, ObjectError> {
        match self.cidr_blocks.as_slice() {
            [block] => Ok(block),
            blocks => Err(ObjectError::Validation(format!(
                "cluster {} CIDR must have exactly one block, found {}",
                what,
                blocks.len()
            ))),
        }
    }
}

/// Cluster settings specific to SSH-provisioned hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProviderSpec {
    /// Secret holding the etcd CA
    pub etcd_ca_secret: String,

    /// Secret holding the API server CA
    pub api_server_ca_secret: String,

    /// Secret holding the front-proxy CA
    pub front_proxy_ca_secret: String,

    /// Secret holding the service-account signing key pair
    pub service_account_key_secret: String,

    /// Secret holding the bootstrap token
    pub bootstrap_token_secret: String,

    /// Virtual IP announced by the masters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip_configuration: Option<VipConfiguration>,

    /// Component tunables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_config: Option<ClusterConfig>,
}

impl Default for ClusterProviderSpec {
    fn default() -> Self {
        Self {
            etcd_ca_secret: ETCD_CA_SECRET.to_string(),
            api_server_ca_secret: API_SERVER_CA_SECRET.to_string(),
            front_proxy_ca_secret: FRONT_PROXY_CA_SECRET.to_string(),
            service_account_key_secret: SERVICE_ACCOUNT_KEY_SECRET.to_string(),
            bootstrap_token_secret: BOOTSTRAP_TOKEN_SECRET.to_string(),
            vip_configuration: None,
            cluster_config: Some(ClusterConfig::default()),
        }
    }
}

/// Virtual IP shared by the masters through VRRP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipConfiguration {
    /// The virtual IP
    pub ip: String,

    /// VRRP router id, 0..=254
    #[serde(rename = "routerID")]
    pub router_id: u8,

    /// Interface the VIP is announced on, when uniform across masters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_interface: Option<String>,
}

impl VipConfiguration {
    /// Rejects router ids above [`MAX_ROUTER_ID`]
    pub fn validate(&self) -> Result<(), ObjectError> {
        if self.router_id > MAX_ROUTER_ID {
            return Err(ObjectError::Validation(format!(
                "VIP router id {} out of range [0, {}]",
                self.router_id, MAX_ROUTER_ID
            )));
        }
        if self.ip.is_empty() {
            return Err(ObjectError::Validation("VIP address is empty".to_string()));
        }
        Ok(())
    }
}

/// Observed cluster state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// Reachable API server endpoints, one per master
    #[serde(default, rename = "apiEndpoints")]
    pub api_endpoints: Vec<ApiEndpoint>,

    /// Members of the etcd cluster
    #[serde(default)]
    pub etcd_members: EtcdMemberSet,
}

impl ClusterStatus {
    /// Record an endpoint unless it is already present
    pub fn add_api_endpoint(&mut self, endpoint: ApiEndpoint) {
        if !self.api_endpoints.contains(&endpoint) {
            self.api_endpoints.push(endpoint);
        }
    }

    /// Drop every endpoint served by `host`
    pub fn remove_api_endpoints_for(&mut self, host: &str) {
        self.api_endpoints.retain(|e| e.host != host);
    }
}

/// One API server address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// Host name or IP
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl ApiEndpoint {
    /// Derive an endpoint from a control-plane endpoint string
    ///
    /// Accepts `host`, `host:port` and `[v6]:port`. A missing port falls back
    /// to `bind_port`; any port outside [1, 65535] is rejected.
    pub fn derive(control_plane_endpoint: &str, bind_port: u16) -> Result<Self, ObjectError> {
        let endpoint = control_plane_endpoint.trim();
        if endpoint.is_empty() {
            return Err(ObjectError::Validation(
                "control plane endpoint is empty".to_string(),
            ));
        }

        let (host, port) = if let Some(rest) = endpoint.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(|| {
                ObjectError::Validation(format!("unterminated IPv6 literal in {}", endpoint))
            })?;
            match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if after.is_empty() => (host, None),
                None => {
                    return Err(ObjectError::Validation(format!(
                        "unexpected text after IPv6 literal in {}",
                        endpoint
                    )));
                }
            }
        } else if let (1, Some((host, port))) =
            (endpoint.matches(':').count(), endpoint.split_once(':'))
        {
            (host, Some(port))
        } else {
            // Bare hostnames and unbracketed IPv6 addresses carry no port
            (endpoint, None)
        };

        let port = match port {
            Some(port) => parse_port(port)?,
            None if bind_port == 0 => return Err(ObjectError::InvalidPort(bind_port.to_string())),
            None => bind_port,
        };

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// `https://host:port`
    pub fn url(&self) -> String {
        if self.host.contains(':') {
            format!("https://[{}]:{}", self.host, self.port)
        } else {
            format!("https://{}:{}", self.host, self.port)
        }
    }

    /// `host:port`, the form the node installer expects
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(port: &str) -> Result<u16, ObjectError> {
    match port.parse::<u32>() {
        Ok(p) if (1..=65535).contains(&p) => {
            u16::try_from(p).map_err(|_| ObjectError::InvalidPort(port.to_string()))
        }
        _ => Err(ObjectError::InvalidPort(port.to_string())),
    }
}
