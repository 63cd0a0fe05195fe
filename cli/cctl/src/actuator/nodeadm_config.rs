//! Node installer configuration documents
//!
//! `nodeadm init` and `nodeadm join` read a YAML document from
//! [`NODEADM_CONFIG_PATH`](super::NODEADM_CONFIG_PATH). Masters get an init
//! configuration rendered from the cluster spec and the host; nodes get a join
//! configuration pointing at an API endpoint.

use crate::error::CctlError;
use objects::{ApiEndpoint, Cluster, KubeletConfiguration, Machine, Object};
use pki::BootstrapToken;
use serde::Serialize;
use std::collections::BTreeMap;

/// Local etcd client endpoint on every master
pub const LOCAL_ETCD_ENDPOINT: &str = "https://127.0.0.1:2379";

const ETCD_CA_FILE: &str = "/etc/etcd/pki/ca.crt";
const ETCD_CLIENT_CERT_FILE: &str = "/etc/etcd/pki/apiserver-etcd-client.crt";
const ETCD_CLIENT_KEY_FILE: &str = "/etc/etcd/pki/apiserver-etcd-client.key";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitConfiguration {
    pub master_configuration: MasterConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_configuration: Option<VipConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterConfiguration {
    pub api: Api,
    pub etcd: Etcd,
    pub networking: Networking,
    pub kubernetes_version: String,
    #[serde(rename = "apiServerCertSANs")]
    pub api_server_cert_sans: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub api_server_extra_args: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub controller_manager_extra_args: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scheduler_extra_args: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubelet_configuration: Option<KubeletConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    pub advertise_address: String,
    pub bind_port: u16,
    pub control_plane_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Etcd {
    pub endpoints: Vec<String>,
    pub ca_file: String,
    pub cert_file: String,
    pub key_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    pub service_subnet: String,
    pub pod_subnet: String,
    pub dns_domain: String,
}

/// Keepalived settings, in the node installer's field spelling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VipConfiguration {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "RouterID")]
    pub router_id: u8,
    #[serde(rename = "NetworkInterface")]
    pub network_interface: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConfiguration {
    pub node_configuration: NodeConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfiguration {
    pub token: String,
    #[serde(rename = "discoveryTokenAPIServers")]
    pub discovery_token_api_servers: Vec<String>,
    pub discovery_token_ca_cert_hashes: Vec<String>,
    pub kubernetes_version: String,
}

/// Init configuration for `machine`, a bound master
pub fn master(cluster: &Cluster, machine: &Machine) -> Result<InitConfiguration, CctlError> {
    let host = bound_host(machine)?;
    let network = &cluster.spec.cluster_network;
    let bind_port = cluster.api_bind_port()?;
    let tunables = cluster.spec.provider_spec.cluster_config.clone().unwrap_or_default();

    let vip_configuration = match &cluster.spec.provider_spec.vip_configuration {
        Some(vip) => {
            let network_interface = machine
                .status
                .vip_network_interface
                .clone()
                .or_else(|| vip.network_interface.clone())
                .ok_or_else(|| {
                    CctlError::Validation(format!(
                        "master {} has no interface to announce VIP {} on",
                        machine.name(),
                        vip.ip
                    ))
                })?;
            Some(VipConfiguration {
                ip: vip.ip.clone(),
                router_id: vip.router_id,
                network_interface,
            })
        }
        None => None,
    };

    let control_plane_host = vip_configuration.as_ref().map_or(host, |vip| vip.ip.as_str());
    let endpoint = ApiEndpoint::derive(control_plane_host, bind_port)?;
    let mut api_server_cert_sans = vec![host.to_string()];
    if control_plane_host != host {
        api_server_cert_sans.push(control_plane_host.to_string());
    }

    Ok(InitConfiguration {
        master_configuration: MasterConfiguration {
            api: Api {
                advertise_address: host.to_string(),
                bind_port,
                control_plane_endpoint: endpoint.address(),
            },
            etcd: Etcd {
                endpoints: vec![LOCAL_ETCD_ENDPOINT.to_string()],
                ca_file: ETCD_CA_FILE.to_string(),
                cert_file: ETCD_CLIENT_CERT_FILE.to_string(),
                key_file: ETCD_CLIENT_KEY_FILE.to_string(),
            },
            networking: Networking {
                service_subnet: network.services.single_block("service")?.to_string(),
                pod_subnet: network.pods.single_block("pod")?.to_string(),
                dns_domain: network.service_domain.clone(),
            },
            kubernetes_version: control_plane_version(machine),
            api_server_cert_sans,
            api_server_extra_args: tunables.kube_api_server,
            controller_manager_extra_args: tunables.kube_controller_manager,
            scheduler_extra_args: tunables.kube_scheduler,
            kubelet_configuration: tunables.kubelet,
        },
        vip_configuration,
    })
}

/// Join configuration for a node joining through `endpoint`
pub fn node(machine: &Machine, endpoint: &ApiEndpoint, token: &BootstrapToken) -> JoinConfiguration {
    JoinConfiguration {
        node_configuration: NodeConfiguration {
            token: token.token.clone(),
            discovery_token_api_servers: vec![endpoint.address()],
            discovery_token_ca_cert_hashes: vec![token.ca_hash.clone()],
            kubernetes_version: machine.spec.versions.kubelet.clone(),
        },
    }
}

/// Render either document
pub fn render<T: Serialize>(config: &T) -> Result<String, CctlError> {
    Ok(serde_yaml::to_string(config)?)
}

fn bound_host(machine: &Machine) -> Result<&str, CctlError> {
    machine.ssh_host().ok_or_else(|| {
        CctlError::NotFound(format!(
            "machine {} is not bound to a provisioned machine",
            machine.name()
        ))
    })
}

fn control_plane_version(machine: &Machine) -> String {
    machine
        .spec
        .versions
        .control_plane
        .clone()
        .unwrap_or_else(|| machine.spec.versions.kubelet.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use objects::VipConfiguration as ClusterVip;

    #[test]
    fn test_master_config_without_vip() {
        let cluster = test_cluster();
        let machine = bound_machine("10.0.0.1", objects::MachineRole::Master);

        let config = master(&cluster, &machine).unwrap();
        let m = &config.master_configuration;
        assert_eq!(m.api.advertise_address, "10.0.0.1");
        assert_eq!(m.api.bind_port, 6443);
        assert_eq!(m.api.control_plane_endpoint, "10.0.0.1:6443");
        assert_eq!(m.etcd.endpoints, vec![LOCAL_ETCD_ENDPOINT]);
        assert_eq!(m.networking.service_subnet, "10.96.0.0/12");
        assert_eq!(m.networking.pod_subnet, "10.244.0.0/16");
        assert_eq!(m.networking.dns_domain, "cluster.local");
        assert_eq!(m.api_server_extra_args["allow-privileged"], "true");
        assert!(config.vip_configuration.is_none());

        let yaml = render(&config).unwrap();
        assert!(yaml.contains("masterConfiguration:"));
        assert!(yaml.contains("apiServerCertSANs:"));
        assert!(!yaml.contains("vipConfiguration"));
    }

    #[test]
    fn test_master_config_with_vip_uses_vip_endpoint() {
        let mut cluster = test_cluster();
        cluster.spec.provider_spec.vip_configuration = Some(ClusterVip {
            ip: "10.0.0.100".to_string(),
            router_id: 7,
            network_interface: Some("eth0".to_string()),
        });
        let machine = bound_machine("10.0.0.1", objects::MachineRole::Master);

        let config = master(&cluster, &machine).unwrap();
        assert_eq!(config.master_configuration.api.advertise_address, "10.0.0.1");
        assert_eq!(
            config.master_configuration.api.control_plane_endpoint,
            "10.0.0.100:6443"
        );
        assert_eq!(
            config.master_configuration.api_server_cert_sans,
            vec!["10.0.0.1", "10.0.0.100"]
        );
        let vip = config.vip_configuration.clone().unwrap();
        assert_eq!(vip.network_interface, "eth0");
        assert_eq!(vip.router_id, 7);

        let yaml = render(&config).unwrap();
        assert!(yaml.contains("RouterID: 7"));
    }

    #[test]
    fn test_master_config_rejects_vip_without_interface() {
        let mut cluster = test_cluster();
        cluster.spec.provider_spec.vip_configuration = Some(ClusterVip {
            ip: "10.0.0.100".to_string(),
            router_id: 7,
            network_interface: None,
        });
        let machine = bound_machine("10.0.0.1", objects::MachineRole::Master);
        assert!(matches!(master(&cluster, &machine), Err(CctlError::Validation(_))));
    }

    #[test]
    fn test_master_config_honours_secure_port() {
        let mut cluster = test_cluster();
        if let Some(config) = cluster.spec.provider_spec.cluster_config.as_mut() {
            config.kube_api_server.insert("secure-port".to_string(), "8443".to_string());
        }
        let machine = bound_machine("10.0.0.1", objects::MachineRole::Master);
        let config = master(&cluster, &machine).unwrap();
        assert_eq!(config.master_configuration.api.bind_port, 8443);
        assert_eq!(config.master_configuration.api.control_plane_endpoint, "10.0.0.1:8443");
    }

    #[test]
    fn test_node_config() {
        let machine = bound_machine("10.0.0.5", objects::MachineRole::Node);
        let endpoint = ApiEndpoint {
            host: "10.0.0.1".to_string(),
            port: 6443,
        };
        let token = BootstrapToken {
            token: "abcdef.0123456789abcdef".to_string(),
            ca_hash: TEST_CA_HASH.to_string(),
        };
        let config = node(&machine, &endpoint, &token);
        let yaml: serde_yaml::Value = serde_yaml::from_str(&render(&config).unwrap()).unwrap();
        let node = &yaml["nodeConfiguration"];
        assert_eq!(node["token"].as_str(), Some("abcdef.0123456789abcdef"));
        assert_eq!(node["discoveryTokenAPIServers"][0].as_str(), Some("10.0.0.1:6443"));
        assert_eq!(node["discoveryTokenCaCertHashes"][0].as_str(), Some(TEST_CA_HASH));
    }
}
