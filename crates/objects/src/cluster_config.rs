//! Component tunables carried on the cluster
//!
//! The defaults here are the block that schema migration v1 -> v2 attaches to
//! clusters created before the cluster config existed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default kube-apiserver flags
pub const DEFAULT_API_SERVER_ARGS: &[(&str, &str)] = &[
    ("allow-privileged", "true"),
    ("service-node-port-range", "80-32767"),
];

/// Default kube-controller-manager flags
pub const DEFAULT_CONTROLLER_MANAGER_ARGS: &[(&str, &str)] = &[("pod-eviction-timeout", "20s")];

/// Per-component configuration of the control plane and kubelet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Extra kube-apiserver flags
    #[serde(rename = "kubeAPIServer", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kube_api_server: BTreeMap<String, String>,

    /// Extra kube-controller-manager flags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kube_controller_manager: BTreeMap<String, String>,

    /// Extra kube-scheduler flags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kube_scheduler: BTreeMap<String, String>,

    /// Kubelet configuration overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubelet: Option<KubeletConfiguration>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kube_api_server: to_map(DEFAULT_API_SERVER_ARGS),
            kube_controller_manager: to_map(DEFAULT_CONTROLLER_MANAGER_ARGS),
            kube_scheduler: BTreeMap::new(),
            kubelet: Some(KubeletConfiguration::default()),
        }
    }
}

impl ClusterConfig {
    /// Port the API server listens on, from the `secure-port` flag if set
    pub fn api_server_secure_port(&self) -> Option<&str> {
        self.kube_api_server.get("secure-port").map(String::as_str)
    }
}

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Subset of the kubelet's `KubeletConfiguration`
///
/// Unknown fields are preserved in `extra` so operator-supplied tunables survive
/// a load/save cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeletConfiguration {
    /// Refuse to start with swap enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_swap_on: Option<bool>,

    /// Burst to the API server
    #[serde(rename = "kubeAPIBurst", default, skip_serializing_if = "Option::is_none")]
    pub kube_api_burst: Option<i32>,

    /// Queries per second to the API server
    #[serde(rename = "kubeAPIQPS", default, skip_serializing_if = "Option::is_none")]
    pub kube_api_qps: Option<i32>,

    /// Pod capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pods: Option<i32>,

    /// Any other kubelet fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for KubeletConfiguration {
    fn default() -> Self {
        Self {
            fail_swap_on: Some(false),
            kube_api_burst: Some(40),
            kube_api_qps: Some(20),
            max_pods: Some(500),
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_block() {
        let config = ClusterConfig::default();
        assert_eq!(config.kube_api_server["allow-privileged"], "true");
        assert_eq!(config.kube_api_server["service-node-port-range"], "80-32767");
        assert_eq!(config.kube_controller_manager["pod-eviction-timeout"], "20s");

        let kubelet = config.kubelet.unwrap();
        assert_eq!(kubelet.fail_swap_on, Some(false));
        assert_eq!(kubelet.kube_api_burst, Some(40));
        assert_eq!(kubelet.kube_api_qps, Some(20));
        assert_eq!(kubelet.max_pods, Some(500));
    }

    #[test]
    fn test_kubelet_wire_names() {
        let json = serde_json::to_value(KubeletConfiguration::default()).unwrap();
        assert_eq!(json["failSwapOn"], false);
        assert_eq!(json["kubeAPIBurst"], 40);
        assert_eq!(json["kubeAPIQPS"], 20);
        assert_eq!(json["maxPods"], 500);
    }

    #[test]
    fn test_unknown_kubelet_fields_survive() {
        let yaml = "maxPods: 110\nevictionHard:\n  memory.available: 100Mi\n";
        let kubelet: KubeletConfiguration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(kubelet.max_pods, Some(110));
        assert!(kubelet.extra.contains_key("evictionHard"));

        let again = serde_yaml::to_string(&kubelet).unwrap();
        assert!(again.contains("evictionHard"));
    }
}
