//! Default component versions installed on new machines

/// nodeadm release
pub const NODEADM_VERSION: &str = "0.1.0";
/// etcdadm release
pub const ETCDADM_VERSION: &str = "0.1.0";
/// Kubernetes release (kubelet and control plane)
pub const KUBERNETES_VERSION: &str = "1.10.4";
/// CNI plugins release
pub const CNI_VERSION: &str = "0.6.0";
/// flannel release
pub const FLANNEL_VERSION: &str = "0.10.0";
/// keepalived release
pub const KEEPALIVED_VERSION: &str = "1.4.4";
/// etcd release
pub const ETCD_VERSION: &str = "3.3.8";
