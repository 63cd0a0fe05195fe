//! ProvisionedMachine object
//!
//! A reachable host that has not yet been committed to a role. The binding to a
//! machine is authoritative in [`ProvisionedMachineStatus::machine_ref`].

use crate::config_map::ConfigMap;
use crate::error::ObjectError;
use crate::meta::{ObjectMeta, impl_object};
use crate::secret::SSH_CREDENTIAL_SECRET;
use serde::{Deserialize, Serialize};

/// API group of ProvisionedMachine
pub const PROVISIONED_MACHINE_API_VERSION: &str = "sshprovider.platform9.com/v1alpha1";

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// ConfigMap key holding the JSON-encoded spec
pub const CONFIG_MAP_SPEC_KEY: &str = "spec";
/// ConfigMap key holding the JSON-encoded status
pub const CONFIG_MAP_STATUS_KEY: &str = "status";

fn default_api_version() -> String {
    PROVISIONED_MACHINE_API_VERSION.to_string()
}

fn default_kind() -> String {
    "ProvisionedMachine".to_string()
}

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// How to reach a host over SSH
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshConfig {
    /// Host name or IP
    pub host: String,

    /// SSH port
    #[serde(default = "default_ssh_port")]
    pub port: u16,

    /// Accepted host public keys, in `authorized_keys` form
    #[serde(default)]
    pub public_keys: Vec<String>,

    /// Name of the secret holding the login credential
    pub credential_secret: String,
}

impl SshConfig {
    /// Config for `host` on port 22 using the well-known credential secret
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            public_keys: Vec::new(),
            credential_secret: SSH_CREDENTIAL_SECRET.to_string(),
        }
    }
}

/// A reachable host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedMachine {
    /// Always [`PROVISIONED_MACHINE_API_VERSION`]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Always "ProvisionedMachine"
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Object metadata
    pub metadata: ObjectMeta,

    /// Host facts
    pub spec: ProvisionedMachineSpec,

    /// Binding
    #[serde(default)]
    pub status: ProvisionedMachineStatus,
}

impl_object!(
    ProvisionedMachine,
    "ProvisionedMachine",
    PROVISIONED_MACHINE_API_VERSION,
    status
);

/// Host facts of a provisioned machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedMachineSpec {
    /// SSH reachability
    pub ssh_config: SshConfig,

    /// Interface the VIP can be announced on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip_network_interface: Option<String>,
}

/// Binding of a provisioned machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedMachineStatus {
    /// Name of the machine that reserved this host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_ref: Option<String>,
}

impl ProvisionedMachine {
    /// Unbound provisioned machine
    pub fn new(name: impl Into<String>, spec: ProvisionedMachineSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::new(name),
            spec,
            status: ProvisionedMachineStatus::default(),
        }
    }

    /// Whether some machine has reserved this host
    pub fn is_bound(&self) -> bool {
        self.status.machine_ref.is_some()
    }

    /// Project into the legacy ConfigMap shape
    pub fn to_config_map(&self) -> Result<ConfigMap, ObjectError> {
        let mut config_map = ConfigMap::new(self.metadata.clone());
        config_map.data.insert(
            CONFIG_MAP_SPEC_KEY.to_string(),
            serde_json::to_string(&self.spec)?,
        );
        config_map.data.insert(
            CONFIG_MAP_STATUS_KEY.to_string(),
            serde_json::to_string(&self.status)?,
        );
        Ok(config_map)
    }

    /// Rebuild from the legacy ConfigMap shape
    pub fn from_config_map(config_map: &ConfigMap) -> Result<Self, ObjectError> {
        let spec = config_map.data.get(CONFIG_MAP_SPEC_KEY).ok_or_else(|| {
            ObjectError::Validation(format!(
                "config map {} has no {} key",
                config_map.metadata.name, CONFIG_MAP_SPEC_KEY
            ))
        })?;
        let status = match config_map.data.get(CONFIG_MAP_STATUS_KEY) {
            Some(status) => serde_json::from_str(status)?,
            None => ProvisionedMachineStatus::default(),
        };

        Ok(Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: config_map.metadata.clone(),
            spec: serde_json::from_str(spec)?,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provisioned(host: &str) -> ProvisionedMachine {
        let mut ssh_config = SshConfig::new(host);
        ssh_config.port = 2222;
        ssh_config.public_keys = vec!["ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAA test".to_string()];
        ProvisionedMachine::new(
            host,
            ProvisionedMachineSpec {
                ssh_config,
                vip_network_interface: Some("eth0".to_string()),
            },
        )
    }

    #[test]
    fn test_config_map_round_trip() {
        let mut pm = provisioned("10.0.0.5");
        pm.status.machine_ref = Some("10.0.0.5".to_string());
        pm.metadata
            .annotations
            .insert("note".to_string(), "rack 4".to_string());

        let config_map = pm.to_config_map().unwrap();
        assert_eq!(config_map.kind, "ConfigMap");
        assert!(config_map.data[CONFIG_MAP_SPEC_KEY].contains("\"vipNetworkInterface\":\"eth0\""));

        let back = ProvisionedMachine::from_config_map(&config_map).unwrap();
        assert_eq!(back, pm);
    }

    #[test]
    fn test_config_map_without_status_is_unbound() {
        let pm = provisioned("10.0.0.6");
        let mut config_map = pm.to_config_map().unwrap();
        config_map.data.remove(CONFIG_MAP_STATUS_KEY);

        let back = ProvisionedMachine::from_config_map(&config_map).unwrap();
        assert!(!back.is_bound());
    }

    #[test]
    fn test_config_map_without_spec_is_rejected() {
        let config_map = ConfigMap::new(ObjectMeta::new("broken"));
        assert!(ProvisionedMachine::from_config_map(&config_map).is_err());
    }

    #[test]
    fn test_ssh_port_defaults_to_22() {
        let config: SshConfig =
            serde_json::from_str(r#"{"host":"h","credentialSecret":"sshcredential"}"#).unwrap();
        assert_eq!(config.port, 22);
        assert!(config.public_keys.is_empty());
    }
}
