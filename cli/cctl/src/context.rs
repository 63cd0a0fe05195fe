//! Shared state of one command run

use crate::error::CctlError;
use crate::settings::Settings;
use objects::{Cluster, DEFAULT_NAMESPACE, Machine, Object, Secret, SshCredential};
use ssh_client::{ConnectionTarget, Connector, RemoteExecutor};
use state::ObjectStore;
use tracing::info;

/// The store a command mutates, how it reaches hosts, and its settings
pub struct Context<'a> {
    pub store: &'a mut ObjectStore,
    pub connector: &'a dyn Connector,
    pub settings: &'a Settings,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<'a> Context<'a> {
    pub fn new(store: &'a mut ObjectStore, connector: &'a dyn Connector, settings: &'a Settings) -> Self {
        Self {
            store,
            connector,
            settings,
        }
    }

    /// The cluster, if declared
    pub fn find_cluster(&self) -> Option<Cluster> {
        self.store.list::<Cluster>(DEFAULT_NAMESPACE).into_iter().next()
    }

    /// The cluster; fails if none is declared
    pub fn cluster(&self) -> Result<Cluster, CctlError> {
        self.find_cluster()
            .ok_or_else(|| CctlError::NotFound("no cluster declared; run `cctl create cluster` first".to_string()))
    }

    pub fn machine(&self, name: &str) -> Result<Machine, CctlError> {
        Ok(self.store.get::<Machine>(DEFAULT_NAMESPACE, name)?)
    }

    /// Master machines, name-ascending
    pub fn masters(&self) -> Vec<Machine> {
        self.store
            .list::<Machine>(DEFAULT_NAMESPACE)
            .into_iter()
            .filter(Machine::is_master)
            .collect()
    }

    /// A secret that exists and carries data
    pub fn populated_secret(&self, name: &str) -> Option<Secret> {
        self.store
            .find::<Secret>(DEFAULT_NAMESPACE, name)
            .filter(|secret| !secret.is_empty())
    }

    /// Open a session to the host `machine` is bound to
    pub async fn connect(&self, machine: &Machine) -> Result<Box<dyn RemoteExecutor>, CctlError> {
        let ssh = machine.status.ssh_config.as_ref().ok_or_else(|| {
            CctlError::NotFound(format!(
                "machine {} is not bound to a provisioned machine",
                machine.name()
            ))
        })?;
        let secret = self
            .store
            .get::<Secret>(DEFAULT_NAMESPACE, &ssh.credential_secret)?;
        let credential = SshCredential::from_secret(&secret)?;

        let target = ConnectionTarget {
            host: ssh.host.clone(),
            port: ssh.port,
            username: credential.username,
            private_key: credential.private_key,
            public_keys: ssh.public_keys.clone(),
            insecure_ignore_host_key: self.settings.insecure_ignore_host_key,
        };
        info!("Connecting to machine {} at {}:{}", machine.name(), target.host, target.port);
        Ok(self.connector.connect(&target).await?)
    }
}
