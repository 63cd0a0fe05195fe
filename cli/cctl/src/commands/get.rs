//! `cctl get ...`
//!
//! Read-only views of the store. Secret values never leave the store: secrets
//! render as their name, type and key names, and the credential as its user.

use crate::cli::{GetArgs, Noun, OutputFormat};
use crate::error::CctlError;
use crate::settings::Settings;
use objects::{
    Cluster, DEFAULT_NAMESPACE, Machine, Object, ProvisionedMachine, SSH_CREDENTIAL_SECRET, Secret, SshCredential,
};
use serde::Serialize;
use state::{ObjectStore, push_to_store};
use std::fmt::Write;

pub fn run(args: &GetArgs, settings: &Settings) -> Result<(), CctlError> {
    let mut store = ObjectStore::new();
    push_to_store(&settings.state_path, &mut store)?;
    print!("{}", render(&store, args.noun, args.output)?);
    Ok(())
}

/// Secret without its values
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretView {
    name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    secret_type: Option<String>,
    keys: Vec<String>,
}

impl From<&Secret> for SecretView {
    fn from(secret: &Secret) -> Self {
        Self {
            name: secret.name().to_string(),
            secret_type: secret.secret_type.clone(),
            keys: secret.data.keys().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CredentialView {
    username: String,
}

/// Format the objects of `noun` in `format`
pub fn render(store: &ObjectStore, noun: Noun, format: OutputFormat) -> Result<String, CctlError> {
    match (noun, format) {
        (Noun::Cluster, OutputFormat::Yaml) => yaml(&store.list::<Cluster>(DEFAULT_NAMESPACE)),
        (Noun::Cluster, OutputFormat::Table) => Ok(table(
            &["NAME", "SERVICE NETWORK", "POD NETWORK", "VIP", "API ENDPOINTS", "ETCD MEMBERS"],
            store
                .list::<Cluster>(DEFAULT_NAMESPACE)
                .iter()
                .map(|cluster| {
                    let network = &cluster.spec.cluster_network;
                    vec![
                        cluster.name().to_string(),
                        network.services.cidr_blocks.join(","),
                        network.pods.cidr_blocks.join(","),
                        cluster
                            .spec
                            .provider_spec
                            .vip_configuration
                            .as_ref()
                            .map_or_else(|| "-".to_string(), |vip| vip.ip.clone()),
                        cluster
                            .status
                            .api_endpoints
                            .iter()
                            .map(|e| e.address())
                            .collect::<Vec<_>>()
                            .join(","),
                        cluster.status.etcd_members.len().to_string(),
                    ]
                })
                .collect(),
        )),

        (Noun::Machine, OutputFormat::Yaml) => yaml(&store.list::<Machine>(DEFAULT_NAMESPACE)),
        (Noun::Machine, OutputFormat::Table) => Ok(table(
            &["NAME", "ROLE", "HOST", "KUBERNETES", "ETCD MEMBER"],
            store
                .list::<Machine>(DEFAULT_NAMESPACE)
                .iter()
                .map(|machine| {
                    vec![
                        machine.name().to_string(),
                        machine
                            .spec
                            .roles
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(","),
                        machine.ssh_host().unwrap_or("-").to_string(),
                        machine.spec.versions.kubelet.clone(),
                        machine
                            .status
                            .etcd_member
                            .as_ref()
                            .map_or_else(|| "-".to_string(), |m| m.name.clone()),
                    ]
                })
                .collect(),
        )),

        (Noun::ProvisionedMachine, OutputFormat::Yaml) => {
            yaml(&store.list::<ProvisionedMachine>(DEFAULT_NAMESPACE))
        }
        (Noun::ProvisionedMachine, OutputFormat::Table) => Ok(table(
            &["NAME", "HOST", "PORT", "VIP INTERFACE", "MACHINE"],
            store
                .list::<ProvisionedMachine>(DEFAULT_NAMESPACE)
                .iter()
                .map(|pm| {
                    let ssh = &pm.spec.ssh_config;
                    vec![
                        pm.name().to_string(),
                        ssh.host.clone(),
                        ssh.port.to_string(),
                        pm.spec.vip_network_interface.clone().unwrap_or_else(|| "-".to_string()),
                        pm.status.machine_ref.clone().unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect(),
        )),

        (Noun::Credential, format) => {
            let credentials: Vec<CredentialView> = store
                .find::<Secret>(DEFAULT_NAMESPACE, SSH_CREDENTIAL_SECRET)
                .map(|secret| SshCredential::from_secret(&secret))
                .transpose()?
                .into_iter()
                .map(|credential| CredentialView {
                    username: credential.username,
                })
                .collect();
            match format {
                OutputFormat::Yaml => yaml(&credentials),
                OutputFormat::Table => Ok(table(
                    &["USER"],
                    credentials.into_iter().map(|c| vec![c.username]).collect(),
                )),
            }
        }

        (Noun::Secrets, format) => {
            let secrets: Vec<SecretView> = store
                .list::<Secret>(DEFAULT_NAMESPACE)
                .iter()
                .map(SecretView::from)
                .collect();
            match format {
                OutputFormat::Yaml => yaml(&secrets),
                OutputFormat::Table => Ok(table(
                    &["NAME", "TYPE", "KEYS"],
                    secrets
                        .into_iter()
                        .map(|s| {
                            vec![
                                s.name,
                                s.secret_type.unwrap_or_else(|| "-".to_string()),
                                if s.keys.is_empty() {
                                    "-".to_string()
                                } else {
                                    s.keys.join(",")
                                },
                            ]
                        })
                        .collect(),
                )),
            }
        }
    }
}

fn yaml<T: Serialize>(items: &[T]) -> Result<String, CctlError> {
    Ok(serde_yaml::to_string(items)?)
}

/// Left-aligned columns separated by three spaces
fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(ToString::to_string).collect();
    for row in std::iter::once(&header).chain(&rows) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        let _ = writeln!(out, "{}", line.join("   ").trim_end());
    }
    out
}
