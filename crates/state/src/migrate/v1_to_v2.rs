//! v1 -> v2: clusters gain the default component configuration block

use super::{Migration, set_schema_version};
use crate::error::MigrationError;
use objects::ClusterConfig;
use serde_yaml::{Mapping, Value};
use tracing::debug;

const CLUSTER_LIST_KEY: &str = "clusterList";
const ITEMS_KEY: &str = "items";
const SPEC_KEY: &str = "spec";
const PROVIDER_SPEC_KEY: &str = "providerSpec";
const CLUSTER_CONFIG_KEY: &str = "clusterConfig";

/// Attaches [`ClusterConfig::default`] to clusters that have none
#[derive(Debug, Clone, Copy, Default)]
pub struct AddDefaultClusterConfig;

impl Migration for AddDefaultClusterConfig {
    fn from_version(&self) -> u32 {
        1
    }

    fn name(&self) -> &'static str {
        "add default cluster config"
    }

    fn forward(&self, mut document: Value) -> Result<Value, MigrationError> {
        let default_config = serde_yaml::to_value(ClusterConfig::default())?;

        let clusters = document
            .get_mut(CLUSTER_LIST_KEY)
            .and_then(|list| list.get_mut(ITEMS_KEY))
            .and_then(Value::as_sequence_mut);
        for cluster in clusters.into_iter().flatten() {
            let provider_spec = child_mapping(child_mapping(cluster, SPEC_KEY)?, PROVIDER_SPEC_KEY)?;
            let Some(provider_spec) = provider_spec.as_mapping_mut() else {
                continue;
            };
            let key = Value::String(CLUSTER_CONFIG_KEY.to_string());
            let missing = provider_spec.get(&key).is_none_or(Value::is_null);
            if missing {
                debug!("Attaching default cluster config");
                provider_spec.insert(key, default_config.clone());
            }
        }

        set_schema_version(&mut document, 2)?;
        Ok(document)
    }
}

/// The mapping under `key`, created empty if absent
fn child_mapping<'a>(value: &'a mut Value, key: &str) -> Result<&'a mut Value, MigrationError> {
    let mapping = value
        .as_mapping_mut()
        .ok_or_else(|| MigrationError::Malformed(format!("expected a mapping around {}", key)))?;
    let child = mapping
        .entry(Value::String(key.to_string()))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if child.is_null() {
        *child = Value::Mapping(Mapping::new());
    }
    if !child.is_mapping() {
        return Err(MigrationError::Malformed(format!("{} is not a mapping", key)));
    }
    Ok(child)
}
