//! ConfigMap envelope
//!
//! Only used as the legacy storage shape of provisioned machines.

use crate::meta::{ObjectMeta, impl_object};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "ConfigMap".to_string()
}

/// String-to-string configuration map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    /// Always "v1"
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Always "ConfigMap"
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Object metadata
    pub metadata: ObjectMeta,

    /// Payload
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl_object!(ConfigMap, "ConfigMap", "v1");

impl ConfigMap {
    /// Empty config map with the given metadata
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata,
            data: BTreeMap::new(),
        }
    }
}
