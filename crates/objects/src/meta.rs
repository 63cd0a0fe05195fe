//! Object envelope shared by every entity

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The namespace every cctl object lives in
pub const DEFAULT_NAMESPACE: &str = "default";

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Standard object metadata
///
/// Mirrors the subset of Kubernetes `ObjectMeta` that cctl uses. `uid` and
/// `creationTimestamp` are stamped by the object store on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name, unique within its namespace and kind
    pub name: String,

    /// Namespace (always [`DEFAULT_NAMESPACE`] in practice)
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Unique identifier assigned on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Time the object was first created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,

    /// Free-form annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Metadata for `name` in the default namespace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: default_namespace(),
            uid: None,
            creation_timestamp: None,
            annotations: BTreeMap::new(),
        }
    }
}

/// Common behaviour of every stored entity
///
/// Plays the role `kube::Resource` plays for CRDs: it gives generic code
/// access to the envelope, plus the one status operation the store needs.
pub trait Object: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned {
    /// Kind, e.g. "Machine"
    const KIND: &'static str;

    /// API version, e.g. "cluster.k8s.io/v1alpha1"
    const API_VERSION: &'static str;

    /// Object metadata
    fn metadata(&self) -> &ObjectMeta;

    /// Mutable object metadata
    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    /// Resets `apiVersion`/`kind` to this type's constants
    fn set_type_meta(&mut self);

    /// Replaces this object's status with `other`'s. No-op for kinds without status.
    fn replace_status(&mut self, other: &Self);

    /// Object name
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Object namespace
    fn namespace(&self) -> &str {
        &self.metadata().namespace
    }
}

/// Implements [`Object`] for an entity struct with `api_version`, `kind`,
/// `metadata` and (optionally) `status` fields.
macro_rules! impl_object {
    ($ty:ty, $kind:expr, $api_version:expr) => {
        impl_object!(@impl $ty, $kind, $api_version, |_this: &mut $ty, _other: &$ty| {});
    };
    ($ty:ty, $kind:expr, $api_version:expr, status) => {
        impl_object!(@impl $ty, $kind, $api_version, |this: &mut $ty, other: &$ty| {
            this.status = other.status.clone();
        });
    };
    (@impl $ty:ty, $kind:expr, $api_version:expr, $replace:expr) => {
        impl $crate::meta::Object for $ty {
            const KIND: &'static str = $kind;
            const API_VERSION: &'static str = $api_version;

            fn metadata(&self) -> &$crate::meta::ObjectMeta {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut $crate::meta::ObjectMeta {
                &mut self.metadata
            }

            fn set_type_meta(&mut self) {
                self.api_version = $api_version.to_string();
                self.kind = $kind.to_string();
            }

            fn replace_status(&mut self, other: &Self) {
                let replace = $replace;
                replace(self, other);
            }
        }
    };
}

pub(crate) use impl_object;
