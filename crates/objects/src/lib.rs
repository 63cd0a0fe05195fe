//! cctl Object Model
//!
//! Typed entities held by the cctl object store and persisted in the state file.
//!
//! Every entity shares the Kubernetes object envelope (`apiVersion`, `kind`,
//! `metadata`) and is addressed by `(namespace, name)`. References between
//! entities are names, resolved by lookup in the store.
//!
//! - [`Secret`]: opaque byte maps (SSH credential, CA bundles, service-account keys, bootstrap token)
//! - [`Cluster`]: the single logical cluster, its networks, CA references and observed etcd members
//! - [`Machine`]: a declared master or node
//! - [`ProvisionedMachine`]: a reachable host a machine can be bound to

pub mod cluster;
pub mod cluster_config;
pub mod config_map;
pub mod error;
pub mod etcd;
pub mod machine;
pub mod meta;
pub mod provisioned_machine;
pub mod secret;
pub mod versions;

pub use cluster::*;
pub use cluster_config::*;
pub use config_map::ConfigMap;
pub use error::ObjectError;
pub use etcd::*;
pub use machine::*;
pub use meta::*;
pub use provisioned_machine::*;
pub use secret::*;
