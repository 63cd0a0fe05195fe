//! cctl State
//!
//! The system of record for a cctl-managed cluster.
//!
//! - [`ObjectStore`]: in-memory collections of secrets, clusters, machines and
//!   provisioned machines, keyed by (namespace, name)
//! - [`StateFile`]: the versioned on-disk document the store is loaded from and
//!   written back to
//! - [`migrate`]: forward-only schema migrations between state file versions
//! - [`archive`]: backup archives bundling the state file with an etcd snapshot

pub mod archive;
pub mod error;
pub mod migrate;
pub mod state_file;
pub mod store;
#[cfg(test)]
mod store_test;

pub use error::{ArchiveError, MigrationError, StateError, StoreError};
pub use migrate::{MigrationOutcome, migrate_bytes, migrate_file};
pub use state_file::{
    CURRENT_SCHEMA_VERSION, DEFAULT_STATE_PATH, ObjectList, StateFile, probe_schema_version,
    pull_from_store, push_to_store,
};
pub use store::{ObjectStore, Stored};
