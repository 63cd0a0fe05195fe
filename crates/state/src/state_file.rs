//! State file
//!
//! The versioned on-disk serialization of the object store:
//!
//! ```yaml
//! schemaVersion: 2
//! secretList:             { items: [ ... ] }
//! clusterList:            { items: [ ... ] }
//! machineList:            { items: [ ... ] }
//! provisionedMachineList: { items: [ ... ] }
//! ```
//!
//! Writes replace the whole document atomically (temp file, fsync, rename) with
//! mode 0600.

use crate::error::StateError;
use crate::store::{ObjectStore, Stored};
use objects::{Cluster, Machine, ProvisionedMachine, Secret};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Schema version this build reads and writes
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Where the state file lives unless overridden
pub const DEFAULT_STATE_PATH: &str = "/etc/cctl-state.yaml";

/// Mode of the state file
pub const STATE_FILE_MODE: u32 = 0o600;

/// A list of objects of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectList<T> {
    /// The objects
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for ObjectList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

/// The state document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFile {
    /// Schema version of the document
    #[serde(default)]
    pub schema_version: u32,

    /// Secrets
    #[serde(default)]
    pub secret_list: ObjectList<Secret>,

    /// Clusters
    #[serde(default)]
    pub cluster_list: ObjectList<Cluster>,

    /// Machines
    #[serde(default)]
    pub machine_list: ObjectList<Machine>,

    /// Provisioned machines
    #[serde(default)]
    pub provisioned_machine_list: ObjectList<ProvisionedMachine>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            secret_list: ObjectList::default(),
            cluster_list: ObjectList::default(),
            machine_list: ObjectList::default(),
            provisioned_machine_list: ObjectList::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionProbe {
    #[serde(default)]
    schema_version: u32,
}

/// Read only `schemaVersion` from a raw document
///
/// Unknown fields are ignored; a missing field or an empty document is
/// version 0.
pub fn probe_schema_version(bytes: &[u8]) -> Result<u32, StateError> {
    if is_blank(bytes) {
        return Ok(0);
    }
    let probe: VersionProbe = serde_yaml::from_slice(bytes)?;
    Ok(probe.schema_version)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

impl StateFile {
    /// Empty document at the current version
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a document at the current schema version
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Result<Self, StateError> {
        if is_blank(bytes) {
            return Ok(Self::new());
        }
        let found = probe_schema_version(bytes)?;
        if found != CURRENT_SCHEMA_VERSION {
            return Err(StateError::VersionMismatch {
                path: path.to_path_buf(),
                found,
                expected: CURRENT_SCHEMA_VERSION,
            });
        }
        Ok(serde_yaml::from_slice(bytes)?)
    }

    /// Read the document at `path`; a missing or empty file is an empty store
    pub fn read(path: &Path) -> Result<Self, StateError> {
        match fs::read(path) {
            Ok(bytes) => {
                debug!("Read {} bytes of state from {}", bytes.len(), path.display());
                Self::from_bytes(&bytes, path)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No state file at {}, starting empty", path.display());
                Ok(Self::new())
            }
            Err(source) => Err(StateError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Replace the document at `path`
    pub fn write(&self, path: &Path) -> Result<(), StateError> {
        let yaml = serde_yaml::to_string(self)?;
        write_atomic(path, yaml.as_bytes(), STATE_FILE_MODE)?;
        debug!("Wrote {} bytes of state to {}", yaml.len(), path.display());
        Ok(())
    }

    /// Snapshot every object in `store`
    pub fn from_store(store: &ObjectStore) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            secret_list: list_of(store),
            cluster_list: list_of(store),
            machine_list: list_of(store),
            provisioned_machine_list: list_of(store),
        }
    }

    /// Create every object of the document in `store`
    pub fn into_store(self, store: &mut ObjectStore) -> Result<(), StateError> {
        create_all(store, self.secret_list)?;
        create_all(store, self.cluster_list)?;
        create_all(store, self.machine_list)?;
        create_all(store, self.provisioned_machine_list)?;
        Ok(())
    }
}

fn list_of<T: Stored>(store: &ObjectStore) -> ObjectList<T> {
    ObjectList {
        items: store.list_all(),
    }
}

fn create_all<T: Stored>(store: &mut ObjectStore, list: ObjectList<T>) -> Result<(), StateError> {
    for item in list.items {
        store.create(item)?;
    }
    Ok(())
}

/// Load the state file at `path` into `store`
pub fn push_to_store(path: &Path, store: &mut ObjectStore) -> Result<(), StateError> {
    StateFile::read(path)?.into_store(store)
}

/// Write every object in `store` to the state file at `path`
pub fn pull_from_store(store: &ObjectStore, path: &Path) -> Result<(), StateError> {
    StateFile::from_store(store).write(path)
}

/// Write `contents` to `path` through a temp file in the same directory
pub(crate) fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> Result<(), StateError> {
    let io_err = |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = parent_dir(path);

    let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    temp.write_all(contents).map_err(io_err)?;
    temp.as_file()
        .set_permissions(fs::Permissions::from_mode(mode))
        .map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Directory containing `path`; `.` for bare file names
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
