//! Schema migrations
//!
//! Each step rewrites an untyped state document from version N to N+1. Steps
//! run in order until the document reaches [`CURRENT_SCHEMA_VERSION`], and the
//! result is then decoded into the typed [`StateFile`].
//!
//! Migrations must not assume optional keys exist: they run on documents
//! written by every earlier release.

mod v0_to_v1;
mod v1_to_v2;

pub use v0_to_v1::AddSchemaVersion;
pub use v1_to_v2::AddDefaultClusterConfig;

use crate::error::{MigrationError, StateError};
use crate::state_file::{CURRENT_SCHEMA_VERSION, StateFile, probe_schema_version};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

/// Top-level key holding the schema version
pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";

/// One forward step between adjacent schema versions
pub trait Migration {
    /// Version this step reads; it writes `from_version() + 1`
    fn from_version(&self) -> u32;

    /// Short description for logs
    fn name(&self) -> &'static str;

    /// Rewrite the document
    fn forward(&self, document: Value) -> Result<Value, MigrationError>;
}

/// Every known step, oldest first
pub fn migrations() -> Vec<Box<dyn Migration>> {
    vec![Box::new(AddSchemaVersion), Box::new(AddDefaultClusterConfig)]
}

/// Result of migrating a document
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    /// The document was already current; nothing ran
    UpToDate(StateFile),
    /// At least one step ran
    Migrated {
        /// Version the document started at
        from: u32,
        /// The migrated document
        state: StateFile,
    },
}

impl MigrationOutcome {
    /// The resulting document
    pub fn state(&self) -> &StateFile {
        match self {
            MigrationOutcome::UpToDate(state) | MigrationOutcome::Migrated { state, .. } => state,
        }
    }
}

/// Bring a raw document up to the current schema version
pub fn migrate_bytes(bytes: &[u8]) -> Result<MigrationOutcome, MigrationError> {
    let found = probe_schema_version(bytes)?;
    if found > CURRENT_SCHEMA_VERSION {
        return Err(MigrationError::UnsupportedVersion {
            found,
            current: CURRENT_SCHEMA_VERSION,
        });
    }

    let mut document = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_yaml::from_slice::<Value>(bytes)?
    };
    if document.is_null() {
        document = Value::Mapping(Mapping::new());
    }

    if found == CURRENT_SCHEMA_VERSION {
        info!("State is already at schema version {}", found);
        return Ok(MigrationOutcome::UpToDate(serde_yaml::from_value(document)?));
    }

    let steps = migrations();
    let mut version = found;
    while version < CURRENT_SCHEMA_VERSION {
        let step = steps
            .iter()
            .find(|m| m.from_version() == version)
            .ok_or(MigrationError::NoMigration(version))?;
        info!(
            "Migrating state from schema version {} to {}: {}",
            version,
            version + 1,
            step.name()
        );
        document = step.forward(document)?;
        version += 1;
    }

    Ok(MigrationOutcome::Migrated {
        from: found,
        state: serde_yaml::from_value(document)?,
    })
}

/// Migrate the state file at `path` in place
///
/// The file is rewritten only when a step ran. A missing file has nothing to
/// migrate.
pub fn migrate_file(path: &Path) -> Result<MigrationOutcome, MigrationError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("No state file at {}, nothing to migrate", path.display());
            return Ok(MigrationOutcome::UpToDate(StateFile::new()));
        }
        Err(source) => {
            return Err(StateError::Io {
                path: path.to_path_buf(),
                source,
            }
            .into());
        }
    };

    let outcome = migrate_bytes(&bytes)?;
    if let MigrationOutcome::Migrated { from, state } = &outcome {
        state.write(path)?;
        info!(
            "Migrated {} from schema version {} to {}",
            path.display(),
            from,
            state.schema_version
        );
    }
    Ok(outcome)
}

/// Set the top-level schema version of `document`
pub(crate) fn set_schema_version(document: &mut Value, version: u32) -> Result<(), MigrationError> {
    let mapping = document
        .as_mapping_mut()
        .ok_or_else(|| MigrationError::Malformed("state document is not a mapping".to_string()))?;
    mapping.insert(
        Value::String(SCHEMA_VERSION_KEY.to_string()),
        Value::Number(version.into()),
    );
    Ok(())
}

#[cfg(test)]
mod migrate_test;
