//! v0 -> v1: the document gains its schema version; entities are unchanged

use super::{Migration, set_schema_version};
use crate::error::MigrationError;
use serde_yaml::Value;

/// Adds `schemaVersion: 1`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddSchemaVersion;

impl Migration for AddSchemaVersion {
    fn from_version(&self) -> u32 {
        0
    }

    fn name(&self) -> &'static str {
        "add schema version"
    }

    fn forward(&self, mut document: Value) -> Result<Value, MigrationError> {
        set_schema_version(&mut document, 1)?;
        Ok(document)
    }
}
