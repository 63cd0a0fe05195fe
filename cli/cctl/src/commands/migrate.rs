//! `cctl migrate`

use crate::error::CctlError;
use crate::settings::Settings;
use state::{CURRENT_SCHEMA_VERSION, MigrationOutcome, migrate_file};
use tracing::info;

pub fn run(settings: &Settings) -> Result<(), CctlError> {
    match migrate_file(&settings.state_path)? {
        MigrationOutcome::UpToDate(_) => info!(
            "State file {} is already at schema version {}",
            settings.state_path.display(),
            CURRENT_SCHEMA_VERSION
        ),
        MigrationOutcome::Migrated { from, .. } => info!(
            "State file {} migrated from schema version {} to {}",
            settings.state_path.display(),
            from,
            CURRENT_SCHEMA_VERSION
        ),
    }
    Ok(())
}
