//! `cctl backup` and `cctl restore`

use crate::cli::{BackupArgs, RestoreArgs};
use crate::error::CctlError;
use crate::settings::Settings;
use state::{StateFile, archive};
use tracing::info;

/// Archive the state file together with a snapshot taken earlier
pub fn backup(args: &BackupArgs, settings: &Settings) -> Result<(), CctlError> {
    // Refuse to archive a state file this version cannot read
    StateFile::read(&settings.state_path)?;
    archive::create(&settings.state_path, &args.snapshot, &args.archive)?;
    Ok(())
}

/// Unpack an archive over the state file; the snapshot lands at `--snapshot`
///
/// The restored state is not checked against the current schema; run
/// `cctl migrate` afterwards if it is older.
pub fn restore(args: &RestoreArgs, settings: &Settings) -> Result<(), CctlError> {
    archive::extract(&args.archive, &settings.state_path, &args.snapshot)?;
    info!(
        "Restored state to {}; recover etcd from {} with `cctl recover etcd`",
        settings.state_path.display(),
        args.snapshot.display()
    );
    Ok(())
}
