//! Backup archives
//!
//! A backup is a gzip-compressed tarball with exactly two entries at its root:
//! the state file as `state.yaml` and an etcd snapshot as `etcd.snapshot`.

use crate::error::ArchiveError;
use crate::state_file::{STATE_FILE_MODE, parent_dir};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

/// Archive entry holding the state file
pub const STATE_ENTRY: &str = "state.yaml";

/// Archive entry holding the etcd snapshot
pub const SNAPSHOT_ENTRY: &str = "etcd.snapshot";

/// Mode of an extracted snapshot
const SNAPSHOT_MODE: u32 = 0o600;

fn io_error(path: &Path) -> impl Fn(io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Bundle `state` and `snapshot` into the archive at `archive`
///
/// The archive is assembled next to its destination and renamed into place, so
/// a failed run leaves no partial archive behind.
pub fn create(state: &Path, snapshot: &Path, archive: &Path) -> Result<(), ArchiveError> {
    let staging = TempDir::new().map_err(io_error(Path::new("temporary directory")))?;
    let staged_state = staging.path().join(STATE_ENTRY);
    let staged_snapshot = staging.path().join(SNAPSHOT_ENTRY);
    fs::copy(state, &staged_state).map_err(io_error(state))?;
    fs::copy(snapshot, &staged_snapshot).map_err(io_error(snapshot))?;

    let output = NamedTempFile::new_in(parent_dir(archive)).map_err(io_error(archive))?;
    let encoder = GzEncoder::new(output.reopen().map_err(io_error(archive))?, Compression::default());
    let mut tarball = tar::Builder::new(encoder);
    tarball
        .append_path_with_name(&staged_state, STATE_ENTRY)
        .map_err(io_error(&staged_state))?;
    tarball
        .append_path_with_name(&staged_snapshot, SNAPSHOT_ENTRY)
        .map_err(io_error(&staged_snapshot))?;
    let encoder = tarball.into_inner().map_err(io_error(archive))?;
    let file = encoder.finish().map_err(io_error(archive))?;
    file.sync_all().map_err(io_error(archive))?;

    output
        .persist(archive)
        .map_err(|e| io_error(archive)(e.error))?;
    info!(
        "Wrote archive {} from {} and {}",
        archive.display(),
        state.display(),
        snapshot.display()
    );
    Ok(())
}

/// Unpack `archive`, placing the state file at `state_dest` and the snapshot at
/// `snapshot_dest`
///
/// Entries other than the two known ones are rejected. Nothing is written to
/// the destinations unless both entries were extracted.
pub fn extract(archive: &Path, state_dest: &Path, snapshot_dest: &Path) -> Result<(), ArchiveError> {
    let staging = TempDir::new().map_err(io_error(Path::new("temporary directory")))?;
    let file = File::open(archive).map_err(io_error(archive))?;
    let mut tarball = tar::Archive::new(GzDecoder::new(file));

    let mut extracted: Vec<&'static str> = Vec::new();
    for entry in tarball.entries().map_err(io_error(archive))? {
        let mut entry = entry.map_err(io_error(archive))?;
        let entry_path = entry.path().map_err(io_error(archive))?.into_owned();
        let name = [STATE_ENTRY, SNAPSHOT_ENTRY]
            .into_iter()
            .find(|known| entry_path == Path::new(known))
            .ok_or_else(|| ArchiveError::UnexpectedEntry(entry_path.display().to_string()))?;

        let target = staging.path().join(name);
        entry.unpack(&target).map_err(io_error(&target))?;
        debug!("Extracted {} from {}", name, archive.display());
        extracted.push(name);
    }

    for required in [STATE_ENTRY, SNAPSHOT_ENTRY] {
        if !extracted.contains(&required) {
            return Err(ArchiveError::MissingEntry(required));
        }
    }

    install(&staging.path().join(STATE_ENTRY), state_dest, STATE_FILE_MODE)?;
    install(&staging.path().join(SNAPSHOT_ENTRY), snapshot_dest, SNAPSHOT_MODE)?;
    info!(
        "Restored {} and {} from {}",
        state_dest.display(),
        snapshot_dest.display(),
        archive.display()
    );
    Ok(())
}

/// Copy `src` over `dest` through a temp file next to `dest`
fn install(src: &Path, dest: &Path, mode: u32) -> Result<(), ArchiveError> {
    let dir: PathBuf = parent_dir(dest);
    let mut temp = NamedTempFile::new_in(&dir).map_err(io_error(dest))?;
    let mut source = File::open(src).map_err(io_error(src))?;
    io::copy(&mut source, temp.as_file_mut()).map_err(io_error(dest))?;
    temp.as_file()
        .set_permissions(fs::Permissions::from_mode(mode))
        .map_err(io_error(dest))?;
    temp.as_file().sync_all().map_err(io_error(dest))?;
    temp.persist(dest).map_err(|e| io_error(dest)(e.error))?;
    Ok(())
}
