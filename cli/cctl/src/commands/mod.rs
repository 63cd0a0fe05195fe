//! Top-level commands
//!
//! Every command that touches the store loads the state file into a fresh
//! [`ObjectStore`] at start and writes the store back at the end. In between
//! the store is authoritative.

mod backup;
mod create;
mod delete;
mod etcd;
mod get;
mod migrate;

use crate::cli::Command;
use crate::error::CctlError;
use crate::settings::Settings;
use ssh_client::Connector;
use state::{ObjectStore, pull_from_store, push_to_store};
use std::path::{Path, PathBuf};
use tracing::error;

/// Run one parsed command
pub async fn run(command: Command, settings: &Settings, connector: &dyn Connector) -> Result<(), CctlError> {
    match command {
        Command::Create(create) => create::run(create, settings, connector).await,
        Command::Delete(delete) => delete::run(delete, settings, connector).await,
        Command::Get(args) => get::run(&args, settings),
        Command::Snapshot(snapshot) => etcd::snapshot(snapshot, settings, connector).await,
        Command::Recover(recover) => etcd::recover(recover, settings, connector).await,
        Command::Backup(args) => backup::backup(&args, settings),
        Command::Restore(args) => backup::restore(&args, settings),
        Command::Migrate => migrate::run(settings),
    }
}

/// The store loaded from a state file, written back on [`Session::close`]
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    pub store: ObjectStore,
}

impl Session {
    /// Load the state file at `path`
    pub fn open(path: &Path) -> Result<Self, CctlError> {
        let mut store = ObjectStore::new();
        push_to_store(path, &mut store)?;
        Ok(Self {
            path: path.to_path_buf(),
            store,
        })
    }

    /// Write the store back and pass `result` through
    ///
    /// The store is written even when the command failed, so whatever hosts
    /// reported before the failure is kept. A failed write is reported unless
    /// the command already failed, in which case the command's error wins.
    pub fn close<T>(self, result: Result<T, CctlError>) -> Result<T, CctlError> {
        match (result, pull_from_store(&self.store, &self.path)) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(write_error)) => Err(write_error.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(write_error)) => {
                error!("Failed to write state to {}: {}", self.path.display(), write_error);
                Err(e)
            }
        }
    }
}
