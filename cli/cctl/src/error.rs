//! cctl error types.
//!
//! Library errors convert in unchanged so the operator sees the failing remote
//! command with its output, or the offending state file, as reported.

use objects::ObjectError;
use pki::PkiError;
use ssh_client::SshError;
use state::{ArchiveError, MigrationError, StateError, StoreError};
use thiserror::Error;

/// Errors that can occur while running a cctl command.
#[derive(Debug, Error)]
pub enum CctlError {
    /// Remote execution error
    #[error("SSH error: {0}")]
    Ssh(#[from] SshError),

    /// Object store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// State file error
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    /// Backup archive error
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Key material error
    #[error("PKI error: {0}")]
    Pki(#[from] PkiError),

    /// Object validation or decoding error
    #[error("Object error: {0}")]
    Object(#[from] ObjectError),

    /// Something the command needs is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Something the command would create is already there
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// An invariant would be violated
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid command line or settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Local filesystem error outside the state file and archive
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// YAML encoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
