//! State errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the in-memory object store
#[derive(Debug, Error)]
pub enum StoreError {
    /// A create collided with an existing (namespace, name)
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        /// Object kind
        kind: &'static str,
        /// Namespace
        namespace: String,
        /// Name
        name: String,
    },

    /// The addressed object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        /// Object kind
        kind: &'static str,
        /// Namespace
        namespace: String,
        /// Name
        name: String,
    },
}

/// Errors raised while reading or writing the state file
#[derive(Debug, Error)]
pub enum StateError {
    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// The document is not valid YAML or does not match the schema
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document is at a schema version this build does not load directly
    #[error(
        "state file {path} is at schema version {found}, expected {expected}; run `cctl migrate` first"
    )]
    VersionMismatch {
        /// State file
        path: PathBuf,
        /// Version found in the file
        found: u32,
        /// Version this build reads
        expected: u32,
    },

    /// Loading the document into the store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised while migrating a state document
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The document is newer than this build
    #[error(
        "state file schema version {found} is newer than supported version {current}; downgrades are not supported"
    )]
    UnsupportedVersion {
        /// Version found
        found: u32,
        /// Newest version this build knows
        current: u32,
    },

    /// No step starts at this version
    #[error("no migration from schema version {0}")]
    NoMigration(u32),

    /// The document does not have the shape a step expects
    #[error("Malformed state document: {0}")]
    Malformed(String),

    /// YAML decoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading or writing the state file failed
    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Errors raised while creating or extracting a backup archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Filesystem or codec error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// The archive holds an entry other than the two known ones
    #[error("unexpected archive entry {0}")]
    UnexpectedEntry(String),

    /// The archive lacks one of the two known entries
    #[error("archive has no {0} entry")]
    MissingEntry(&'static str),
}
