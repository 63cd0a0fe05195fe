//! SSH Remote Executor
//!
//! A per-host channel that runs shell commands and transfers files over an
//! authenticated SSH session with known-host verification.
//!
//! # Example
//!
//! ```no_run
//! use ssh_client::{ConnectionTarget, Connector, RemoteExecutor, SshConnector};
//!
//! # async fn example(private_key: String) -> Result<(), ssh_client::SshError> {
//! let target = ConnectionTarget {
//!     host: "10.0.0.1".to_string(),
//!     port: 22,
//!     username: "root".to_string(),
//!     private_key,
//!     public_keys: vec!["ssh-ed25519 AAAA... host".to_string()],
//!     insecure_ignore_host_key: false,
//! };
//! let exec = SshConnector.connect(&target).await?;
//!
//! // Commands run as root; a non-zero exit becomes SshError::RemoteExit
//! exec.run_checked("etcdadm info").await?;
//!
//! // Privileged destinations are staged through /tmp
//! exec.place_file("/etc/nodeadm.yaml", 0o600, b"...").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod executor_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{SshClient, SshConnector, parse_private_key, parse_public_key};
pub use error::SshError;
pub use executor_trait::{
    CommandOutput, ConnectionTarget, Connector, RemoteExecutor, shell_quote, split_words,
    staging_path,
};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockConnector, MockRemoteExecutor, RecordedCall, RecordedOp};
