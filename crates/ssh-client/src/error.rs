//! Remote execution errors

use thiserror::Error;

/// Errors that can occur while talking to a remote host
#[derive(Debug, Error)]
pub enum SshError {
    /// The client private key could not be parsed
    #[error("Private key error: {0}")]
    KeyParse(String),

    /// One of the configured host public keys could not be parsed
    #[error("Host public key error: {key}: {message}")]
    PublicKeyParse {
        /// The offending key as configured
        key: String,
        /// Parser message
        message: String,
    },

    /// TCP connect or SSH handshake failed
    #[error("Dial error: {host}:{port}: {message}")]
    Dial {
        /// Target host
        host: String,
        /// Target port
        port: u16,
        /// Underlying failure
        message: String,
    },

    /// The session failed mid-operation
    #[error("Transport error: {0}")]
    Transport(#[from] russh::Error),

    /// The server refused the client key
    #[error("Authentication failed: {username}@{host}")]
    Authentication {
        /// Target host
        host: String,
        /// Login user
        username: String,
    },

    /// None of the configured public keys matches the server's host key
    #[error("Host key mismatch: {host} presented {fingerprint}, which matches no configured public key")]
    HostKeyMismatch {
        /// Target host
        host: String,
        /// SHA-256 fingerprint of the key the server presented
        fingerprint: String,
    },

    /// A remote command exited non-zero
    #[error(
        "Remote command failed on {host} with exit status {status}: {command}\nstdout:\n{stdout}\nstderr:\n{stderr}"
    )]
    RemoteExit {
        /// Host the command ran on
        host: String,
        /// The command as issued
        command: String,
        /// Exit status
        status: u32,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// A remote file does not exist
    #[error("Not found: {path} on {host}")]
    NotFound {
        /// Host that was asked
        host: String,
        /// Missing path
        path: String,
    },
}
