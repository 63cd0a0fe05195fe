//! Object model errors

use thiserror::Error;

/// Errors raised while interpreting or validating objects
#[derive(Debug, Error)]
pub enum ObjectError {
    /// A secret lacks a key its shape requires
    #[error("secret {secret} has no key {key}")]
    MissingKey {
        /// Secret name
        secret: String,
        /// Missing key
        key: String,
    },

    /// A secret value that must be text is not valid UTF-8
    #[error("secret {secret} key {key} is not valid UTF-8")]
    InvalidUtf8 {
        /// Secret name
        secret: String,
        /// Offending key
        key: String,
    },

    /// A port outside [1, 65535] or one that does not parse
    #[error("invalid port {0}: must be in [1, 65535]")]
    InvalidPort(String),

    /// An object violates one of its invariants
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON encoding/decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
