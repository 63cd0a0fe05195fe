//! PKI errors

use thiserror::Error;

/// Errors raised while generating or interpreting key material
#[derive(Debug, Error)]
pub enum PkiError {
    /// RSA key generation or encoding failed
    #[error("Key error: {0}")]
    Key(String),

    /// Certificate generation failed
    #[error("Certificate error: {0}")]
    Certificate(#[from] rcgen::Error),

    /// The node installer printed something other than a join command
    #[error("Unexpected join command {output:?}: {reason}")]
    JoinCommand {
        /// What was printed
        output: String,
        /// Why it was rejected
        reason: String,
    },

    /// A secret does not hold what its shape requires
    #[error("Object error: {0}")]
    Object(#[from] objects::ObjectError),
}
