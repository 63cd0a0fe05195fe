//! Bootstrap tokens
//!
//! Nodes join with a token and the pin of the API server CA. Both come from the
//! join command printed by `kubeadm token create --print-join-command` on a
//! master, which has the shape
//!
//! ```text
//! kubeadm join <endpoint> --token <token> --discovery-token-ca-cert-hash <hash>
//! ```

use crate::error::PkiError;
use objects::{CA_HASH_KEY, OPAQUE_SECRET_TYPE, Secret, TOKEN_KEY};

/// Token id and secret lengths, e.g. `abcdef.0123456789abcdef`
const TOKEN_ID_LEN: usize = 6;
const TOKEN_SECRET_LEN: usize = 16;

/// Word count of a join command
const JOIN_COMMAND_WORDS: usize = 7;

/// A token and the CA pin it is valid against
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapToken {
    /// `abcdef.0123456789abcdef`
    pub token: String,
    /// `sha256:<hex>`
    pub ca_hash: String,
}

impl std::fmt::Debug for BootstrapToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapToken")
            .field("token", &"<redacted>")
            .field("ca_hash", &self.ca_hash)
            .finish()
    }
}

impl BootstrapToken {
    /// Parse a printed join command
    pub fn parse_join_command(output: &str) -> Result<Self, PkiError> {
        let reject = |reason: &str| PkiError::JoinCommand {
            output: output.trim().to_string(),
            reason: reason.to_string(),
        };

        let words: Vec<&str> = output.split_whitespace().collect();
        if words.len() != JOIN_COMMAND_WORDS {
            return Err(reject(&format!(
                "expected {} words, found {}",
                JOIN_COMMAND_WORDS,
                words.len()
            )));
        }
        if words[3] != "--token" || words[5] != "--discovery-token-ca-cert-hash" {
            return Err(reject("missing --token or --discovery-token-ca-cert-hash"));
        }

        let token = words[4];
        if !is_valid_token(token) {
            return Err(reject("malformed token"));
        }
        let ca_hash = words[6];
        if !is_valid_ca_hash(ca_hash) {
            return Err(reject("malformed CA hash"));
        }

        Ok(Self {
            token: token.to_string(),
            ca_hash: ca_hash.to_string(),
        })
    }

    /// Read the token from its secret; `None` while the secret is still empty
    pub fn from_secret(secret: &Secret) -> Result<Option<Self>, PkiError> {
        if secret.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            token: secret.get_str(TOKEN_KEY)?.to_string(),
            ca_hash: secret.get_str(CA_HASH_KEY)?.to_string(),
        }))
    }

    /// Store the token in `secret`, replacing whatever it held
    pub fn apply_to(&self, secret: &mut Secret) {
        secret.secret_type = Some(OPAQUE_SECRET_TYPE.to_string());
        secret.data.clear();
        secret.data.insert(TOKEN_KEY.to_string(), self.token.clone().into_bytes());
        secret
            .data
            .insert(CA_HASH_KEY.to_string(), self.ca_hash.clone().into_bytes());
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_valid_token(token: &str) -> bool {
    match token.split_once('.') {
        Some((id, secret)) => {
            id.len() == TOKEN_ID_LEN
                && secret.len() == TOKEN_SECRET_LEN
                && id.chars().all(is_token_char)
                && secret.chars().all(is_token_char)
        }
        None => false,
    }
}

fn is_valid_ca_hash(hash: &str) -> bool {
    hash.strip_prefix("sha256:")
        .is_some_and(|hex| hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
