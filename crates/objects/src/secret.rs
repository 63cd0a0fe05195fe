//! Secret object
//!
//! Holds opaque byte maps under string keys. Values are serialized
//! base64-encoded, matching the Kubernetes `Secret` wire shape.

use crate::error::ObjectError;
use crate::meta::{ObjectMeta, impl_object};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known name of the SSH credential secret
pub const SSH_CREDENTIAL_SECRET: &str = "sshcredential";
/// Default name of the etcd CA secret
pub const ETCD_CA_SECRET: &str = "etcd-ca";
/// Default name of the API server CA secret
pub const API_SERVER_CA_SECRET: &str = "apiserver-ca";
/// Default name of the front-proxy CA secret
pub const FRONT_PROXY_CA_SECRET: &str = "front-proxy-ca";
/// Default name of the service-account key secret
pub const SERVICE_ACCOUNT_KEY_SECRET: &str = "serviceaccount-key";
/// Default name of the bootstrap token secret
pub const BOOTSTRAP_TOKEN_SECRET: &str = "bootstrap-token";

/// SSH credential: login user
pub const USERNAME_KEY: &str = "username";
/// SSH credential: PEM private key
pub const SSH_PRIVATE_KEY_KEY: &str = "ssh-privatekey";
/// CA bundle: PEM certificate
pub const TLS_CERT_KEY: &str = "tls.crt";
/// CA bundle: PEM private key
pub const TLS_KEY_KEY: &str = "tls.key";
/// Service-account key pair: PEM private half
pub const PRIVATE_KEY_KEY: &str = "privatekey";
/// Service-account key pair: PEM public half
pub const PUBLIC_KEY_KEY: &str = "publickey";
/// Bootstrap token: `abcdef.0123456789abcdef`
pub const TOKEN_KEY: &str = "token";
/// Bootstrap token: `sha256:<hex>` CA public key pin
pub const CA_HASH_KEY: &str = "cahash";

/// Secret type of the SSH credential
pub const SSH_AUTH_SECRET_TYPE: &str = "kubernetes.io/ssh-auth";
/// Secret type of CA bundles
pub const TLS_SECRET_TYPE: &str = "kubernetes.io/tls";
/// Secret type of everything else
pub const OPAQUE_SECRET_TYPE: &str = "Opaque";

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Secret".to_string()
}

/// A named map of opaque byte values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// Always "v1"
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Always "Secret"
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Object metadata
    pub metadata: ObjectMeta,

    /// Secret type hint (e.g. "kubernetes.io/tls")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,

    /// Secret payload
    #[serde(default, with = "base64_data", skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Vec<u8>>,
}

impl_object!(Secret, "Secret", "v1");

impl Secret {
    /// Create an empty secret
    pub fn new(name: impl Into<String>, secret_type: &str) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::new(name),
            secret_type: Some(secret_type.to_string()),
            data: BTreeMap::new(),
        }
    }

    /// Builder-style insert of one key
    #[must_use]
    pub fn with_data(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Whether the secret carries no data yet
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw bytes under `key`
    pub fn get(&self, key: &str) -> Result<&[u8], ObjectError> {
        self.data
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| ObjectError::MissingKey {
                secret: self.metadata.name.clone(),
                key: key.to_string(),
            })
    }

    /// UTF-8 text under `key`
    pub fn get_str(&self, key: &str) -> Result<&str, ObjectError> {
        let bytes = self.get(key)?;
        std::str::from_utf8(bytes).map_err(|_| ObjectError::InvalidUtf8 {
            secret: self.metadata.name.clone(),
            key: key.to_string(),
        })
    }
}

/// SSH login material read from the credential secret
#[derive(Clone, PartialEq, Eq)]
pub struct SshCredential {
    /// Login user
    pub username: String,
    /// PEM private key
    pub private_key: String,
}

impl std::fmt::Debug for SshCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshCredential")
            .field("username", &self.username)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl SshCredential {
    /// Build the credential secret
    pub fn into_secret(self, name: &str) -> Secret {
        Secret::new(name, SSH_AUTH_SECRET_TYPE)
            .with_data(USERNAME_KEY, self.username)
            .with_data(SSH_PRIVATE_KEY_KEY, self.private_key)
    }

    /// Read the credential back out of its secret
    pub fn from_secret(secret: &Secret) -> Result<Self, ObjectError> {
        Ok(Self {
            username: secret.get_str(USERNAME_KEY)?.to_string(),
            private_key: secret.get_str(SSH_PRIVATE_KEY_KEY)?.to_string(),
        })
    }
}

mod base64_data {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(data: &BTreeMap<String, Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(data.iter().map(|(k, v)| (k, STANDARD.encode(v))))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = BTreeMap::<String, String>::deserialize(deserializer)?;
        encoded
            .into_iter()
            .map(|(k, v)| {
                STANDARD
                    .decode(v.as_bytes())
                    .map(|bytes| (k.clone(), bytes))
                    .map_err(|e| D::Error::custom(format!("key {}: {}", k, e)))
            })
            .collect()
    }
}
