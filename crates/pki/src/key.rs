//! RSA key pairs and their encodings

use crate::error::PkiError;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::sha2::{Digest, Sha256};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt::Write;

/// Modulus size of every generated key
pub const RSA_KEY_BITS: usize = 2048;

/// Generate a fresh [`RSA_KEY_BITS`] key
pub fn generate_rsa_key() -> Result<RsaPrivateKey, PkiError> {
    RsaPrivateKey::new(&mut rand::thread_rng(), RSA_KEY_BITS).map_err(|e| PkiError::Key(e.to_string()))
}

/// PKCS#1 PEM ("RSA PRIVATE KEY") of `key`
pub fn private_key_pem(key: &RsaPrivateKey) -> Result<String, PkiError> {
    key.to_pkcs1_pem(LineEnding::LF)
        .map(|pem| pem.as_str().to_string())
        .map_err(|e| PkiError::Key(e.to_string()))
}

/// SubjectPublicKeyInfo PEM ("PUBLIC KEY") of `key`
pub fn public_key_pem(key: &RsaPublicKey) -> Result<String, PkiError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| PkiError::Key(e.to_string()))
}

/// `sha256:<hex>` digest of the DER SubjectPublicKeyInfo of `key`
///
/// This is the form nodes use to pin the API server CA when joining.
pub fn public_key_pin(key: &RsaPublicKey) -> Result<String, PkiError> {
    let der = key
        .to_public_key_der()
        .map_err(|e| PkiError::Key(e.to_string()))?;
    let digest = Sha256::digest(der.as_bytes());
    let mut pin = String::with_capacity(7 + digest.len() * 2);
    pin.push_str("sha256:");
    for byte in digest {
        let _ = write!(pin, "{:02x}", byte);
    }
    Ok(pin)
}

/// Public key pin of a PKCS#1 PEM private key
pub fn pin_of_private_key_pem(pem: &str) -> Result<String, PkiError> {
    let key = RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| PkiError::Key(e.to_string()))?;
    public_key_pin(&key.to_public_key())
}
