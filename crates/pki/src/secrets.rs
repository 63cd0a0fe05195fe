//! Builders for the cluster's secret objects

use crate::ca::generate_ca;
use crate::error::PkiError;
use crate::key::{generate_rsa_key, private_key_pem, public_key_pem};
use objects::{
    OPAQUE_SECRET_TYPE, PRIVATE_KEY_KEY, PUBLIC_KEY_KEY, Secret, TLS_CERT_KEY, TLS_KEY_KEY,
    TLS_SECRET_TYPE,
};
use tracing::info;

/// Secret holding a fresh self-signed CA under `tls.crt` and `tls.key`
pub fn ca_secret(name: &str, common_name: &str) -> Result<Secret, PkiError> {
    let ca = generate_ca(common_name)?;
    info!("Generated CA secret {} ({})", name, ca.public_key_pin);
    Ok(Secret::new(name, TLS_SECRET_TYPE)
        .with_data(TLS_CERT_KEY, ca.cert_pem)
        .with_data(TLS_KEY_KEY, ca.key_pem))
}

/// Secret holding a fresh service-account signing key pair
pub fn service_account_secret(name: &str) -> Result<Secret, PkiError> {
    let key = generate_rsa_key()?;
    info!("Generated service account key secret {}", name);
    Ok(Secret::new(name, OPAQUE_SECRET_TYPE)
        .with_data(PRIVATE_KEY_KEY, private_key_pem(&key)?)
        .with_data(PUBLIC_KEY_KEY, public_key_pem(&key.to_public_key())?))
}

/// Empty bootstrap token secret
///
/// The token is filled in from the first master once one is deployed.
pub fn bootstrap_token_secret(name: &str) -> Secret {
    Secret::new(name, OPAQUE_SECRET_TYPE)
}
