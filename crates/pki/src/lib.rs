//! cctl Key Material
//!
//! Generates the cluster's trust roots and signing keys, and interprets the
//! bootstrap token printed by a master.
//!
//! - [`ca_secret`]: self-signed RSA CA as a `kubernetes.io/tls` secret
//! - [`service_account_secret`]: RSA key pair for service-account token signing
//! - [`bootstrap_token_secret`]: empty placeholder filled in after the first master
//! - [`BootstrapToken`]: token and CA pin parsed from a join command
//!
//! All keys are 2048-bit RSA; private keys are PKCS#1 PEM.

pub mod bootstrap_token;
pub mod ca;
pub mod error;
pub mod key;
pub mod secrets;

pub use bootstrap_token::BootstrapToken;
pub use ca::{CertificateAuthority, generate_ca};
pub use error::PkiError;
pub use key::{pin_of_private_key_pem, public_key_pin};
pub use secrets::{bootstrap_token_secret, ca_secret, service_account_secret};

#[cfg(test)]
mod pki_test;
