//! Self-signed certificate authorities

use crate::error::PkiError;
use crate::key::{generate_rsa_key, private_key_pem, public_key_pin};
use chrono::{Datelike, Months, Utc};
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair, KeyUsagePurpose,
};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use tracing::debug;

/// How long a generated CA stays valid
pub const CA_VALIDITY_YEARS: u32 = 10;

/// PEM certificate and private key of one CA
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateAuthority {
    /// PEM certificate
    pub cert_pem: String,
    /// PKCS#1 PEM private key
    pub key_pem: String,
    /// `sha256:<hex>` pin of the public key
    pub public_key_pin: String,
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("public_key_pin", &self.public_key_pin)
            .field("key_pem", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Generate a self-signed CA named `common_name`
pub fn generate_ca(common_name: &str) -> Result<CertificateAuthority, PkiError> {
    let key = generate_rsa_key()?;
    let pkcs8 = key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| PkiError::Key(e.to_string()))?;
    let signing_key = KeyPair::from_pem_and_sign_algo(&pkcs8, &rcgen::PKCS_RSA_SHA256)?;

    let mut params = CertificateParams::new(Vec::<String>::new())?;
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    params.distinguished_name = name;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];

    let today = Utc::now().date_naive();
    let expiry = today
        .checked_add_months(Months::new(CA_VALIDITY_YEARS * 12))
        .unwrap_or(today);
    params.not_before = rcgen::date_time_ymd(today.year(), today.month() as u8, today.day() as u8);
    params.not_after = rcgen::date_time_ymd(expiry.year(), expiry.month() as u8, expiry.day() as u8);

    let cert = params.self_signed(&signing_key)?;
    debug!("Generated CA {}", common_name);

    Ok(CertificateAuthority {
        cert_pem: cert.pem(),
        key_pem: private_key_pem(&key)?,
        public_key_pin: public_key_pin(&key.to_public_key())?,
    })
}
