//! Platform certificates and SPKI public keys.
//!
//! `ring` verifies against a bare PKCS#1 `RSAPublicKey`, while gateways hand
//! out SPKI `PUBLIC KEY` blocks or full X.509 certificates.

use x509_parser::objects::{oid_registry, oid2abbrev};
use x509_parser::oid_registry::OID_PKCS1_RSAENCRYPTION;
use x509_parser::parse_x509_certificate;
use x509_parser::prelude::{FromDer, SubjectPublicKeyInfo, X509Name};

use super::KeyError;

/// The identifiers and RSA key of a parsed platform certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCertificate {
    serial: String,
    cert_sn: String,
    public_key: Vec<u8>,
}

impl PlatformCertificate {
    /// Parses a `CERTIFICATE` PEM block.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the PEM is not a certificate, the DER does not
    /// parse, or the key is not RSA.
    pub fn from_pem(pem_text: &str) -> Result<Self, KeyError> {
        let block = pem::parse(pem_text.trim())?;
        if block.tag() != "CERTIFICATE" {
            return Err(KeyError::UnsupportedTag(block.tag().to_owned()));
        }
        Self::from_der(block.contents())
    }

    /// Parses a DER-encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Malformed`] if the certificate does not parse and
    /// [`KeyError::Rejected`] if its key is not RSA.
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        let (_, cert) =
            parse_x509_certificate(der).map_err(|err| KeyError::Malformed(err.to_string()))?;
        let tbs = &cert.tbs_certificate;
        let serial = tbs.serial.to_str_radix(16).to_uppercase();
        let cert_sn = format!(
            "{:x}",
            md5::compute(format!("{}{}", issuer_string(&tbs.issuer), tbs.serial))
        );
        let public_key = rsa_public_key(&tbs.subject_pki)?;
        Ok(Self {
            serial,
            cert_sn,
            public_key,
        })
    }

    /// Serial number as upper-case hex without leading zeros.
    ///
    /// WeChat Pay names platform certificates by this value.
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// MD5 over the issuer name followed by the decimal serial, as lower-case
    /// hex.
    ///
    /// Alipay names certificates by this value in `alipay-sn` and
    /// `app_cert_sn`.
    #[must_use]
    pub fn cert_sn(&self) -> &str {
        &self.cert_sn
    }

    /// The PKCS#1 `RSAPublicKey`.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub(super) fn into_public_key(self) -> Vec<u8> {
        self.public_key
    }
}

/// Extracts the PKCS#1 `RSAPublicKey` from a DER `SubjectPublicKeyInfo`.
pub(super) fn rsa_public_key_from_spki(der: &[u8]) -> Result<Vec<u8>, KeyError> {
    let (_, spki) =
        SubjectPublicKeyInfo::from_der(der).map_err(|err| KeyError::Malformed(err.to_string()))?;
    rsa_public_key(&spki)
}

fn rsa_public_key(spki: &SubjectPublicKeyInfo<'_>) -> Result<Vec<u8>, KeyError> {
    if spki.algorithm.algorithm != OID_PKCS1_RSAENCRYPTION {
        return Err(KeyError::Rejected(format!(
            "not an RSA key: {}",
            spki.algorithm.algorithm
        )));
    }
    Ok(spki.subject_public_key.data.to_vec())
}

/// Renders a distinguished name most-specific RDN first, e.g.
/// `CN=Root,O=Example,C=CN`.
fn issuer_string(name: &X509Name<'_>) -> String {
    let rdns: Vec<String> = name
        .iter_rdn()
        .map(|rdn| {
            rdn.iter()
                .map(|attr| {
                    let key = oid2abbrev(attr.attr_type(), oid_registry())
                        .map_or_else(|_| attr.attr_type().to_id_string(), str::to_owned);
                    let value = attr.as_str().unwrap_or_default();
                    format!("{key}={value}")
                })
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect();
    rdns.into_iter().rev().collect::<Vec<_>>().join(",")
}
