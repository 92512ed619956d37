use std::collections::HashMap;
use std::fmt;

use ring::signature::{RSA_PKCS1_2048_8192_SHA256, UnparsedPublicKey};

use super::KeyError;
use super::certificate::{PlatformCertificate, rsa_public_key_from_spki};
use crate::error::VerificationError;

/// Checks response signatures against the platform's public keys.
pub trait PlatformVerifier: Send + Sync + fmt::Debug {
    /// Verifies `signature` over `message` with the key registered for `serial`.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::UnknownSerial`] when no key matches the
    /// serial and [`VerificationError::Mismatch`] when the signature is wrong.
    fn verify(&self, serial: &str, message: &[u8], signature: &[u8])
    -> Result<(), VerificationError>;
}

/// Platform public keys indexed by certificate serial number.
///
/// Gateways rotate their signing certificates, so more than one key may be
/// live at once; the serial in the response header picks the key.
#[derive(Clone, Default)]
pub struct PlatformKeys {
    keys: HashMap<String, Vec<u8>>,
}

impl PlatformKeys {
    /// Creates an empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a `PUBLIC KEY` (SPKI) or `RSA PUBLIC KEY` (PKCS#1) PEM under
    /// `serial`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the PEM cannot be parsed.
    pub fn insert_public_key_pem(
        &mut self,
        serial: impl Into<String>,
        pem_text: &str,
    ) -> Result<(), KeyError> {
        let block = pem::parse(pem_text.trim())?;
        let pkcs1 = match block.tag() {
            "PUBLIC KEY" => rsa_public_key_from_spki(block.contents())?,
            "RSA PUBLIC KEY" => block.contents().to_vec(),
            other => return Err(KeyError::UnsupportedTag(other.to_owned())),
        };
        self.keys.insert(serial.into(), pkcs1);
        Ok(())
    }

    /// Registers the key of a platform certificate, keyed by the serial
    /// number read from the certificate itself. Returns that serial.
    ///
    /// Alipay responses name the certificate by its SN instead; register
    /// those with [`insert_certificate`](Self::insert_certificate).
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the PEM or certificate cannot be parsed.
    pub fn insert_certificate_pem(&mut self, pem_text: &str) -> Result<String, KeyError> {
        let cert = PlatformCertificate::from_pem(pem_text)?;
        let serial = cert.serial().to_owned();
        self.insert_certificate(serial.clone(), cert);
        Ok(serial)
    }

    /// Registers the key of `cert` under `serial`.
    pub fn insert_certificate(&mut self, serial: impl Into<String>, cert: PlatformCertificate) {
        self.keys.insert(serial.into(), cert.into_public_key());
    }

    /// Removes the key registered under `serial`, returning whether one existed.
    pub fn remove(&mut self, serial: &str) -> bool {
        self.keys.remove(serial).is_some()
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Registered serials in no particular order.
    pub fn serials(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

impl fmt::Debug for PlatformKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut serials: Vec<_> = self.serials().collect();
        serials.sort_unstable();
        f.debug_struct("PlatformKeys")
            .field("serials", &serials)
            .finish()
    }
}

impl PlatformVerifier for PlatformKeys {
    fn verify(
        &self,
        serial: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), VerificationError> {
        let key = self
            .keys
            .get(serial)
            .ok_or_else(|| VerificationError::UnknownSerial(serial.to_owned()))?;
        UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, key)
            .verify(message, signature)
            .map_err(|_| VerificationError::Mismatch {
                serial: serial.to_owned(),
            })
    }
}
