use std::fmt;

use ring::rand::SystemRandom;
use ring::signature::{RSA_PKCS1_SHA256, RsaKeyPair};

use super::KeyError;
use crate::error::SigningError;

/// Signs canonical request strings with the merchant private key.
pub trait MerchantSigner: Send + Sync + fmt::Debug {
    /// Serial number of the merchant certificate the key belongs to.
    fn serial_no(&self) -> &str;

    /// Signs `message`, returning the raw signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the signing primitive fails.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// RSA PKCS#1 v1.5 SHA-256 signer over an in-memory private key.
pub struct RsaSha256Signer {
    key_pair: RsaKeyPair,
    serial_no: String,
    rng: SystemRandom,
}

impl RsaSha256Signer {
    /// Loads a private key from PEM.
    ///
    /// Accepts PKCS#8 (`PRIVATE KEY`) and PKCS#1 (`RSA PRIVATE KEY`) blocks.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the PEM is invalid or `ring` rejects the key.
    pub fn from_pem(pem_text: &str, serial_no: impl Into<String>) -> Result<Self, KeyError> {
        let block = pem::parse(pem_text.trim())?;
        let key_pair = match block.tag() {
            "PRIVATE KEY" => RsaKeyPair::from_pkcs8(block.contents()),
            "RSA PRIVATE KEY" => RsaKeyPair::from_der(block.contents()),
            other => return Err(KeyError::UnsupportedTag(other.to_owned())),
        }
        .map_err(|e| KeyError::Rejected(e.to_string()))?;
        Ok(Self {
            key_pair,
            serial_no: serial_no.into(),
            rng: SystemRandom::new(),
        })
    }
}

impl fmt::Debug for RsaSha256Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaSha256Signer")
            .field("serial_no", &self.serial_no)
            .field("modulus_bits", &(self.key_pair.public().modulus_len() * 8))
            .finish_non_exhaustive()
    }
}

impl MerchantSigner for RsaSha256Signer {
    fn serial_no(&self) -> &str {
        &self.serial_no
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(&RSA_PKCS1_SHA256, &self.rng, message, &mut signature)
            .map_err(|_| SigningError::Sign("RSA-SHA256 signing failed".to_owned()))?;
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Base64Bytes;
    use crate::testing::fixtures;

    #[test]
    fn test_signature_matches_openssl() {
        let signer = RsaSha256Signer::from_pem(fixtures::MERCHANT_PRIVATE_KEY, "MERCHANT01").unwrap();
        let message = "GET\n/v3/certificates\n1554208460\n593BEC0C930BF1AFEB40B4A08C8FB242\n\n";
        let signature = signer.sign(message.as_bytes()).unwrap();
        assert_eq!(
            Base64Bytes::encode(signature).as_str(),
            fixtures::MERCHANT_GOLDEN_SIGNATURE
        );
        assert_eq!(signer.serial_no(), "MERCHANT01");
    }

    #[test]
    fn test_rejects_public_key_pem() {
        let err = RsaSha256Signer::from_pem(fixtures::PLATFORM_PUBLIC_KEY, "X").unwrap_err();
        assert_eq!(err, KeyError::UnsupportedTag("PUBLIC KEY".to_owned()));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            RsaSha256Signer::from_pem("not a pem", "X").unwrap_err(),
            KeyError::Pem(_)
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = RsaSha256Signer::from_pem(fixtures::MERCHANT_PRIVATE_KEY, "S").unwrap();
        let debug = format!("{signer:?}");
        assert!(debug.contains("modulus_bits: 2048"));
    }
}
