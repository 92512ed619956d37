//! RSA signing and verification primitives.
//!
//! Both gateways sign with RSA PKCS#1 v1.5 over SHA-256. The merchant side is
//! abstracted by [`MerchantSigner`] and the platform side by
//! [`PlatformVerifier`], so key material can live in an HSM or a remote
//! signing service. [`RsaSha256Signer`] and [`PlatformKeys`] are the
//! in-process implementations backed by `ring`.

mod certificate;
mod signer;
mod verifier;

pub use certificate::PlatformCertificate;
pub use signer::{MerchantSigner, RsaSha256Signer};
pub use verifier::{PlatformKeys, PlatformVerifier};

/// Errors from loading key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The input is not valid PEM.
    #[error("invalid PEM: {0}")]
    Pem(String),

    /// The PEM block type is not one this crate accepts.
    #[error("unsupported PEM block {0:?}")]
    UnsupportedTag(String),

    /// The DER structure could not be parsed.
    #[error("malformed DER: {0}")]
    Malformed(String),

    /// `ring` rejected the key.
    #[error("key rejected: {0}")]
    Rejected(String),
}

impl From<pem::PemError> for KeyError {
    fn from(err: pem::PemError) -> Self {
        Self::Pem(err.to_string())
    }
}
