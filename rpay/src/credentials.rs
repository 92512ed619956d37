//! Merchant and platform key material.

use std::sync::Arc;

use crate::crypto::{MerchantSigner, PlatformVerifier};
use crate::error::{SigningError, VerificationError};

/// Key material for one merchant account.
///
/// Built once when the client is constructed and shared read-only by every
/// call through an `Arc`.
#[derive(Debug, Clone)]
pub struct Credentials {
    merchant_id: String,
    signer: Option<Arc<dyn MerchantSigner>>,
    verifier: Option<Arc<dyn PlatformVerifier>>,
}

impl Credentials {
    /// Credentials for `merchant_id` with no keys attached yet.
    ///
    /// For WeChat Pay this is the `mchid`, for Alipay the `app_id`.
    #[must_use]
    pub fn new(merchant_id: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            signer: None,
            verifier: None,
        }
    }

    /// Attaches the merchant signing key.
    #[must_use]
    pub fn with_signer(mut self, signer: impl MerchantSigner + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Attaches the platform keys used to check response signatures.
    #[must_use]
    pub fn with_verifier(mut self, verifier: impl PlatformVerifier + 'static) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    /// The merchant identifier.
    #[must_use]
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// The merchant signer.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::MissingKey`] if none is configured.
    pub fn signer(&self) -> Result<&dyn MerchantSigner, SigningError> {
        self.signer.as_deref().ok_or(SigningError::MissingKey)
    }

    /// The platform verifier.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::NotConfigured`] if none is configured.
    pub fn verifier(&self) -> Result<&dyn PlatformVerifier, VerificationError> {
        self.verifier
            .as_deref()
            .ok_or(VerificationError::NotConfigured)
    }
}
