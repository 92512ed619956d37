//! Test helpers: key fixtures, signed mock responses and a recording transport.
//!
//! Compiled for this crate's own tests and for dependents that enable the
//! `test-util` feature.

use std::sync::{Mutex, PoisonError};

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::crypto::MerchantSigner;
use crate::dialect::Dialect;
use crate::encoding::Base64Bytes;
use crate::error::TransportError;
use crate::transport::{RawResponse, SignedRequest, Transport};

/// RSA key material under `testdata/`.
pub mod fixtures {
    use crate::credentials::Credentials;
    use crate::crypto::{PlatformCertificate, PlatformKeys, RsaSha256Signer};
    use crate::dialect::Dialect;

    /// Merchant PKCS#8 private key.
    pub const MERCHANT_PRIVATE_KEY: &str = include_str!("../../testdata/merchant_key.pem");
    /// Merchant SPKI public key.
    pub const MERCHANT_PUBLIC_KEY: &str = include_str!("../../testdata/merchant_pub.pem");
    /// Serial reported by [`merchant_signer`].
    pub const MERCHANT_SERIAL: &str = "MERCHANT01";
    /// Platform PKCS#8 private key, used to sign mock responses.
    pub const PLATFORM_PRIVATE_KEY: &str = include_str!("../../testdata/platform_key.pem");
    /// Platform SPKI public key.
    pub const PLATFORM_PUBLIC_KEY: &str = include_str!("../../testdata/platform_pub.pem");
    /// Self-signed platform certificate wrapping [`PLATFORM_PUBLIC_KEY`].
    pub const PLATFORM_CERTIFICATE: &str = include_str!("../../testdata/platform_cert.pem");
    /// Serial number of [`PLATFORM_CERTIFICATE`].
    pub const PLATFORM_SERIAL: &str = "5157F09EFDC096DE15EBE81A47057A7232F1B8E1";
    /// Certificate with an Alipay-style issuer over [`PLATFORM_PUBLIC_KEY`].
    pub const ALIPAY_CERTIFICATE: &str = include_str!("../../testdata/alipay_cert.pem");
    /// MD5 of the issuer and decimal serial of [`ALIPAY_CERTIFICATE`].
    pub const ALIPAY_CERT_SN: &str = "a04d2a014268786731282fb6506a04a5";

    /// `openssl dgst -sha256 -sign merchant_key.pem` over
    /// `GET\n/v3/certificates\n1554208460\n593BEC0C930BF1AFEB40B4A08C8FB242\n\n`.
    pub const MERCHANT_GOLDEN_SIGNATURE: &str = "jpHsVJEqXtIEyDWUiT/AcPpI4Q+WYQIZrt/IgOLm/5bgSGT3zSz1hzNeAOEfnwFDzXYdNeq6DwJ77IvQksFI43zU7wSgmGSUpXzOYfv7iv4a5ssxAkePWJ81kBxNeN7bGAQZLP7FJVYWCyJpODJ8woYo1IoPXBZWI27vvsQkVFLw8gbPzCaWogBIXNWz10AihaqSqBO0gDs/b5af3Ot//sWN78WBLURSMkRQVLCqadqW6SqyasglaggzNZMlxyTTwbbF/GvGLPQQvSUSkmnMCHAvUdUOA9zBPgtubn5GqW28ivD0INTczO7xnKAWZCz3+ETEj6To6WUlE6uG4qunXA==";

    /// The merchant signer.
    ///
    /// # Panics
    ///
    /// Panics if the fixture key is unreadable.
    #[must_use]
    pub fn merchant_signer() -> RsaSha256Signer {
        RsaSha256Signer::from_pem(MERCHANT_PRIVATE_KEY, MERCHANT_SERIAL)
            .expect("merchant fixture key")
    }

    /// The platform signer, for producing response signatures.
    ///
    /// # Panics
    ///
    /// Panics if the fixture key is unreadable.
    #[must_use]
    pub fn platform_signer() -> RsaSha256Signer {
        RsaSha256Signer::from_pem(PLATFORM_PRIVATE_KEY, PLATFORM_SERIAL)
            .expect("platform fixture key")
    }

    /// The serial header value [`signed_headers`](super::signed_headers)
    /// sends for `dialect`.
    #[must_use]
    pub const fn platform_serial(dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::WechatPayV3 => PLATFORM_SERIAL,
            Dialect::AlipayV3 => ALIPAY_CERT_SN,
        }
    }

    /// Platform keys holding both fixture certificates, each under the
    /// identifier its gateway sends.
    ///
    /// # Panics
    ///
    /// Panics if a fixture certificate is unreadable.
    #[must_use]
    pub fn platform_keys() -> PlatformKeys {
        let mut keys = PlatformKeys::new();
        keys.insert_certificate_pem(PLATFORM_CERTIFICATE)
            .expect("platform fixture certificate");
        let alipay = PlatformCertificate::from_pem(ALIPAY_CERTIFICATE)
            .expect("alipay fixture certificate");
        keys.insert_certificate(alipay.cert_sn().to_owned(), alipay);
        keys
    }

    /// Fully populated credentials for `merchant_id`.
    #[must_use]
    pub fn credentials(merchant_id: &str) -> Credentials {
        Credentials::new(merchant_id)
            .with_signer(merchant_signer())
            .with_verifier(platform_keys())
    }
}

/// Fixed response timestamp, in the unit each dialect uses.
fn response_timestamp(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::WechatPayV3 => "1554209980",
        Dialect::AlipayV3 => "1554209980123",
    }
}

/// Response headers carrying a valid platform signature over `body`.
///
/// # Panics
///
/// Panics if the fixture key cannot sign.
#[must_use]
pub fn signed_headers(dialect: Dialect, body: &[u8]) -> HeaderMap {
    let names = dialect.headers();
    let timestamp = response_timestamp(dialect);
    let nonce = "c5ac7061fccab6bf3e254dcf98995b8c";
    let mut message = format!("{timestamp}\n{nonce}\n").into_bytes();
    message.extend_from_slice(body);
    message.push(b'\n');
    let signature = fixtures::platform_signer()
        .sign(&message)
        .expect("platform fixture signs");

    let mut headers = HeaderMap::new();
    for (name, value) in [
        (names.timestamp, timestamp.to_owned()),
        (names.nonce, nonce.to_owned()),
        (names.signature, Base64Bytes::encode(signature).to_string()),
        (names.serial, fixtures::platform_serial(dialect).to_owned()),
        (names.request_id, "08F78BB5AF0D11E9A0A6F2A4B2C3D4E5".to_owned()),
    ] {
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).expect("static header name"),
            HeaderValue::from_str(&value).expect("ascii header value"),
        );
    }
    headers
}

/// A response with `status`, `body` and a valid platform signature.
#[must_use]
pub fn signed_response(dialect: Dialect, status: StatusCode, body: &[u8]) -> RawResponse {
    RawResponse {
        status,
        headers: signed_headers(dialect, body),
        body: body.to_vec(),
    }
}

/// A [`Transport`] that answers every request with one scripted response
/// and records what it was sent.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    response: RawResponse,
    requests: Mutex<Vec<SignedRequest>>,
}

impl RecordingTransport {
    /// Answers every request with `response`.
    #[must_use]
    pub fn new(response: RawResponse) -> Self {
        Self {
            response,
            requests: Mutex::default(),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &SignedRequest) -> Result<RawResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(self.response.clone())
    }
}
