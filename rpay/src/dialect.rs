//! Canonical strings and header layouts for each supported gateway.
//!
//! Both gateways sign the same ingredients (method, request URI, timestamp,
//! nonce, body) with RSA-SHA256 but arrange them differently and expect
//! different header names. [`Dialect`] captures those differences so the
//! [`Gateway`](crate::Gateway) pipeline stays shared.

use http::{HeaderMap, Method};

use crate::crypto::{MerchantSigner, PlatformCertificate, PlatformVerifier};
use crate::encoding::Base64Bytes;
use crate::error::{SigningError, VerificationError};
use crate::timestamp::UnixTimestamp;

/// Response header names carrying the platform signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeaders {
    /// Time the response was signed.
    pub timestamp: &'static str,
    /// Random nonce mixed into the signature.
    pub nonce: &'static str,
    /// Base64 signature.
    pub signature: &'static str,
    /// Serial number of the platform certificate that signed.
    pub serial: &'static str,
    /// Gateway request identifier, useful when filing support tickets.
    pub request_id: &'static str,
}

const WECHAT_HEADERS: SignatureHeaders = SignatureHeaders {
    timestamp: "Wechatpay-Timestamp",
    nonce: "Wechatpay-Nonce",
    signature: "Wechatpay-Signature",
    serial: "Wechatpay-Serial",
    request_id: "Request-ID",
};

const ALIPAY_HEADERS: SignatureHeaders = SignatureHeaders {
    timestamp: "alipay-timestamp",
    nonce: "alipay-nonce",
    signature: "alipay-signature",
    serial: "alipay-sn",
    request_id: "alipay-trace-id",
};

/// A gateway's signing conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// WeChat Pay API v3.
    WechatPayV3,
    /// Alipay open API v3.
    AlipayV3,
}

/// The ingredients of one request signature.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalRequest<'a> {
    /// HTTP method.
    pub method: &'a Method,
    /// Absolute path plus query string.
    pub uri: &'a str,
    /// The exact body bytes that will be sent; empty for GET.
    pub body: &'a [u8],
    /// Time of signing.
    pub timestamp: UnixTimestamp,
    /// Random nonce.
    pub nonce: &'a str,
}

impl Dialect {
    /// Scheme prefix of the `Authorization` header.
    #[must_use]
    pub const fn auth_type(self) -> &'static str {
        match self {
            Self::WechatPayV3 => "WECHATPAY2-SHA256-RSA2048",
            Self::AlipayV3 => "ALIPAY-SHA256withRSA",
        }
    }

    /// Response header names for this gateway.
    #[must_use]
    pub const fn headers(self) -> &'static SignatureHeaders {
        match self {
            Self::WechatPayV3 => &WECHAT_HEADERS,
            Self::AlipayV3 => &ALIPAY_HEADERS,
        }
    }

    /// The identifier this gateway puts in the serial header for responses
    /// signed with `cert`'s key.
    ///
    /// WeChat Pay sends the hex serial number, Alipay its certificate SN.
    #[must_use]
    pub fn certificate_id(self, cert: &PlatformCertificate) -> &str {
        match self {
            Self::WechatPayV3 => cert.serial(),
            Self::AlipayV3 => cert.cert_sn(),
        }
    }

    /// Renders a timestamp the way this gateway expects it.
    ///
    /// WeChat Pay uses seconds, Alipay milliseconds.
    #[must_use]
    pub fn format_timestamp(self, timestamp: UnixTimestamp) -> String {
        match self {
            Self::WechatPayV3 => timestamp.as_secs().to_string(),
            Self::AlipayV3 => timestamp.as_millis().to_string(),
        }
    }

    /// Builds the string the merchant key signs.
    #[must_use]
    pub fn canonical_string(
        self,
        merchant_id: &str,
        serial_no: &str,
        request: &CanonicalRequest<'_>,
    ) -> Vec<u8> {
        let timestamp = self.format_timestamp(request.timestamp);
        let mut out = match self {
            Self::WechatPayV3 => format!(
                "{}\n{}\n{}\n{}\n",
                request.method, request.uri, timestamp, request.nonce
            ),
            Self::AlipayV3 => format!(
                "{}\n{}\n{}\n",
                alipay_auth_string(merchant_id, serial_no, request.nonce, &timestamp),
                request.method,
                request.uri
            ),
        }
        .into_bytes();
        out.extend_from_slice(request.body);
        out.push(b'\n');
        out
    }

    /// Signs `request` and returns the full `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the signer fails.
    pub fn authorize(
        self,
        signer: &dyn MerchantSigner,
        merchant_id: &str,
        request: &CanonicalRequest<'_>,
    ) -> Result<String, SigningError> {
        let serial_no = signer.serial_no();
        let message = self.canonical_string(merchant_id, serial_no, request);
        let signature = Base64Bytes::encode(signer.sign(&message)?);
        let timestamp = self.format_timestamp(request.timestamp);
        Ok(match self {
            Self::WechatPayV3 => format!(
                r#"{} mchid="{merchant_id}",nonce_str="{}",timestamp="{timestamp}",serial_no="{serial_no}",signature="{signature}""#,
                self.auth_type(),
                request.nonce,
            ),
            Self::AlipayV3 => format!(
                "{} {},sign={signature}",
                self.auth_type(),
                alipay_auth_string(merchant_id, serial_no, request.nonce, &timestamp),
            ),
        })
    }

    /// Collects the signature material from a response.
    #[must_use]
    pub fn sign_info(self, headers: &HeaderMap, body: &[u8]) -> SignInfo {
        let names = self.headers();
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        SignInfo {
            dialect: self,
            timestamp: get(names.timestamp),
            nonce: get(names.nonce),
            signature: get(names.signature),
            serial: get(names.serial),
            request_id: get(names.request_id),
            body: body.to_vec(),
        }
    }
}

fn alipay_auth_string(app_id: &str, serial_no: &str, nonce: &str, timestamp: &str) -> String {
    format!("app_id={app_id},app_cert_sn={serial_no},nonce={nonce},timestamp={timestamp}")
}

/// Signature material returned with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInfo {
    dialect: Dialect,
    /// Signing time as sent by the gateway.
    pub timestamp: Option<String>,
    /// Response nonce.
    pub nonce: Option<String>,
    /// Base64 signature.
    pub signature: Option<String>,
    /// Platform certificate serial.
    pub serial: Option<String>,
    /// Gateway request identifier.
    pub request_id: Option<String>,
    /// The raw response body the signature covers.
    pub body: Vec<u8>,
}

impl SignInfo {
    /// The dialect the headers were read with.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The message the platform signed: `TIMESTAMP\nNONCE\nBODY\n`.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::MissingHeader`] if the timestamp or nonce
    /// is absent.
    pub fn message(&self) -> Result<Vec<u8>, VerificationError> {
        let names = self.dialect.headers();
        let timestamp = require(self.timestamp.as_deref(), names.timestamp)?;
        let nonce = require(self.nonce.as_deref(), names.nonce)?;
        let mut out = format!("{timestamp}\n{nonce}\n").into_bytes();
        out.extend_from_slice(&self.body);
        out.push(b'\n');
        Ok(out)
    }

    /// Verifies the response signature with `verifier`.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] if a header is missing, the signature is
    /// not base64, the serial is unknown or the signature does not match.
    pub fn verify(&self, verifier: &dyn PlatformVerifier) -> Result<(), VerificationError> {
        let names = self.dialect.headers();
        let signature = require(self.signature.as_deref(), names.signature)?;
        let message = self.message()?;
        let serial = require(self.serial.as_deref(), names.serial)?;
        let signature = Base64Bytes::from(signature).decode()?;
        verifier.verify(serial, &message, &signature)
    }
}

fn require<'a>(value: Option<&'a str>, header: &'static str) -> Result<&'a str, VerificationError> {
    value.ok_or(VerificationError::MissingHeader(header))
}
