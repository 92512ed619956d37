//! Error types for gateway calls.
//!
//! The first four categories abort a call: [`MissingFieldError`],
//! [`SigningError`], [`TransportError`] and [`DecodeError`]. The last two,
//! [`GatewayError`] and [`VerificationError`], describe responses that did
//! arrive; operations report them as data on the returned
//! [`Envelope`](crate::Envelope) and only [`Envelope::into_verified`](crate::Envelope::into_verified)
//! turns them into an [`Error`].

use http::StatusCode;

use crate::crypto::KeyError;

/// Boxed error used as the source of transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Base error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required request field was absent or empty.
    #[error(transparent)]
    MissingField(#[from] MissingFieldError),

    /// The request could not be signed.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A success response carried a body that does not match the payload type.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The gateway answered with a non-success status.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The response signature could not be confirmed.
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// A required request field was absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required field: {key}")]
pub struct MissingFieldError {
    /// The first offending key.
    pub key: String,
}

impl MissingFieldError {
    /// Creates a new missing-field error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Errors from building the request authorization.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// No merchant private key is configured.
    #[error("merchant private key is not configured")]
    MissingKey,

    /// The merchant private key could not be loaded.
    #[error("invalid merchant private key: {0}")]
    Key(#[from] KeyError),

    /// The signing primitive failed.
    #[error("signing failed: {0}")]
    Sign(String),

    /// The request body could not be serialized for signing.
    #[error("failed to serialize request body: {0}")]
    Body(#[source] serde_json::Error),
}

/// Errors raised before a response was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request URL could not be built.
    #[error("invalid URL: {context}: {source}")]
    InvalidUrl {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying transport error.
        #[source]
        source: BoxError,
    },

    /// The response body is larger than the transport accepts.
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// The request exceeded its deadline.
    #[error("request timed out: {context}")]
    Timeout {
        /// Human-readable context.
        context: &'static str,
    },

    /// The caller cancelled the request.
    #[error("request cancelled: {context}")]
    Cancelled {
        /// Human-readable context.
        context: &'static str,
    },
}

impl TransportError {
    /// Returns true if the request was cancelled by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns true if the request ran past its deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// A success response whose body could not be decoded into the payload type.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode response body {body}: {source}")]
pub struct DecodeError {
    /// The raw response body.
    pub body: String,
    /// The underlying parse error.
    #[source]
    pub source: serde_json::Error,
}

/// The gateway answered with a status other than the expected success status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("gateway returned HTTP {status}: {body}")]
pub struct GatewayError {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The raw response body.
    pub body: String,
}

/// The response signature could not be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// A signature header was absent from the response.
    #[error("response is missing the {0} header")]
    MissingHeader(&'static str),

    /// No platform key is registered for the response serial.
    #[error("no platform key registered for serial {0}")]
    UnknownSerial(String),

    /// The signature header is not valid base64.
    #[error("signature is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The signature does not match the response.
    #[error("signature mismatch for serial {serial}")]
    Mismatch {
        /// Serial of the key that rejected the signature.
        serial: String,
    },

    /// Verification is impossible because no platform keys are configured.
    #[error("no platform keys configured, response signature was not checked")]
    NotConfigured,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_key() {
        let err = MissingFieldError::new("total_amount");
        assert_eq!(err.to_string(), "missing required field: total_amount");
    }

    #[test]
    fn test_error_is_transparent() {
        let err: Error = GatewayError {
            status: StatusCode::BAD_REQUEST,
            body: "{\"code\":\"PARAM_ERROR\"}".to_owned(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "gateway returned HTTP 400 Bad Request: {\"code\":\"PARAM_ERROR\"}"
        );
    }

    #[test]
    fn test_transport_error_kind() {
        let err = TransportError::Cancelled { context: "GET /v3/x" };
        assert!(err.is_cancelled());
        assert!(!err.is_timeout());
    }
}
