//! The typed response envelope.
//!
//! # Verification does not gate the payload
//!
//! When the gateway answers with its success status the decoded payload is
//! placed on the envelope **before** the signature is checked, and it stays
//! there when the check fails. A failed check is recorded as
//! [`Verification::Failed`]. Code that moves money must either test
//! [`Envelope::is_verified`] or call [`Envelope::into_verified`], which refuses
//! unverified payloads.

use http::StatusCode;

use crate::dialect::SignInfo;
use crate::error::{Error, GatewayError, VerificationError};

/// Whether the call succeeded structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The gateway returned the operation's success status.
    Success,
    /// Any other HTTP status.
    Http(StatusCode),
}

impl Status {
    /// Numeric form: `0` for success, otherwise the HTTP status code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Success => 0,
            Self::Http(status) => status.as_u16(),
        }
    }

    /// Returns true for [`Status::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// The payload or the raw error text; never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body<T> {
    /// Decoded success payload.
    Payload(T),
    /// Raw body of a non-success response.
    Error(String),
}

/// Outcome of the response signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The signature matched a registered platform key.
    Verified,
    /// Not checked because the response was not a success.
    NotAttempted,
    /// The check ran and failed, or could not run.
    Failed(VerificationError),
}

/// A gateway response with its status, body and signature outcome.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    status: Status,
    sign_info: SignInfo,
    body: Body<T>,
    verification: Verification,
}

impl<T> Envelope<T> {
    pub(crate) const fn success(payload: T, sign_info: SignInfo) -> Self {
        Self {
            status: Status::Success,
            sign_info,
            body: Body::Payload(payload),
            verification: Verification::NotAttempted,
        }
    }

    pub(crate) const fn failure(status: StatusCode, text: String, sign_info: SignInfo) -> Self {
        Self {
            status: Status::Http(status),
            sign_info,
            body: Body::Error(text),
            verification: Verification::NotAttempted,
        }
    }

    pub(crate) fn set_verification(&mut self, verification: Verification) {
        self.verification = verification;
    }

    /// The structural status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns true if the gateway returned the operation's success status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body.
    #[must_use]
    pub const fn body(&self) -> &Body<T> {
        &self.body
    }

    /// The decoded payload, present only on success.
    ///
    /// The payload is present even if [`Self::verification`] failed.
    #[must_use]
    pub const fn payload(&self) -> Option<&T> {
        match &self.body {
            Body::Payload(payload) => Some(payload),
            Body::Error(_) => None,
        }
    }

    /// Takes the payload, present only on success, regardless of verification.
    #[must_use]
    pub fn into_payload(self) -> Option<T> {
        match self.body {
            Body::Payload(payload) => Some(payload),
            Body::Error(_) => None,
        }
    }

    /// The raw error body, present only on failure.
    #[must_use]
    pub fn error_text(&self) -> Option<&str> {
        match &self.body {
            Body::Payload(_) => None,
            Body::Error(text) => Some(text),
        }
    }

    /// The signature material returned with the response.
    #[must_use]
    pub const fn sign_info(&self) -> &SignInfo {
        &self.sign_info
    }

    /// The signature check outcome.
    #[must_use]
    pub const fn verification(&self) -> &Verification {
        &self.verification
    }

    /// The verification failure, if the check failed.
    #[must_use]
    pub const fn verification_error(&self) -> Option<&VerificationError> {
        match &self.verification {
            Verification::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true only if the response signature was checked and matched.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self.verification, Verification::Verified)
    }

    /// Returns the payload only if the call succeeded and its signature
    /// was verified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Gateway`] for a non-success status and
    /// [`Error::Verification`] for a payload whose signature failed.
    pub fn into_verified(self) -> Result<T, Error> {
        match (self.body, self.verification) {
            (Body::Error(body), _) => {
                let status = match self.status {
                    Status::Http(status) => status,
                    Status::Success => StatusCode::OK,
                };
                Err(GatewayError { status, body }.into())
            }
            (Body::Payload(payload), Verification::Verified) => Ok(payload),
            (Body::Payload(_), Verification::Failed(err)) => Err(err.into()),
            (Body::Payload(_), Verification::NotAttempted) => {
                Err(VerificationError::NotConfigured.into())
            }
        }
    }
}
