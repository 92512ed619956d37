//! The business result common to every Alipay response.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Business result code signalling success.
pub const CODE_SUCCESS: &str = "10000";

/// Result fields Alipay embeds in every response body.
///
/// A transport-level success can still carry a business failure; check
/// [`ErrorResponse::code_succeed`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    /// Result code, `10000` on success.
    pub code: String,
    /// Result message.
    pub msg: String,
    /// Detailed error code.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sub_code: String,
    /// Detailed error message.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sub_msg: String,
}

impl ErrorResponse {
    /// Returns true if the business call succeeded.
    #[must_use]
    pub fn code_succeed(&self) -> bool {
        self.code == CODE_SUCCESS
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alipay returned {} {}", self.code, self.msg)?;
        if !self.sub_code.is_empty() {
            write!(f, " ({}: {})", self.sub_code, self.sub_msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorResponse {}
