//! Base64 encoding and decoding utilities.
//!
//! Signatures travel as standard base64 in both the request authorization and
//! the response signature header. [`Base64Bytes`] holds the encoded form.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use std::fmt::Display;

/// A wrapper for base64-encoded byte data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Decodes the base64 string bytes to raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(self.0.trim_ascii())
    }

    /// Encodes raw binary data into base64 string bytes.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Self {
        let encoded = b64.encode(input.as_ref());
        Self(encoded.into_bytes())
    }

    /// Returns the encoded form as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ever built from base64 output or header bytes checked by `From<&str>`.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Base64Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl From<&str> for Base64Bytes {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl Display for Base64Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let encoded = Base64Bytes::encode(b"signature bytes");
        assert_eq!(encoded.as_str(), "c2lnbmF0dXJlIGJ5dGVz");
        assert_eq!(encoded.decode().unwrap(), b"signature bytes");
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let header = Base64Bytes::from(" c2lnbmF0dXJlIGJ5dGVz\r\n");
        assert_eq!(header.decode().unwrap(), b"signature bytes");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Base64Bytes::from("not*base64").decode().is_err());
    }
}
