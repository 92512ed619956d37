//! Request timestamps and nonces.
//!
//! Every signed request carries the time it was built and a random nonce.
//! WeChat Pay expects whole seconds, Alipay milliseconds; [`UnixTimestamp`]
//! keeps millisecond precision and renders either.

use std::fmt::{Display, Formatter};
use std::time::SystemTime;

use ring::rand::{SecureRandom, SystemRandom};

use crate::error::SigningError;

/// A Unix timestamp with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq)]
pub struct UnixTimestamp(u64);

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_secs())
    }
}

impl UnixTimestamp {
    /// Creates a timestamp from whole seconds.
    ///
    /// Values past `u64::MAX` milliseconds saturate.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Creates a timestamp from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the current system time.
    ///
    /// A clock set before the Unix epoch reads as the epoch itself.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        Self(millis)
    }

    /// Whole seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Length of generated nonces.
pub const NONCE_LEN: usize = 32;

const NONCE_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Generates a random 32-character nonce from the system RNG.
///
/// # Errors
///
/// Returns [`SigningError::Sign`] if the system RNG is unavailable.
pub fn nonce(rng: &SystemRandom) -> Result<String, SigningError> {
    let mut bytes = [0u8; NONCE_LEN];
    rng.fill(&mut bytes)
        .map_err(|_| SigningError::Sign("system RNG unavailable".to_owned()))?;
    Ok(bytes
        .iter()
        .map(|b| char::from(NONCE_ALPHABET[usize::from(b & 0x1f)]))
        .collect())
}
