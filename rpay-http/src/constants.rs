//! Header values sent with every request and transport defaults.

/// `User-Agent` sent by [`ReqwestTransport`](crate::ReqwestTransport).
pub const USER_AGENT: &str = concat!("rpay/", env!("CARGO_PKG_VERSION"));

/// Media type for request and response bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// Largest response body [`ReqwestTransport`](crate::ReqwestTransport) reads
/// by default.
pub const MAX_BODY_SIZE: usize = 4 * 1024 * 1024;
