#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core envelope for signed payment-gateway APIs.
//!
//! Every gateway call made through this crate follows the same pipeline:
//!
//! 1. validate the request parameters against the operation's [`Schema`]
//! 2. build the canonical request string and sign it with the merchant key
//! 3. send the request through a [`Transport`]
//! 4. wrap the response in an [`Envelope`], decoding the typed payload on
//!    structural success
//! 5. verify the platform signature carried in the response headers
//!
//! Gateway-specific crates (`rpay-wechat`, `rpay-alipay`) declare their
//! endpoints on top of [`Gateway`]; `rpay-http` provides the `reqwest`-backed
//! transport.
//!
//! # Verification does not gate the payload
//!
//! A structurally successful response is returned to the caller even when its
//! signature cannot be verified. The outcome is recorded on
//! [`Envelope::verification`]; callers must not act on money-moving data
//! unless [`Envelope::is_verified`] is true. Use [`Envelope::into_verified`] to
//! turn any gateway or verification failure into an [`Error`].
//!
//! # Modules
//!
//! - [`body_map`] - Ordered request parameters and per-operation schemas
//! - [`config`] - TOML configuration with environment variable expansion
//! - [`credentials`] - Merchant and platform key material
//! - [`crypto`] - RSA signing and verification primitives
//! - [`dialect`] - Canonical strings and header layouts per gateway
//! - [`encoding`] - Base64 helpers
//! - [`envelope`] - Typed response envelope
//! - [`error`] - Error taxonomy
//! - [`gateway`] - The shared request/response pipeline
//! - [`timestamp`] - Request timestamps and nonces
//! - [`transport`] - Transport abstraction and call context
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation
//! - `test-util` - Exposes a scripted transport and key fixtures for tests

pub mod body_map;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod dialect;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod timestamp;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use body_map::{BodyMap, Field, Schema};
pub use config::{Config, ConfigError};
pub use credentials::Credentials;
pub use crypto::{
    KeyError, MerchantSigner, PlatformCertificate, PlatformKeys, PlatformVerifier, RsaSha256Signer,
};
pub use dialect::{Dialect, SignInfo};
pub use envelope::{Body, Envelope, Status, Verification};
pub use error::{
    DecodeError, Error, GatewayError, MissingFieldError, SigningError, TransportError,
    VerificationError,
};
pub use gateway::Gateway;
pub use transport::{Context, RawResponse, SignedRequest, Transport};
