//! Transport abstraction and per-call context.
//!
//! A [`Transport`] performs exactly one HTTP round trip for an already signed
//! request. Timeouts and cancellation are applied around the transport by the
//! [`Context`] the caller passes to every operation, so an implementation only
//! needs to move bytes.

use std::future::Future;
use std::time::Duration;

use http::{HeaderMap, Method, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::TransportError;

/// Per-call cancellation and deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl Context {
    /// A context that never cancels and has no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ties the call to `token`; cancelling it aborts the in-flight request.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Bounds the round trip to `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The cancellation token observed by this context.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline for the round trip, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs `fut` until it completes, the token is cancelled or the timeout
    /// elapses, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Cancelled`] or [`TransportError::Timeout`]
    /// when the future is abandoned, otherwise the future's own error.
    pub async fn guard<F, T>(&self, context: &'static str, fut: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Cancelled { context });
        }
        let bounded = async {
            match self.timeout {
                Some(timeout) => tokio::time::timeout(timeout, fut)
                    .await
                    .map_err(|_| TransportError::Timeout { context })?,
                None => fut.await,
            }
        };
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(TransportError::Cancelled { context }),
            result = bounded => result,
        }
    }
}

/// A request whose authorization has been computed.
///
/// The body bytes are exactly the bytes that were signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    method: Method,
    url: Url,
    authorization: String,
    body: Option<Vec<u8>>,
}

impl SignedRequest {
    /// Creates a signed request.
    #[must_use]
    pub const fn new(method: Method, url: Url, authorization: String, body: Option<Vec<u8>>) -> Self {
        Self {
            method,
            url,
            authorization,
            body,
        }
    }

    /// The HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The absolute request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// The `Authorization` header value.
    #[must_use]
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// The JSON body, absent for GET.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// One HTTP response, consumed immediately by the envelope.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// Response headers, including the signature material.
    pub headers: HeaderMap,
    /// The raw body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// The body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs one HTTP round trip.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends `request` and returns the response whatever its status.
    ///
    /// Non-success statuses are not errors at this layer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no response was received.
    async fn send(&self, request: &SignedRequest) -> Result<RawResponse, TransportError>;
}
