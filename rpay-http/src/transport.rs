//! A [`Transport`] backed by `reqwest`.
//!
//! ## Features
//!
//! - Shares one pooled `reqwest::Client` across clones
//! - Supports optional timeout and extra default headers
//! - Caps the response body size ([`constants::MAX_BODY_SIZE`] by default)
//! - Integrates with `tracing` if the `telemetry` feature is enabled
//!
//! Non-success statuses are returned as ordinary responses; only failures to
//! obtain a response become [`TransportError`].

use std::time::Duration;

use http::HeaderMap;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use rpay::{RawResponse, SignedRequest, Transport, TransportError};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::constants;

/// Sends signed requests over HTTPS with `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    /// Shared Reqwest HTTP client
    client: Client,
    /// Extra headers sent with each request
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
    /// Largest response body accepted, in bytes
    max_body_size: usize,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::with_http_client(Client::default())
    }
}

impl ReqwestTransport {
    /// Creates a transport with a fresh connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an existing client, e.g. one with a proxy or custom TLS roots.
    #[must_use]
    pub fn with_http_client(client: Client) -> Self {
        Self {
            client,
            headers: HeaderMap::new(),
            timeout: None,
            max_body_size: constants::MAX_BODY_SIZE,
        }
    }

    /// Attaches extra headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the largest response body to read, in bytes.
    #[must_use]
    pub const fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Returns any extra headers configured on the transport.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the response body limit in bytes.
    #[must_use]
    pub const fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "rpay_http.send",
            skip_all,
            fields(method = %request.method(), url = %request.url()),
            err
        )
    )]
    async fn send(&self, request: &SignedRequest) -> Result<RawResponse, TransportError> {
        let mut req = self
            .client
            .request(request.method().clone(), request.url().clone())
            .header(AUTHORIZATION, request.authorization())
            .header(ACCEPT, constants::APPLICATION_JSON)
            .header(USER_AGENT, constants::USER_AGENT);
        if let Some(body) = request.body() {
            req = req
                .header(CONTENT_TYPE, constants::APPLICATION_JSON)
                .body(body.to_vec());
        }
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let mut response = req
            .send()
            .await
            .map_err(|e| map_reqwest_error("failed to send request", e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let limit = self.max_body_size;
        let declared_limit = u64::try_from(limit).unwrap_or(u64::MAX);
        if response
            .content_length()
            .is_some_and(|len| len > declared_limit)
        {
            return Err(TransportError::BodyTooLarge { limit });
        }
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error("failed to read response body", e))?
        {
            if body.len() + chunk.len() > limit {
                return Err(TransportError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        #[cfg(feature = "telemetry")]
        tracing::debug!(%status, bytes = body.len(), "response received");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(context: &'static str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout { context }
    } else {
        TransportError::Http {
            context,
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Method, StatusCode};
    use rpay::Context;
    use tokio_util::sync::CancellationToken;
    use url::Url;
    use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signed(method: Method, url: &str, body: Option<&str>) -> SignedRequest {
        SignedRequest::new(
            method,
            Url::parse(url).unwrap(),
            "WECHATPAY2-SHA256-RSA2048 mchid=\"1\"".to_owned(),
            body.map(|b| b.as_bytes().to_vec()),
        )
    }

    #[tokio::test]
    async fn test_get_sends_authorization() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/capital/capitallhh/banks/personal-banking"))
            .and(query_param("offset", "0"))
            .and(header("authorization", "WECHATPAY2-SHA256-RSA2048 mchid=\"1\""))
            .and(header("accept", "application/json"))
            .and(header("x-tenant", "acme"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Wechatpay-Serial", "5157F09E")
                    .set_body_string("{\"total_count\":0}"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut extra = HeaderMap::new();
        extra.insert("x-tenant", HeaderValue::from_static("acme"));
        let transport = ReqwestTransport::new().with_headers(extra);
        let url = format!(
            "{}/v3/capital/capitallhh/banks/personal-banking?offset=0",
            mock_server.uri()
        );
        let raw = transport.send(&signed(Method::GET, &url, None)).await.unwrap();

        assert_eq!(raw.status, StatusCode::OK);
        assert_eq!(raw.headers["wechatpay-serial"], "5157F09E");
        assert_eq!(raw.text(), "{\"total_count\":0}");
    }

    #[tokio::test]
    async fn test_post_sends_exact_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/merchant/fund/withdraw"))
            .and(header("content-type", "application/json"))
            .and(header_exists("user-agent"))
            .and(body_string("{\"out_request_no\":\"W1\",\"amount\":100}"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/v3/merchant/fund/withdraw", mock_server.uri());
        let raw = ReqwestTransport::new()
            .send(&signed(
                Method::POST,
                &url,
                Some("{\"out_request_no\":\"W1\",\"amount\":100}"),
            ))
            .await
            .unwrap();
        assert_eq!(raw.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_error_status_is_returned_raw() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string("{\"code\":\"SYSTEM_ERROR\"}"),
            )
            .mount(&mock_server)
            .await;

        let raw = ReqwestTransport::new()
            .send(&signed(Method::GET, &mock_server.uri(), None))
            .await
            .unwrap();
        assert_eq!(raw.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(raw.text(), "{\"code\":\"SYSTEM_ERROR\"}");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().with_max_body_size(32);
        let err = transport
            .send(&signed(Method::GET, &mock_server.uri(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::BodyTooLarge { limit: 32 }));

        let raw = transport
            .with_max_body_size(64)
            .send(&signed(Method::GET, &mock_server.uri(), None))
            .await
            .unwrap();
        assert_eq!(raw.body.len(), 64);
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let err = ReqwestTransport::new()
            .with_timeout(Duration::from_millis(50))
            .send(&signed(Method::GET, &mock_server.uri(), None))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_context_cancellation() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let token = CancellationToken::new();
        let ctx = Context::new().with_cancellation(token.clone());
        let transport = ReqwestTransport::new();
        let request = signed(Method::GET, &mock_server.uri(), None);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let err = ctx
            .guard("GET /", transport.send(&request))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let err = ReqwestTransport::new()
            .send(&signed(Method::GET, "http://127.0.0.1:1/", None))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Http { .. }));
    }
}
