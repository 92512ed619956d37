//! The shared request/response pipeline.
//!
//! [`Gateway`] owns everything a call needs besides its parameters: the
//! dialect, the base URL, the credentials and the transport. Operation crates
//! validate their parameters, build a URL with [`Gateway::url`] and hand off to
//! [`Gateway::get`], [`Gateway::post`] or [`Gateway::post_empty`], which sign,
//! send, decode and verify.

use std::sync::Arc;

use http::{Method, StatusCode};
use ring::rand::SystemRandom;
use serde::de::DeserializeOwned;
use url::Url;

use crate::body_map::BodyMap;
use crate::credentials::Credentials;
use crate::dialect::{CanonicalRequest, Dialect};
use crate::envelope::{Envelope, Verification};
use crate::error::{DecodeError, Error, SigningError, TransportError};
use crate::timestamp::{UnixTimestamp, nonce};
use crate::transport::{Context, SignedRequest, Transport};

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// A configured connection to one payment gateway.
#[derive(Debug, Clone)]
pub struct Gateway {
    dialect: Dialect,
    base_url: Url,
    credentials: Arc<Credentials>,
    transport: Arc<dyn Transport>,
    rng: SystemRandom,
}

impl Gateway {
    /// Creates a gateway.
    #[must_use]
    pub fn new(
        dialect: Dialect,
        base_url: Url,
        credentials: Arc<Credentials>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            dialect,
            base_url,
            credentials,
            transport,
            rng: SystemRandom::new(),
        }
    }

    /// The signing dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The shared credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Arc<Credentials> {
        &self.credentials
    }

    /// Builds a request URL.
    ///
    /// The segments of `path` are appended to the base URL's own path, so a
    /// base of `https://proxy.example.com/wechat/` keeps its `/wechat`
    /// prefix. Each of `segments` is appended as one percent-encoded path
    /// segment, and a non-empty `query` becomes the query string.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the base URL cannot carry a
    /// path.
    pub fn url(
        &self,
        path: &str,
        segments: &[&str],
        query: Option<&BodyMap>,
    ) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::InvalidUrl {
                context: "base URL cannot carry path segments",
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()))
            .extend(segments);
        match query {
            Some(bm) if !bm.is_empty() => url.set_query(Some(&bm.encode_query_string())),
            _ => url.set_query(None),
        }
        Ok(url)
    }

    /// Sends a signed GET and decodes a `200 OK` body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if signing, the round trip or decoding fails.
    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        context: &'static str,
        url: Url,
    ) -> Result<Envelope<T>, Error> {
        self.execute(ctx, context, Method::GET, url, None, StatusCode::OK, decode_json::<T>)
            .await
    }

    /// Sends a signed POST with `body` as JSON and decodes a `200 OK` body
    /// into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if signing, the round trip or decoding fails.
    pub async fn post<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        context: &'static str,
        url: Url,
        body: &BodyMap,
    ) -> Result<Envelope<T>, Error> {
        let bytes = body.to_json().map_err(SigningError::Body)?;
        self.execute(
            ctx,
            context,
            Method::POST,
            url,
            Some(bytes),
            StatusCode::OK,
            decode_json::<T>,
        )
        .await
    }

    /// Sends a signed POST whose success answer is `204 No Content`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if signing or the round trip fails.
    pub async fn post_empty(
        &self,
        ctx: &Context,
        context: &'static str,
        url: Url,
        body: &BodyMap,
    ) -> Result<Envelope<()>, Error> {
        let bytes = body.to_json().map_err(SigningError::Body)?;
        self.execute(
            ctx,
            context,
            Method::POST,
            url,
            Some(bytes),
            StatusCode::NO_CONTENT,
            |_| Ok(()),
        )
        .await
    }

    /// Signs `method url body` and returns the request ready for the transport.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if no key is configured or signing fails.
    pub fn sign(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<SignedRequest, SigningError> {
        let signer = self.credentials.signer()?;
        let uri = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        };
        let nonce = nonce(&self.rng)?;
        let canonical = CanonicalRequest {
            method: &method,
            uri: &uri,
            body: body.as_deref().unwrap_or_default(),
            timestamp: UnixTimestamp::now(),
            nonce: &nonce,
        };
        let authorization =
            self.dialect
                .authorize(signer, self.credentials.merchant_id(), &canonical)?;
        Ok(SignedRequest::new(method, url, authorization, body))
    }

    #[allow(clippy::too_many_arguments)]
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "rpay.gateway.call",
            skip_all,
            fields(dialect = ?self.dialect, context = context),
            err
        )
    )]
    async fn execute<T, D>(
        &self,
        ctx: &Context,
        context: &'static str,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        expected: StatusCode,
        decode: D,
    ) -> Result<Envelope<T>, Error>
    where
        D: FnOnce(&[u8]) -> Result<T, DecodeError>,
    {
        let request = self.sign(method, url, body)?;
        let raw = ctx
            .guard(context, self.transport.send(&request))
            .await?;
        let sign_info = self.dialect.sign_info(&raw.headers, &raw.body);

        if raw.status != expected {
            #[cfg(feature = "telemetry")]
            tracing::warn!(
                status = %raw.status,
                request_id = ?sign_info.request_id,
                "gateway returned non-success status"
            );
            return Ok(Envelope::failure(raw.status, raw.text(), sign_info));
        }

        let payload = decode(&raw.body)?;
        let mut envelope = Envelope::success(payload, sign_info);
        let outcome = self
            .credentials
            .verifier()
            .and_then(|verifier| envelope.sign_info().verify(verifier));
        let verification = match outcome {
            Ok(()) => Verification::Verified,
            Err(err) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(error = %err, "response signature not verified");
                Verification::Failed(err)
            }
        };
        #[cfg(feature = "telemetry")]
        tracing::debug!(verified = matches!(verification, Verification::Verified));
        envelope.set_verification(verification);
        Ok(envelope)
    }
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(body).map_err(|source| DecodeError {
        body: String::from_utf8_lossy(body).into_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body_map::Schema;
    use crate::crypto::{PlatformKeys, PlatformVerifier};
    use crate::error::VerificationError;
    use crate::testing::{RecordingTransport, fixtures, signed_response};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Balance {
        available_amount: u64,
    }

    fn gateway(dialect: Dialect, transport: &Arc<RecordingTransport>) -> Gateway {
        Gateway::new(
            dialect,
            Url::parse("https://api.example.com/").unwrap(),
            Arc::new(fixtures::credentials("1900009191")),
            transport.clone(),
        )
    }

    #[test]
    fn test_url_encodes_segments_and_query() {
        let transport = Arc::new(RecordingTransport::default());
        let gw = gateway(Dialect::WechatPayV3, &transport);
        let mut query = BodyMap::new();
        query.set("date", "2026-10-01").set("limit", 10);
        let url = gw
            .url("/v3/ecommerce/fund/enddaybalance", &["a/b c"], Some(&query))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v3/ecommerce/fund/enddaybalance/a%2Fb%20c?date=2026-10-01&limit=10"
        );
        let bare = gw.url("/v3/x", &[], Some(&BodyMap::new())).unwrap();
        assert_eq!(bare.as_str(), "https://api.example.com/v3/x");
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let transport: Arc<dyn Transport> = Arc::new(RecordingTransport::default());
        for base in [
            "https://proxy.example.com/wechat/",
            "https://proxy.example.com/wechat",
        ] {
            let gw = Gateway::new(
                Dialect::WechatPayV3,
                Url::parse(base).unwrap(),
                Arc::new(fixtures::credentials("1900009191")),
                Arc::clone(&transport),
            );
            let url = gw.url("/v3/x", &["ID"], None).unwrap();
            assert_eq!(url.as_str(), "https://proxy.example.com/wechat/v3/x/ID");
        }
    }

    #[test]
    fn test_url_rejects_opaque_base() {
        let transport: Arc<dyn Transport> = Arc::new(RecordingTransport::default());
        let gw = Gateway::new(
            Dialect::WechatPayV3,
            Url::parse("mailto:pay@example.com").unwrap(),
            Arc::new(fixtures::credentials("1900009191")),
            transport,
        );
        assert!(matches!(
            gw.url("/v3/x", &[], None),
            Err(TransportError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_verified_payload() {
        let body = br#"{"available_amount":100}"#;
        let transport = Arc::new(RecordingTransport::new(signed_response(
            Dialect::WechatPayV3,
            StatusCode::OK,
            body,
        )));
        let gw = gateway(Dialect::WechatPayV3, &transport);
        let url = gw.url("/v3/balance", &[], None).unwrap();
        let env: Envelope<Balance> = gw.get(&Context::new(), "GET /v3/balance", url).await.unwrap();

        assert!(env.is_verified());
        assert_eq!(env.payload(), Some(&Balance { available_amount: 100 }));

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method(), &Method::GET);
        assert!(sent[0].body().is_none());
        assert!(
            sent[0]
                .authorization()
                .starts_with("WECHATPAY2-SHA256-RSA2048 mchid=\"1900009191\",nonce_str=\"")
        );
    }

    #[tokio::test]
    async fn test_authorization_verifies_against_merchant_key() {
        let transport = Arc::new(RecordingTransport::new(signed_response(
            Dialect::AlipayV3,
            StatusCode::OK,
            b"{}",
        )));
        let gw = gateway(Dialect::AlipayV3, &transport);
        let mut body = BodyMap::new();
        body.set("out_trade_no", "T1");
        let url = gw.url("/v3/alipay/cloudsale/api/pay/query", &[], None).unwrap();
        let _: Envelope<serde_json::Value> = gw
            .post(&Context::new(), "POST /pay/query", url, &body)
            .await
            .unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.body(), Some(&br#"{"out_trade_no":"T1"}"#[..]));
        let auth = sent.authorization();
        let field = |name: &str| {
            auth.split(|c| c == ' ' || c == ',')
                .find_map(|kv| kv.strip_prefix(name))
                .unwrap()
                .to_owned()
        };
        let canonical = format!(
            "app_id=1900009191,app_cert_sn={},nonce={},timestamp={}\nPOST\n/v3/alipay/cloudsale/api/pay/query\n{{\"out_trade_no\":\"T1\"}}\n",
            field("app_cert_sn="),
            field("nonce="),
            field("timestamp="),
        );
        let signature = crate::encoding::Base64Bytes::from(field("sign=").as_str())
            .decode()
            .unwrap();
        let mut merchant = PlatformKeys::new();
        merchant
            .insert_public_key_pem("merchant", fixtures::MERCHANT_PUBLIC_KEY)
            .unwrap();
        merchant
            .verify("merchant", canonical.as_bytes(), &signature)
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_success_is_not_decoded() {
        let transport = Arc::new(RecordingTransport::new(signed_response(
            Dialect::WechatPayV3,
            StatusCode::BAD_REQUEST,
            b"not json at all",
        )));
        let gw = gateway(Dialect::WechatPayV3, &transport);
        let url = gw.url("/v3/balance", &[], None).unwrap();
        let env: Envelope<Balance> = gw.get(&Context::new(), "GET", url).await.unwrap();
        assert_eq!(env.status(), crate::Status::Http(StatusCode::BAD_REQUEST));
        assert_eq!(env.error_text(), Some("not json at all"));
        assert_eq!(env.verification(), &Verification::NotAttempted);
    }

    #[tokio::test]
    async fn test_undecodable_success_is_error() {
        let transport = Arc::new(RecordingTransport::new(signed_response(
            Dialect::WechatPayV3,
            StatusCode::OK,
            b"<html>",
        )));
        let gw = gateway(Dialect::WechatPayV3, &transport);
        let url = gw.url("/v3/balance", &[], None).unwrap();
        let err = gw
            .get::<Balance>(&Context::new(), "GET", url)
            .await
            .unwrap_err();
        match err {
            Error::Decode(err) => assert_eq!(err.body, "<html>"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tampered_response_keeps_payload() {
        let mut response = signed_response(Dialect::WechatPayV3, StatusCode::OK, br#"{"available_amount":1}"#);
        response.body = br#"{"available_amount":9999}"#.to_vec();
        let transport = Arc::new(RecordingTransport::new(response));
        let gw = gateway(Dialect::WechatPayV3, &transport);
        let url = gw.url("/v3/balance", &[], None).unwrap();
        let env: Envelope<Balance> = gw.get(&Context::new(), "GET", url).await.unwrap();
        assert_eq!(env.payload(), Some(&Balance { available_amount: 9999 }));
        assert!(matches!(
            env.verification_error(),
            Some(VerificationError::Mismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_content_ack() {
        let transport = Arc::new(RecordingTransport::new(signed_response(
            Dialect::WechatPayV3,
            StatusCode::NO_CONTENT,
            b"",
        )));
        let gw = gateway(Dialect::WechatPayV3, &transport);
        let url = gw.url("/v3/x/cancel", &[], None).unwrap();
        let env = gw
            .post_empty(&Context::new(), "POST", url, &BodyMap::new())
            .await
            .unwrap();
        assert!(env.is_success());
        assert!(env.is_verified());
    }

    #[tokio::test]
    async fn test_missing_signer_never_sends() {
        let transport = Arc::new(RecordingTransport::default());
        let gw = Gateway::new(
            Dialect::WechatPayV3,
            Url::parse("https://api.example.com/").unwrap(),
            Arc::new(Credentials::new("m")),
            transport.clone(),
        );
        let url = gw.url("/v3/x", &[], None).unwrap();
        let err = gw
            .get::<serde_json::Value>(&Context::new(), "GET", url)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Signing(SigningError::MissingKey)));
        assert_eq!(transport.call_count(), 0);
        assert!(Schema::EMPTY.validate(&BodyMap::new()).is_ok());
    }

    #[tokio::test]
    async fn test_unconfigured_verifier_is_reported() {
        let transport = Arc::new(RecordingTransport::new(signed_response(
            Dialect::WechatPayV3,
            StatusCode::OK,
            b"{}",
        )));
        let creds = Credentials::new("m").with_signer(fixtures::merchant_signer());
        let gw = Gateway::new(
            Dialect::WechatPayV3,
            Url::parse("https://api.example.com/").unwrap(),
            Arc::new(creds),
            transport.clone(),
        );
        let url = gw.url("/v3/x", &[], None).unwrap();
        let env: Envelope<serde_json::Value> = gw.get(&Context::new(), "GET", url).await.unwrap();
        assert_eq!(
            env.verification_error(),
            Some(&VerificationError::NotConfigured)
        );
    }
}
