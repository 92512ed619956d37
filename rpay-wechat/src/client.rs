//! The WeChat Pay v3 client.

use std::sync::Arc;

use rpay::{Config, ConfigError, Credentials, Dialect, Gateway, Transport, TransportError};
use rpay_http::ReqwestTransport;
use url::Url;

use crate::constants;

/// Client for WeChat Pay API v3.
///
/// Cheap to clone; clones share the credentials and connection pool.
#[derive(Debug, Clone)]
pub struct ClientV3 {
    gateway: Gateway,
}

impl ClientV3 {
    /// Creates a client for the production endpoint over `reqwest`.
    ///
    /// `credentials` carries the `mchid`, the merchant API key and the
    /// WeChat Pay platform certificates or public key.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the base URL does not parse.
    pub fn try_new(credentials: Credentials) -> Result<Self, TransportError> {
        let base_url =
            Url::parse(constants::BASE_URL).map_err(|source| TransportError::InvalidUrl {
                context: "failed to parse WeChat Pay base URL",
                source,
            })?;
        Ok(Self::with_transport(
            Arc::new(credentials),
            base_url,
            Arc::new(ReqwestTransport::new()),
        ))
    }

    /// Creates a client with an explicit base URL and transport.
    #[must_use]
    pub fn with_transport(
        credentials: Arc<Credentials>,
        base_url: Url,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            gateway: Gateway::new(Dialect::WechatPayV3, base_url, credentials, transport),
        }
    }

    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a key cannot be loaded or `base_url` is invalid.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut transport = ReqwestTransport::new();
        if let Some(timeout) = config.timeout() {
            transport = transport.with_timeout(timeout);
        }
        Ok(Self::with_transport(
            Arc::new(config.credentials(Dialect::WechatPayV3)?),
            config.base_url_or(constants::BASE_URL)?,
            Arc::new(transport),
        ))
    }

    /// The underlying request pipeline, for endpoints this crate does not wrap.
    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}
