//! The Alipay open API v3 client.

use std::sync::Arc;

use rpay::{Config, ConfigError, Credentials, Dialect, Gateway, Transport, TransportError};
use rpay_http::ReqwestTransport;
use url::Url;

use crate::constants;

/// Client for the Alipay open API v3.
///
/// The merchant id in the credentials is the `app_id`; the signer's serial is
/// the `app_cert_sn`.
#[derive(Debug, Clone)]
pub struct Client {
    gateway: Gateway,
}

impl Client {
    /// Creates a client for the production endpoint over `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the base URL does not parse.
    pub fn try_new(credentials: Credentials) -> Result<Self, TransportError> {
        let base_url =
            Url::parse(constants::BASE_URL).map_err(|source| TransportError::InvalidUrl {
                context: "failed to parse Alipay base URL",
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
            gateway: Gateway::new(Dialect::AlipayV3, base_url, credentials, transport),
        }
    }

    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a key cannot be loaded or `base_url` is invalid.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let transport = config
            .timeout()
            .map_or_else(ReqwestTransport::new, |timeout| {
                ReqwestTransport::new().with_timeout(timeout)
            });
        Ok(Self::with_transport(
            Arc::new(config.credentials(Dialect::AlipayV3)?),
            config.base_url_or(constants::BASE_URL)?,
            Arc::new(transport),
        ))
    }

    /// The underlying request pipeline.
    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}
