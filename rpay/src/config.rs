//! Client configuration.
//!
//! Loads merchant credentials and transport settings from a TOML file. String
//! values may reference environment variables with `$VAR` or `${VAR}` syntax,
//! which keeps private keys out of the file itself.
//!
//! # Example Configuration
//!
//! ```toml
//! merchant_id = "1900009191"
//! base_url = "https://api.mch.weixin.qq.com"
//! timeout_secs = 30
//!
//! [merchant_key]
//! serial_no = "444F4864EA9B34415..."
//! private_key_path = "${RPAY_HOME}/apiclient_key.pem"
//!
//! [[platform_keys]]
//! path = "${RPAY_HOME}/wechatpay_cert.pem"
//!
//! [[platform_keys]]
//! serial = "PUB_KEY_ID_0114232134912410000"
//! pem = "$WECHATPAY_PUBLIC_KEY"
//! ```
//!
//! A platform key given as a `CERTIFICATE` is registered under its explicit
//! `serial` if one is set, otherwise under the identifier the gateway sends
//! for it: the hex serial number for WeChat Pay, the certificate SN for
//! Alipay. A `PUBLIC KEY` always needs an explicit `serial`.
//!
//! # Environment Variables
//!
//! - `RPAY_CONFIG` - Path to the configuration file (default: `rpay.toml`)
//! - Any variable referenced by `$VAR` in the file

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::credentials::Credentials;
use crate::crypto::{KeyError, PlatformCertificate, PlatformKeys, RsaSha256Signer};
use crate::dialect::Dialect;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML is invalid or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A key could not be loaded.
    #[error("{context}: {source}")]
    Key {
        /// Which key failed.
        context: &'static str,
        /// The underlying key error.
        #[source]
        source: KeyError,
    },

    /// A key entry names neither or both of `path` and inline PEM.
    #[error("{0} must set exactly one of a file path or inline PEM")]
    KeySource(&'static str),

    /// A platform public key has no serial.
    #[error("platform public key needs an explicit serial")]
    MissingSerial,

    /// `base_url` is not a valid URL.
    #[error("invalid base_url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Merchant identifier (`mchid` or `app_id`).
    pub merchant_id: String,

    /// Overrides the gateway's production base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Merchant signing key.
    pub merchant_key: MerchantKeyConfig,

    /// Platform keys for response verification.
    #[serde(default)]
    pub platform_keys: Vec<PlatformKeyConfig>,
}

/// The merchant private key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantKeyConfig {
    /// Serial number of the merchant certificate.
    pub serial_no: String,

    /// Path to a PEM private key.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// Inline PEM private key.
    #[serde(default)]
    pub private_key: Option<String>,
}

/// One platform certificate or public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformKeyConfig {
    /// Identifier the gateway sends in the response serial header.
    ///
    /// Required for `PUBLIC KEY` PEMs; overrides the derived identifier of a
    /// certificate.
    #[serde(default)]
    pub serial: Option<String>,

    /// Path to a PEM certificate or public key.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Inline PEM certificate or public key.
    #[serde(default)]
    pub pem: Option<String>,
}

impl Config {
    /// Loads configuration from the path in `RPAY_CONFIG`, falling back to
    /// `rpay.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("RPAY_CONFIG").unwrap_or_else(|_| "rpay.toml".to_owned());
        Self::load_from(path)
    }

    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text and expands environment variables
    /// in every string value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand();
        Ok(config)
    }

    fn expand(&mut self) {
        expand_in_place(&mut self.merchant_id);
        expand_option(&mut self.base_url);
        expand_in_place(&mut self.merchant_key.serial_no);
        expand_path(&mut self.merchant_key.private_key_path);
        expand_option(&mut self.merchant_key.private_key);
        for key in &mut self.platform_keys {
            expand_option(&mut key.serial);
            expand_path(&mut key.path);
            expand_option(&mut key.pem);
        }
    }

    /// The request timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The configured base URL, or `default` if none is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaseUrl`] if the URL does not parse.
    pub fn base_url_or(&self, default: &str) -> Result<Url, ConfigError> {
        Ok(Url::parse(self.base_url.as_deref().unwrap_or(default))?)
    }

    /// Loads the keys and builds [`Credentials`] for a `dialect` gateway.
    ///
    /// Without any `platform_keys`, the credentials carry no verifier and every
    /// response is reported as unverified.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a key file cannot be read or a key is invalid.
    pub fn credentials(&self, dialect: Dialect) -> Result<Credentials, ConfigError> {
        let key = &self.merchant_key;
        let pem = resolve(
            "merchant_key",
            key.private_key_path.as_deref(),
            key.private_key.as_deref(),
        )?;
        let signer = RsaSha256Signer::from_pem(&pem, key.serial_no.clone()).map_err(|source| {
            ConfigError::Key {
                context: "merchant_key",
                source,
            }
        })?;
        let mut credentials = Credentials::new(self.merchant_id.clone()).with_signer(signer);

        if !self.platform_keys.is_empty() {
            let mut keys = PlatformKeys::new();
            for entry in &self.platform_keys {
                let pem = resolve("platform_keys", entry.path.as_deref(), entry.pem.as_deref())?;
                let as_key_error = |source| ConfigError::Key {
                    context: "platform_keys",
                    source,
                };
                if pem.contains("BEGIN CERTIFICATE") {
                    let cert = PlatformCertificate::from_pem(&pem).map_err(as_key_error)?;
                    let serial = entry
                        .serial
                        .clone()
                        .unwrap_or_else(|| dialect.certificate_id(&cert).to_owned());
                    keys.insert_certificate(serial, cert);
                } else {
                    let serial = entry.serial.clone().ok_or(ConfigError::MissingSerial)?;
                    keys.insert_public_key_pem(serial, &pem)
                        .map_err(as_key_error)?;
                }
            }
            credentials = credentials.with_verifier(keys);
        }
        Ok(credentials)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })
}

fn resolve(
    what: &'static str,
    path: Option<&Path>,
    inline: Option<&str>,
) -> Result<String, ConfigError> {
    match (path, inline) {
        (Some(path), None) => read(path),
        (None, Some(pem)) => Ok(pem.to_owned()),
        _ => Err(ConfigError::KeySource(what)),
    }
}

fn expand_in_place(value: &mut String) {
    if value.contains('$') {
        *value = expand_env_vars(value);
    }
}

fn expand_option(value: &mut Option<String>) {
    if let Some(value) = value {
        expand_in_place(value);
    }
}

fn expand_path(value: &mut Option<PathBuf>) {
    if let Some(path) = value
        && let Some(text) = path.to_str()
        && text.contains('$')
    {
        *path = PathBuf::from(expand_env_vars(text));
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();

        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match std::env::var(&name) {
            Ok(value) if !name.is_empty() && (closed || !braced) => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}
