#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! WeChat Pay API v3 operations.
//!
//! [`ClientV3`] signs every request with the `WECHATPAY2-SHA256-RSA2048`
//! scheme and checks the `Wechatpay-Signature` header of every successful
//! response. Each operation returns an [`rpay::Envelope`]; see its docs for
//! why a payload may be present even though verification failed.
//!
//! ```rust,no_run
//! use rpay::{BodyMap, Config, Context};
//! use rpay_wechat::ClientV3;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientV3::from_config(&Config::load()?)?;
//! let mut bm = BodyMap::new();
//! bm.set("date", "2026-10-01");
//! let balance = client
//!     .ecommerce_fund_endday_balance(&Context::new(), "1900000109", &bm)
//!     .await?
//!     .into_verified()?;
//! println!("{:?}", balance.available_amount);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`bank`] - Bank and branch lookup
//! - [`client`] - The client
//! - [`constants`] - Base URL and request paths
//! - [`facemch`] - Face-pay user lookup
//! - [`fund`] - Balances and withdrawals
//! - [`payscore`] - Pay-after-use (payscore) service orders

pub mod bank;
pub mod client;
pub mod constants;
pub mod facemch;
pub mod fund;
pub mod payscore;

#[cfg(test)]
mod test_util;

pub use client::ClientV3;
pub use fund::WithdrawOrderNo;
pub use payscore::ScoreOrderNo;
