#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Alipay open API v3 cloud-sale operations.
//!
//! [`Client`] signs requests with the `ALIPAY-SHA256withRSA` scheme and checks
//! the `alipay-signature` header of successful responses. Alipay reports
//! business failures inside a `200` body, so inspect
//! [`ErrorResponse::code_succeed`] on the payload as well as the envelope.
//!
//! # Modules
//!
//! - [`client`] - The client
//! - [`cloud_sale`] - Withholding charges, cancellations and refunds
//! - [`constants`] - Base URL and request paths
//! - [`error`] - The common business result

pub mod client;
pub mod cloud_sale;
pub mod constants;
pub mod error;

#[cfg(test)]
mod test_util;

pub use client::Client;
pub use error::ErrorResponse;
