#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport for rpay gateway clients.
//!
//! [`ReqwestTransport`] implements [`rpay::Transport`] on top of a pooled
//! `reqwest::Client`. It attaches the signed `Authorization` header and the
//! JSON content headers, and hands every response back untouched so the
//! envelope can read the signature headers.
//!
//! # Modules
//!
//! - [`constants`] - Header values sent with every request
//! - [`transport`] - The `reqwest` transport

pub mod constants;
pub mod transport;

pub use transport::ReqwestTransport;
