use std::sync::Arc;

use rpay::Dialect;
use rpay::testing::{fixtures, signed_headers};
use rpay_http::ReqwestTransport;
use url::Url;
use wiremock::{MockServer, ResponseTemplate};

use crate::Client;

pub(crate) const APP_ID: &str = "2021000000000000";

pub(crate) async fn mock_client() -> (MockServer, Client) {
    let server = MockServer::start().await;
    let client = Client::with_transport(
        Arc::new(fixtures::credentials(APP_ID)),
        Url::parse(&server.uri()).unwrap(),
        Arc::new(ReqwestTransport::new()),
    );
    (server, client)
}

/// A response carrying a valid `alipay-signature` over `body`.
pub(crate) fn signed(status: u16, body: &str) -> ResponseTemplate {
    let mut template = ResponseTemplate::new(status).set_body_string(body);
    for (name, value) in &signed_headers(Dialect::AlipayV3, body.as_bytes()) {
        template = template.insert_header(name.as_str(), value.to_str().unwrap());
    }
    template
}
