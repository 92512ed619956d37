use std::sync::Arc;

use rpay::Dialect;
use rpay::testing::{fixtures, signed_headers};
use rpay_http::ReqwestTransport;
use url::Url;
use wiremock::{MockServer, ResponseTemplate};

use crate::ClientV3;

pub(crate) const MCHID: &str = "1900009191";

/// A client pointed at a fresh mock server.
pub(crate) async fn mock_client() -> (MockServer, ClientV3) {
    let server = MockServer::start().await;
    let client = ClientV3::with_transport(
        Arc::new(fixtures::credentials(MCHID)),
        Url::parse(&server.uri()).unwrap(),
        Arc::new(ReqwestTransport::new()),
    );
    (server, client)
}

/// A response carrying a valid platform signature over `body`.
pub(crate) fn signed(status: u16, body: &str) -> ResponseTemplate {
    let mut template = ResponseTemplate::new(status).set_body_string(body);
    for (name, value) in &signed_headers(Dialect::WechatPayV3, body.as_bytes()) {
        template = template.insert_header(name.as_str(), value.to_str().unwrap());
    }
    template
}
