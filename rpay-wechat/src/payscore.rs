//! Pay-after-use service orders (WeChat Pay Score) for service providers.
//!
//! An order is created, optionally modified, then completed; the user is
//! charged on completion. `cancel`, `modify`, `complete`, `pay` and `sync`
//! answer `204 No Content` on success, so their envelopes carry `()`.

use rpay::{BodyMap, Context, Envelope, Error, Field, Schema};
use serde::{Deserialize, Serialize};

use crate::ClientV3;
use crate::constants;

const CREATE: Schema = Schema::new(&[
    Field::required("service_id"),
    Field::required("sub_mchid"),
    Field::required("out_order_no"),
    Field::optional("appid"),
    Field::optional("sub_appid"),
    Field::optional("service_introduction"),
    Field::optional("post_payments"),
    Field::optional("post_discounts"),
    Field::optional("time_range"),
    Field::optional("location"),
    Field::optional("risk_fund"),
    Field::optional("attach"),
    Field::optional("notify_url"),
    Field::optional("openid"),
    Field::optional("need_user_confirm"),
]);

const CANCEL: Schema = Schema::new(&[
    Field::required("service_id"),
    Field::required("sub_mchid"),
    Field::required("reason"),
]);

const MODIFY: Schema = Schema::new(&[
    Field::required("service_id"),
    Field::required("sub_mchid"),
    Field::optional("post_payments"),
    Field::optional("post_discounts"),
    Field::optional("total_amount"),
    Field::optional("reason"),
]);

const COMPLETE: Schema = Schema::new(&[
    Field::required("service_id"),
    Field::required("sub_mchid"),
    Field::optional("post_payments"),
    Field::optional("post_discounts"),
    Field::optional("total_amount"),
    Field::optional("time_range"),
    Field::optional("location"),
    Field::optional("profit_sharing"),
    Field::optional("goods_tag"),
]);

const PAY: Schema = Schema::new(&[Field::required("service_id"), Field::required("sub_mchid")]);

const SYNC: Schema = Schema::new(&[
    Field::required("service_id"),
    Field::required("sub_mchid"),
    Field::required("type"),
    Field::optional("detail"),
]);

const BIND_SERVICE: Schema = Schema::new(&[
    Field::required("service_id"),
    Field::required("out_apply_no"),
    Field::optional("result_notify_url"),
]);

/// Selects a service order by one of its identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOrderNo<'a> {
    /// The merchant's own order number.
    OutOrderNo(&'a str),
    /// The query id returned by WeChat Pay.
    QueryId(&'a str),
}

impl<'a> ScoreOrderNo<'a> {
    /// The query parameter and value identifying the order.
    const fn query_pair(self) -> (&'static str, &'a str) {
        match self {
            Self::OutOrderNo(no) => ("out_order_no", no),
            Self::QueryId(no) => ("query_id", no),
        }
    }
}

/// A pay-after-use service order.
///
/// Returned by both create and query; fields the gateway omits stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceOrder {
    /// App id of the service provider.
    pub appid: Option<String>,
    /// App id of the sub-merchant.
    pub sub_appid: Option<String>,
    /// Service provider merchant id.
    pub mchid: Option<String>,
    /// Sub-merchant id.
    pub sub_mchid: Option<String>,
    /// Merchant order number.
    pub out_order_no: Option<String>,
    /// Pay-after-use service id.
    pub service_id: Option<String>,
    /// Service name shown to the user.
    pub service_introduction: Option<String>,
    /// `CREATED`, `DOING`, `DONE`, `REVOKED` or `EXPIRED`.
    pub state: Option<String>,
    /// Refines `DOING`, e.g. `USER_CONFIRM` or `MCH_COMPLETE`.
    pub state_description: Option<String>,
    /// Total amount in fen.
    pub total_amount: Option<i64>,
    /// Charge lines.
    pub post_payments: Vec<PostPayment>,
    /// Discount lines.
    pub post_discounts: Vec<PostDiscount>,
    /// Deposit waived by the service.
    pub risk_fund: Option<RiskFund>,
    /// Service period.
    pub time_range: Option<TimeRange>,
    /// Service location.
    pub location: Option<Location>,
    /// Merchant data echoed back unchanged.
    pub attach: Option<String>,
    /// Callback URL for order state changes.
    pub notify_url: Option<String>,
    /// WeChat Pay order id.
    pub order_id: Option<String>,
    /// Opaque token handed to the mini-program confirmation page.
    pub package: Option<String>,
    /// Whether WeChat Pay collects the payment.
    pub need_collection: Option<bool>,
    /// Collection progress.
    pub collection: Option<Collection>,
    /// User openid under `appid`.
    pub openid: Option<String>,
    /// User openid under `sub_appid`.
    pub sub_openid: Option<String>,
}

/// A charge line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPayment {
    /// Line name.
    pub name: Option<String>,
    /// Amount in fen.
    pub amount: Option<i64>,
    /// Line description.
    pub description: Option<String>,
    /// Quantity.
    pub count: Option<u32>,
}

/// A discount line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostDiscount {
    /// Line name.
    pub name: Option<String>,
    /// Line description.
    pub description: Option<String>,
    /// Amount in fen.
    pub amount: Option<i64>,
    /// Quantity.
    pub count: Option<u32>,
}

/// The deposit the service would otherwise require.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskFund {
    /// `DEPOSIT`, `ADVANCE`, `CASH_DEPOSIT` or `ESTIMATE_ORDER_COST`.
    pub name: Option<String>,
    /// Amount in fen.
    pub amount: Option<i64>,
    /// Line description.
    pub description: Option<String>,
}

/// When the service starts and ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeRange {
    /// Start time, `yyyyMMddHHmmss` or `OnAccept`.
    pub start_time: Option<String>,
    /// Start time remark.
    pub start_time_remark: Option<String>,
    /// End time, `yyyyMMddHHmmss`.
    pub end_time: Option<String>,
    /// End time remark.
    pub end_time_remark: Option<String>,
}

/// Where the service starts and ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Where the service starts.
    pub start_location: Option<String>,
    /// Where the service ends.
    pub end_location: Option<String>,
}

/// Collection progress of a completed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
    /// `USER_PAYING` or `USER_PAID`.
    pub state: Option<String>,
    /// Total amount in fen.
    pub total_amount: Option<i64>,
    /// Amount still being collected, in fen.
    pub paying_amount: Option<i64>,
    /// Amount collected, in fen.
    pub paid_amount: Option<i64>,
    /// Collection attempts.
    pub details: Vec<CollectionDetail>,
}

/// One collection attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionDetail {
    /// Attempt sequence number.
    pub seq: Option<u32>,
    /// Amount in fen.
    pub amount: Option<i64>,
    /// `NEWTON` (WeChat Pay Score) or `MCH` (merchant channel).
    pub paid_type: Option<String>,
    /// Time the attempt succeeded.
    pub paid_time: Option<String>,
    /// WeChat Pay transaction id.
    pub transaction_id: Option<String>,
}

/// A sub-merchant's application to use a pay-after-use service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindServiceApplication {
    /// Pay-after-use service id.
    pub service_id: Option<String>,
    /// Merchant application number.
    pub out_apply_no: Option<String>,
    /// Sub-merchant id.
    pub sub_mchid: Option<String>,
    /// `APPLYING`, `AUDIT_PASS` or `AUDIT_REJECT`.
    pub apply_state: Option<String>,
    /// Why the application was rejected.
    pub reject_reason: Option<String>,
    /// Application time.
    pub apply_time: Option<String>,
}

impl ClientV3 {
    /// Creates a service order.
    ///
    /// `bm` must carry `service_id`, `sub_mchid` and `out_order_no`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if a
    /// required field is absent, otherwise as [`rpay::Gateway::post`].
    pub async fn score_partner_create(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<ServiceOrder>, Error> {
        CREATE.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(constants::SCORE_PARTNER_SERVICE_ORDER, &[], None)?;
        gateway
            .post(ctx, "POST /v3/payscore/partner/serviceorder", url, bm)
            .await
    }

    /// Queries a service order.
    ///
    /// # Errors
    ///
    /// As [`rpay::Gateway::get`].
    pub async fn score_partner_query(
        &self,
        ctx: &Context,
        order_no: ScoreOrderNo<'_>,
        service_id: &str,
        sub_mchid: &str,
    ) -> Result<Envelope<ServiceOrder>, Error> {
        let (key, no) = order_no.query_pair();
        let mut query = BodyMap::new();
        query
            .set("service_id", service_id)
            .set("sub_mchid", sub_mchid)
            .set(key, no);
        let gateway = self.gateway();
        let url = gateway.url(constants::SCORE_PARTNER_SERVICE_ORDER, &[], Some(&query))?;
        gateway
            .get(ctx, "GET /v3/payscore/partner/serviceorder", url)
            .await
    }

    /// Cancels an order that has not been completed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if an
    /// argument is empty, otherwise as [`rpay::Gateway::post_empty`].
    pub async fn score_partner_cancel(
        &self,
        ctx: &Context,
        out_order_no: &str,
        service_id: &str,
        sub_mchid: &str,
        reason: &str,
    ) -> Result<Envelope<()>, Error> {
        let mut bm = BodyMap::new();
        bm.set("service_id", service_id)
            .set("sub_mchid", sub_mchid)
            .set("reason", reason);
        self.order_action(
            ctx,
            "POST /v3/payscore/partner/serviceorder/{out_order_no}/cancel",
            out_order_no,
            "cancel",
            CANCEL,
            &bm,
        )
        .await
    }

    /// Changes the amount of an order awaiting completion.
    ///
    /// `bm` must carry `service_id` and `sub_mchid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if a
    /// required field is absent, otherwise as [`rpay::Gateway::post_empty`].
    pub async fn score_partner_modify(
        &self,
        ctx: &Context,
        out_order_no: &str,
        bm: &BodyMap,
    ) -> Result<Envelope<()>, Error> {
        self.order_action(
            ctx,
            "POST /v3/payscore/partner/serviceorder/{out_order_no}/modify",
            out_order_no,
            "modify",
            MODIFY,
            bm,
        )
        .await
    }

    /// Completes an order and charges the user.
    ///
    /// `bm` must carry `service_id` and `sub_mchid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if a
    /// required field is absent, otherwise as [`rpay::Gateway::post_empty`].
    pub async fn score_partner_complete(
        &self,
        ctx: &Context,
        out_order_no: &str,
        bm: &BodyMap,
    ) -> Result<Envelope<()>, Error> {
        self.order_action(
            ctx,
            "POST /v3/payscore/partner/serviceorder/{out_order_no}/complete",
            out_order_no,
            "complete",
            COMPLETE,
            bm,
        )
        .await
    }

    /// Asks WeChat Pay to collect an unpaid completed order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if an
    /// argument is empty, otherwise as [`rpay::Gateway::post_empty`].
    pub async fn score_partner_pay(
        &self,
        ctx: &Context,
        out_order_no: &str,
        service_id: &str,
        sub_mchid: &str,
    ) -> Result<Envelope<()>, Error> {
        let mut bm = BodyMap::new();
        bm.set("service_id", service_id).set("sub_mchid", sub_mchid);
        self.order_action(
            ctx,
            "POST /v3/payscore/partner/serviceorder/{out_order_no}/pay",
            out_order_no,
            "pay",
            PAY,
            &bm,
        )
        .await
    }

    /// Reports that an order was settled through another channel.
    ///
    /// `bm` must carry `service_id`, `sub_mchid` and `type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if a
    /// required field is absent, otherwise as [`rpay::Gateway::post_empty`].
    pub async fn score_partner_sync(
        &self,
        ctx: &Context,
        out_order_no: &str,
        bm: &BodyMap,
    ) -> Result<Envelope<()>, Error> {
        self.order_action(
            ctx,
            "POST /v3/payscore/partner/serviceorder/{out_order_no}/sync",
            out_order_no,
            "sync",
            SYNC,
            bm,
        )
        .await
    }

    /// Applies for a sub-merchant to use a pay-after-use service.
    ///
    /// `bm` must carry `service_id` and `out_apply_no`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if a
    /// required field is absent, otherwise as [`rpay::Gateway::post`].
    pub async fn score_partner_bind_service(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<BindServiceApplication>, Error> {
        BIND_SERVICE.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(constants::SCORE_PARTNER_BIND_SERVICE, &[], None)?;
        gateway
            .post(
                ctx,
                "POST /v3/payscore/partner/service-account-applications",
                url,
                bm,
            )
            .await
    }

    /// Queries a binding application.
    ///
    /// # Errors
    ///
    /// As [`rpay::Gateway::get`].
    pub async fn score_partner_bind_service_query(
        &self,
        ctx: &Context,
        out_apply_no: &str,
    ) -> Result<Envelope<BindServiceApplication>, Error> {
        let gateway = self.gateway();
        let url = gateway.url(constants::SCORE_PARTNER_BIND_SERVICE, &[out_apply_no], None)?;
        gateway
            .get(
                ctx,
                "GET /v3/payscore/partner/service-account-applications/{out_apply_no}",
                url,
            )
            .await
    }

    async fn order_action(
        &self,
        ctx: &Context,
        context: &'static str,
        out_order_no: &str,
        action: &str,
        schema: Schema,
        bm: &BodyMap,
    ) -> Result<Envelope<()>, Error> {
        schema.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(
            constants::SCORE_PARTNER_SERVICE_ORDER,
            &[out_order_no, action],
            None,
        )?;
        gateway.post_empty(ctx, context, url, bm).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{mock_client, signed};
    use rpay::{MissingFieldError, Verification, VerificationError};
    use wiremock::matchers::{body_json_string, method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_create() {
        let (server, client) = mock_client().await;
        Mock::given(method("POST"))
            .and(path("/v3/payscore/partner/serviceorder"))
            .respond_with(signed(
                200,
                r#"{"service_id":"500001","out_order_no":"1234323JKHDFE1243252","state":"CREATED","post_payments":[{"name":"就餐费用","amount":40000,"count":1}],"risk_fund":{"name":"ESTIMATE_ORDER_COST","amount":10000},"package":"DJIOSQPYWDxsjdldeskfDSFL"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut bm = BodyMap::new();
        bm.set("service_id", "500001")
            .set("sub_mchid", "1900000109")
            .set("out_order_no", "1234323JKHDFE1243252")
            .set_body_map("risk_fund", |rf| {
                rf.set("name", "ESTIMATE_ORDER_COST").set("amount", 10000);
            });
        let order = client
            .score_partner_create(&Context::new(), &bm)
            .await
            .unwrap()
            .into_verified()
            .unwrap();
        assert_eq!(order.state.as_deref(), Some("CREATED"));
        assert_eq!(order.post_payments[0].amount, Some(40000));
        assert_eq!(order.risk_fund.unwrap().amount, Some(10000));
    }

    #[tokio::test]
    async fn test_create_requires_out_order_no() {
        let (server, client) = mock_client().await;
        Mock::given(method("POST"))
            .respond_with(signed(200, "{}"))
            .expect(0)
            .mount(&server)
            .await;

        let mut bm = BodyMap::new();
        bm.set("service_id", "500001").set("sub_mchid", "1900000109");
        let err = client
            .score_partner_create(&Context::new(), &bm)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingField(MissingFieldError { ref key }) if key == "out_order_no"
        ));
    }

    #[tokio::test]
    async fn test_query_by_query_id() {
        let (server, client) = mock_client().await;
        Mock::given(method("GET"))
            .and(path("/v3/payscore/partner/serviceorder"))
            .and(query_param("service_id", "500001"))
            .and(query_param("sub_mchid", "1900000109"))
            .and(query_param("query_id", "15646546545165651651"))
            .respond_with(signed(
                200,
                r#"{"state":"DONE","collection":{"state":"USER_PAID","paid_amount":40000,"details":[{"seq":1,"amount":40000,"paid_type":"NEWTON"}]}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let env = client
            .score_partner_query(
                &Context::new(),
                ScoreOrderNo::QueryId("15646546545165651651"),
                "500001",
                "1900000109",
            )
            .await
            .unwrap();
        assert!(env.is_verified());
        let collection = env.into_payload().unwrap().collection.unwrap();
        assert_eq!(collection.details[0].paid_type.as_deref(), Some("NEWTON"));
    }

    #[tokio::test]
    async fn test_cancel_acknowledged() {
        let (server, client) = mock_client().await;
        Mock::given(method("POST"))
            .and(path("/v3/payscore/partner/serviceorder/ORDER%201/cancel"))
            .and(body_json_string(
                r#"{"service_id":"500001","sub_mchid":"1900000109","reason":"user cancelled"}"#,
            ))
            .respond_with(signed(204, ""))
            .expect(1)
            .mount(&server)
            .await;

        let env = client
            .score_partner_cancel(
                &Context::new(),
                "ORDER 1",
                "500001",
                "1900000109",
                "user cancelled",
            )
            .await
            .unwrap();
        assert!(env.is_success());
        assert_eq!(env.status().code(), 0);
        assert!(matches!(env.verification(), Verification::Verified));
    }

    #[tokio::test]
    async fn test_cancel_requires_reason() {
        let (server, client) = mock_client().await;
        let err = client
            .score_partner_cancel(&Context::new(), "ORDER1", "500001", "1900000109", "")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "missing required field: reason");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_actions_use_their_paths() {
        let (server, client) = mock_client().await;
        for action in ["modify", "complete", "pay", "sync"] {
            Mock::given(method("POST"))
                .and(path(format!("/v3/payscore/partner/serviceorder/ORDER1/{action}")))
                .respond_with(signed(204, ""))
                .expect(1)
                .mount(&server)
                .await;
        }

        let ctx = Context::new();
        let mut bm = BodyMap::new();
        bm.set("service_id", "500001").set("sub_mchid", "1900000109");
        assert!(client.score_partner_modify(&ctx, "ORDER1", &bm).await.unwrap().is_verified());
        assert!(client.score_partner_complete(&ctx, "ORDER1", &bm).await.unwrap().is_verified());
        assert!(
            client
                .score_partner_pay(&ctx, "ORDER1", "500001", "1900000109")
                .await
                .unwrap()
                .is_verified()
        );
        bm.set("type", "Order_Paid");
        assert!(client.score_partner_sync(&ctx, "ORDER1", &bm).await.unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_sync_requires_type() {
        let (_server, client) = mock_client().await;
        let mut bm = BodyMap::new();
        bm.set("service_id", "500001").set("sub_mchid", "1900000109");
        let err = client
            .score_partner_sync(&Context::new(), "ORDER1", &bm)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "missing required field: type");
    }

    #[tokio::test]
    async fn test_complete_rejected_is_raw() {
        let (server, client) = mock_client().await;
        let body = r#"{"code":"ORDER_NOT_EXIST","message":"order does not exist"}"#;
        Mock::given(method("POST"))
            .and(path("/v3/payscore/partner/serviceorder/ORDER1/complete"))
            .respond_with(ResponseTemplate::new(404).set_body_string(body))
            .mount(&server)
            .await;

        let mut bm = BodyMap::new();
        bm.set("service_id", "500001").set("sub_mchid", "1900000109");
        let env = client
            .score_partner_complete(&Context::new(), "ORDER1", &bm)
            .await
            .unwrap();
        assert_eq!(env.status().code(), 404);
        assert_eq!(env.error_text(), Some(body));
        assert!(env.into_verified().is_err());
    }

    #[tokio::test]
    async fn test_bind_service_tampered_signature_keeps_payload() {
        let (server, client) = mock_client().await;
        let template = signed(200, r#"{"apply_state":"APPLYING"}"#)
            .set_body_string(r#"{"apply_state":"AUDIT_PASS"}"#);
        Mock::given(method("POST"))
            .and(path("/v3/payscore/partner/service-account-applications"))
            .respond_with(template)
            .mount(&server)
            .await;

        let mut bm = BodyMap::new();
        bm.set("service_id", "500001").set("out_apply_no", "APPLY1");
        let env = client
            .score_partner_bind_service(&Context::new(), &bm)
            .await
            .unwrap();
        assert_eq!(env.payload().unwrap().apply_state.as_deref(), Some("AUDIT_PASS"));
        assert!(matches!(
            env.verification_error(),
            Some(VerificationError::Mismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_bind_service_query_is_get() {
        let (server, client) = mock_client().await;
        Mock::given(method("GET"))
            .and(path("/v3/payscore/partner/service-account-applications/APPLY1"))
            .respond_with(signed(
                200,
                r#"{"service_id":"500001","out_apply_no":"APPLY1","apply_state":"AUDIT_PASS"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let app = client
            .score_partner_bind_service_query(&Context::new(), "APPLY1")
            .await
            .unwrap()
            .into_verified()
            .unwrap();
        assert_eq!(app.apply_state.as_deref(), Some("AUDIT_PASS"));
    }
}
