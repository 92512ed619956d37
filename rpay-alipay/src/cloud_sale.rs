//! Cloud-sale withholding.
//!
//! Every response embeds an [`ErrorResponse`]; a `200` whose `code` is not
//! `10000` is a business failure the gateway nonetheless signed.

use rpay::{BodyMap, Context, Envelope, Error, Field, Schema};
use serde::{Deserialize, Serialize};

use crate::Client;
use crate::constants;
use crate::error::ErrorResponse;

const PAY: Schema = Schema::new(&[
    Field::required("out_trade_no"),
    Field::required("total_amount"),
    Field::required("subject"),
    Field::required("user_id"),
    Field::optional("agreement_no"),
    Field::optional("product_code"),
    Field::optional("body"),
]);

const PAY_CANCEL: Schema = Schema::new(&[Field::required("out_trade_no")]);

const REFUND: Schema = Schema::new(&[
    Field::required("out_trade_no"),
    Field::required("refund_amount"),
    Field::optional("out_request_no"),
    Field::optional("refund_reason"),
]);

const PAY_QUERY: Schema = Schema::new(&[Field::required("out_trade_no")]);

/// Result of a withholding charge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSalePay {
    /// Business result.
    #[serde(flatten)]
    pub result: ErrorResponse,
    /// Merchant order number.
    pub out_trade_no: Option<String>,
    /// Alipay trade number.
    pub trade_no: Option<String>,
    /// Charged amount in yuan, e.g. `"9.90"`.
    pub total_amount: Option<String>,
    /// Payment time.
    pub gmt_payment: Option<String>,
}

/// Result of cancelling a charge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSalePayCancel {
    /// Business result.
    #[serde(flatten)]
    pub result: ErrorResponse,
    /// Merchant order number.
    pub out_trade_no: Option<String>,
    /// Alipay trade number.
    pub trade_no: Option<String>,
    /// `close` if the charge never completed, `refund` if it was reversed.
    pub action: Option<String>,
}

/// Result of a refund.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSaleRefund {
    /// Business result.
    #[serde(flatten)]
    pub result: ErrorResponse,
    /// Merchant order number.
    pub out_trade_no: Option<String>,
    /// Alipay trade number.
    pub trade_no: Option<String>,
    /// Total refunded so far, in yuan.
    pub refund_fee: Option<String>,
    /// Refund time.
    pub gmt_refund_pay: Option<String>,
}

/// State of a charge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSalePayQuery {
    /// Business result.
    #[serde(flatten)]
    pub result: ErrorResponse,
    /// Merchant order number.
    pub out_trade_no: Option<String>,
    /// Alipay trade number.
    pub trade_no: Option<String>,
    /// `WAIT_BUYER_PAY`, `TRADE_CLOSED`, `TRADE_SUCCESS` or `TRADE_FINISHED`.
    pub trade_status: Option<String>,
    /// Amount in yuan.
    pub total_amount: Option<String>,
    /// Order subject.
    pub subject: Option<String>,
    /// Payment time.
    pub gmt_payment: Option<String>,
}

impl Client {
    /// Charges the user once under an existing withholding agreement.
    ///
    /// `bm` must carry `out_trade_no`, `total_amount`, `subject` and `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if a
    /// required field is absent, otherwise as [`rpay::Gateway::post`].
    pub async fn cloud_sale_api_pay(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<CloudSalePay>, Error> {
        PAY.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(constants::CLOUD_SALE_API_PAY, &[], None)?;
        gateway
            .post(ctx, "POST /v3/alipay/cloudsale/api/pay", url, bm)
            .await
    }

    /// Cancels a charge, refunding it if it already succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if
    /// `out_trade_no` is absent, otherwise as [`rpay::Gateway::post`].
    pub async fn cloud_sale_api_pay_cancel(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<CloudSalePayCancel>, Error> {
        PAY_CANCEL.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(constants::CLOUD_SALE_API_PAY_CANCEL, &[], None)?;
        gateway
            .post(ctx, "POST /v3/alipay/cloudsale/api/pay/cancel", url, bm)
            .await
    }

    /// Refunds part or all of a charge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if
    /// `out_trade_no` or `refund_amount` is absent, otherwise as
    /// [`rpay::Gateway::post`].
    pub async fn cloud_sale_api_refund(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<CloudSaleRefund>, Error> {
        REFUND.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(constants::CLOUD_SALE_API_REFUND, &[], None)?;
        gateway
            .post(ctx, "POST /v3/alipay/cloudsale/api/refund", url, bm)
            .await
    }

    /// Queries a charge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if
    /// `out_trade_no` is absent, otherwise as [`rpay::Gateway::post`].
    pub async fn cloud_sale_api_pay_query(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<CloudSalePayQuery>, Error> {
        PAY_QUERY.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(constants::CLOUD_SALE_API_PAY_QUERY, &[], None)?;
        gateway
            .post(ctx, "POST /v3/alipay/cloudsale/api/pay/query", url, bm)
            .await
    }
}
