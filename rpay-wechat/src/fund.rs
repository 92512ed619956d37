//! Balances and withdrawals for e-commerce platforms and their sub-merchants.

use rpay::{BodyMap, Context, Envelope, Error, Field, Schema};
use serde::{Deserialize, Serialize};

use crate::ClientV3;
use crate::constants;

const ENDDAY_BALANCE: Schema = Schema::new(&[
    Field::required("date"),
    Field::optional("account_type"),
]);

const ECOMMERCE_WITHDRAW: Schema = Schema::new(&[
    Field::required("sub_mchid"),
    Field::required("out_request_no"),
    Field::required("amount"),
    Field::optional("remark"),
    Field::optional("bank_memo"),
    Field::optional("account_type"),
]);

const MERCHANT_WITHDRAW: Schema = Schema::new(&[
    Field::required("out_request_no"),
    Field::required("amount"),
    Field::required("account_type"),
    Field::optional("remark"),
    Field::optional("bank_memo"),
]);

/// Selects a platform withdrawal by one of its identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawOrderNo<'a> {
    /// The WeChat Pay withdrawal id.
    WithdrawId(&'a str),
    /// The merchant's own request number.
    OutRequestNo(&'a str),
}

/// A sub-merchant's end-of-day balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnddayBalance {
    /// Sub-merchant id.
    pub sub_mchid: Option<String>,
    /// Available balance in fen.
    pub available_amount: Option<i64>,
    /// Balance pending settlement in fen.
    pub pending_amount: Option<i64>,
}

/// Result of a sub-merchant withdrawal request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcommerceWithdraw {
    /// Sub-merchant id.
    pub sub_mchid: Option<String>,
    /// WeChat Pay withdrawal id.
    pub withdraw_id: Option<String>,
    /// Merchant request number.
    pub out_request_no: Option<String>,
}

/// Result of a platform withdrawal request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantWithdraw {
    /// WeChat Pay withdrawal id.
    pub withdraw_id: Option<String>,
    /// Merchant request number.
    pub out_request_no: Option<String>,
}

/// State of a platform withdrawal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantWithdrawStatus {
    /// `CREATE_SUCCESS`, `SUCCESS`, `FAIL`, `REFUND`, `CLOSE` or `INIT`.
    pub status: Option<String>,
    /// WeChat Pay withdrawal id.
    pub withdraw_id: Option<String>,
    /// Merchant request number.
    pub out_request_no: Option<String>,
    /// Amount in fen.
    pub amount: Option<i64>,
    /// RFC 3339 creation time.
    pub create_time: Option<String>,
    /// RFC 3339 last update time.
    pub update_time: Option<String>,
    /// Failure reason.
    pub reason: Option<String>,
    /// Merchant remark.
    pub remark: Option<String>,
    /// Memo shown on the bank statement.
    pub bank_memo: Option<String>,
    /// Account the funds came from.
    pub account_type: Option<String>,
    /// Suggested fix for a failed withdrawal.
    pub solution: Option<String>,
}

impl ClientV3 {
    /// Queries a sub-merchant's end-of-day balance.
    ///
    /// `bm` must carry `date` (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if `date`
    /// is absent, otherwise as [`rpay::Gateway::get`].
    pub async fn ecommerce_fund_endday_balance(
        &self,
        ctx: &Context,
        sub_mchid: &str,
        bm: &BodyMap,
    ) -> Result<Envelope<EnddayBalance>, Error> {
        ENDDAY_BALANCE.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(constants::ECOMMERCE_FUND_ENDDAY_BALANCE, &[sub_mchid], Some(bm))?;
        gateway
            .get(ctx, "GET /v3/ecommerce/fund/enddaybalance/{sub_mchid}", url)
            .await
    }

    /// Withdraws a sub-merchant's balance to its bank account.
    ///
    /// `bm` must carry `sub_mchid`, `out_request_no` and `amount` (fen).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if a
    /// required field is absent, otherwise as [`rpay::Gateway::post`].
    pub async fn ecommerce_fund_withdraw(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<EcommerceWithdraw>, Error> {
        ECOMMERCE_WITHDRAW.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(constants::ECOMMERCE_FUND_WITHDRAW, &[], None)?;
        gateway
            .post(ctx, "POST /v3/ecommerce/fund/withdraw", url, bm)
            .await
    }

    /// Withdraws the platform's own balance.
    ///
    /// `bm` must carry `out_request_no`, `amount` (fen) and `account_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] before any network activity if a
    /// required field is absent, otherwise as [`rpay::Gateway::post`].
    pub async fn merchant_fund_withdraw(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<MerchantWithdraw>, Error> {
        MERCHANT_WITHDRAW.validate(bm)?;
        let gateway = self.gateway();
        let url = gateway.url(constants::MERCHANT_FUND_WITHDRAW, &[], None)?;
        gateway
            .post(ctx, "POST /v3/merchant/fund/withdraw", url, bm)
            .await
    }

    /// Queries a platform withdrawal.
    ///
    /// # Errors
    ///
    /// As [`rpay::Gateway::get`].
    pub async fn merchant_fund_withdraw_query(
        &self,
        ctx: &Context,
        order_no: WithdrawOrderNo<'_>,
    ) -> Result<Envelope<MerchantWithdrawStatus>, Error> {
        let gateway = self.gateway();
        let (prefix, no, context) = match order_no {
            WithdrawOrderNo::WithdrawId(no) => (
                constants::MERCHANT_FUND_WITHDRAW_BY_ID,
                no,
                "GET /v3/merchant/fund/withdraw/withdraw-id/{withdraw_id}",
            ),
            WithdrawOrderNo::OutRequestNo(no) => (
                constants::MERCHANT_FUND_WITHDRAW_BY_OUT_REQUEST_NO,
                no,
                "GET /v3/merchant/fund/withdraw/out-request-no/{out_request_no}",
            ),
        };
        let url = gateway.url(prefix, &[no], None)?;
        gateway.get(ctx, context, url).await
    }
}
