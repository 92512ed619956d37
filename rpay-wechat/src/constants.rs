//! Production endpoint and request paths.

/// Production base URL.
pub const BASE_URL: &str = "https://api.mch.weixin.qq.com";

/// Banks supporting personal accounts.
pub const BANKS_PERSONAL_BANKING: &str = "/v3/capital/capitallhh/banks/personal-banking";
/// Banks supporting corporate accounts.
pub const BANKS_CORPORATE_BANKING: &str = "/v3/capital/capitallhh/banks/corporate-banking";
/// Prefix of `/{bank_alias_code}/branches`.
pub const BANKS: &str = "/v3/capital/capitallhh/banks";

/// Prefix of `/{sub_mchid}` for the end-of-day balance.
pub const ECOMMERCE_FUND_ENDDAY_BALANCE: &str = "/v3/ecommerce/fund/enddaybalance";
/// Sub-merchant withdrawal.
pub const ECOMMERCE_FUND_WITHDRAW: &str = "/v3/ecommerce/fund/withdraw";
/// Platform withdrawal.
pub const MERCHANT_FUND_WITHDRAW: &str = "/v3/merchant/fund/withdraw";
/// Prefix of `/{withdraw_id}`.
pub const MERCHANT_FUND_WITHDRAW_BY_ID: &str = "/v3/merchant/fund/withdraw/withdraw-id";
/// Prefix of `/{out_request_no}`.
pub const MERCHANT_FUND_WITHDRAW_BY_OUT_REQUEST_NO: &str =
    "/v3/merchant/fund/withdraw/out-request-no";

/// Pay-after-use service orders; also the prefix of `/{out_order_no}/{action}`.
pub const SCORE_PARTNER_SERVICE_ORDER: &str = "/v3/payscore/partner/serviceorder";
/// Service binding applications; also the prefix of `/{out_apply_no}`.
pub const SCORE_PARTNER_BIND_SERVICE: &str = "/v3/payscore/partner/service-account-applications";

/// Prefix of `/{face_sid}`.
pub const FACEMCH_USERS: &str = "/v3/facemch/users";
