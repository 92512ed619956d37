//! Production endpoint and request paths.

/// Production base URL.
pub const BASE_URL: &str = "https://openapi.alipay.com";

/// Single withholding charge.
pub const CLOUD_SALE_API_PAY: &str = "/v3/alipay/cloudsale/api/pay";
/// Cancels a pending withholding charge.
pub const CLOUD_SALE_API_PAY_CANCEL: &str = "/v3/alipay/cloudsale/api/pay/cancel";
/// Refunds a charge.
pub const CLOUD_SALE_API_REFUND: &str = "/v3/alipay/cloudsale/api/refund";
/// Queries a charge.
pub const CLOUD_SALE_API_PAY_QUERY: &str = "/v3/alipay/cloudsale/api/pay/query";
