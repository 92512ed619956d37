//! Face-payment user lookup.

use rpay::{BodyMap, Context, Envelope, Error};
use serde::{Deserialize, Serialize};

use crate::ClientV3;
use crate::constants;

/// The user behind a face-payment session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacemchUsers {
    /// Merchant id.
    pub mchid: Option<String>,
    /// App id the `openid` belongs to.
    pub appid: Option<String>,
    /// User openid under `appid`.
    pub openid: Option<String>,
    /// User unionid across the merchant's apps.
    pub unionid: Option<String>,
    /// Sub-merchant app id.
    pub sub_appid: Option<String>,
    /// User openid under `sub_appid`.
    pub sub_openid: Option<String>,
}

impl ClientV3 {
    /// Looks up the user of face-payment session `face_sid`.
    ///
    /// `bm` is sent as the query string.
    ///
    /// # Errors
    ///
    /// As [`rpay::Gateway::get`].
    pub async fn facemch_users(
        &self,
        ctx: &Context,
        face_sid: &str,
        bm: &BodyMap,
    ) -> Result<Envelope<FacemchUsers>, Error> {
        let gateway = self.gateway();
        let url = gateway.url(constants::FACEMCH_USERS, &[face_sid], Some(bm))?;
        gateway.get(ctx, "GET /v3/facemch/users/{face_sid}", url).await
    }
}
