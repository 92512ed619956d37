//! Bank and branch lookup.
//!
//! Used when collecting settlement account details from sub-merchants.

use rpay::{BodyMap, Context, Envelope, Error};
use serde::{Deserialize, Serialize};

use crate::ClientV3;
use crate::constants;

/// A page of banks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankList {
    /// Total number of banks across all pages.
    pub total_count: Option<u32>,
    /// Number of banks on this page.
    pub count: Option<u32>,
    /// The banks.
    pub data: Vec<Bank>,
    /// Offset of this page.
    pub offset: Option<u32>,
    /// Paging links.
    pub links: Option<Links>,
}

/// One bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bank {
    /// Display name.
    pub bank_alias: Option<String>,
    /// Code used by the branch lookup.
    pub bank_alias_code: Option<String>,
    /// Account-opening bank.
    pub account_bank: Option<String>,
    /// Account-opening bank code.
    pub account_bank_code: Option<u32>,
    /// Whether a branch must be supplied.
    pub need_bank_branch: Option<bool>,
}

/// Paging links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    /// Next page.
    pub next: Option<String>,
    /// Previous page.
    pub prev: Option<String>,
    /// This page.
    #[serde(rename = "self")]
    pub current: Option<String>,
}

/// A page of branches of one bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchList {
    /// Total number of branches across all pages.
    pub total_count: Option<u32>,
    /// Number of branches on this page.
    pub count: Option<u32>,
    /// The branches.
    pub data: Vec<Branch>,
    /// Offset of this page.
    pub offset: Option<u32>,
    /// Paging links.
    pub links: Option<Links>,
    /// Account-opening bank.
    pub account_bank: Option<String>,
    /// Account-opening bank code.
    pub account_bank_code: Option<u32>,
    /// Bank display name.
    pub bank_alias: Option<String>,
    /// Bank alias code.
    pub bank_alias_code: Option<String>,
}

/// One branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branch {
    /// Branch name.
    pub bank_branch_name: Option<String>,
    /// Branch id.
    pub bank_branch_id: Option<String>,
}

impl ClientV3 {
    /// Lists banks that support personal accounts.
    ///
    /// `bm` carries the paging parameters (`offset`, `limit`).
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if the request cannot be signed or sent, or a success
    /// body does not decode.
    pub async fn banks_personal_banking(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<BankList>, Error> {
        let gateway = self.gateway();
        let url = gateway.url(constants::BANKS_PERSONAL_BANKING, &[], Some(bm))?;
        gateway
            .get(ctx, "GET /v3/capital/capitallhh/banks/personal-banking", url)
            .await
    }

    /// Lists banks that support corporate accounts.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if the request cannot be signed or sent, or a success
    /// body does not decode.
    pub async fn banks_corporate_banking(
        &self,
        ctx: &Context,
        bm: &BodyMap,
    ) -> Result<Envelope<BankList>, Error> {
        let gateway = self.gateway();
        let url = gateway.url(constants::BANKS_CORPORATE_BANKING, &[], Some(bm))?;
        gateway
            .get(ctx, "GET /v3/capital/capitallhh/banks/corporate-banking", url)
            .await
    }

    /// Lists the branches of the bank identified by `bank_alias_code`.
    ///
    /// `bm` must carry `city_code` and may carry `offset` and `limit`; the
    /// gateway validates them.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if the request cannot be signed or sent, or a success
    /// body does not decode.
    pub async fn banks_branches(
        &self,
        ctx: &Context,
        bank_alias_code: &str,
        bm: &BodyMap,
    ) -> Result<Envelope<BranchList>, Error> {
        let gateway = self.gateway();
        let url = gateway.url(constants::BANKS, &[bank_alias_code, "branches"], Some(bm))?;
        gateway
            .get(ctx, "GET /v3/capital/capitallhh/banks/{code}/branches", url)
            .await
    }
}
