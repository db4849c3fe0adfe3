//! Payloads of every constructible operation.
//!
//! Field order is wire order. Every payload starts with `fee`, which callers
//! leave at its zero default and the fee assembler fills in.

use super::Operation;
use crate::codec::Bytes;
use crate::crypto::PublicKey;
use crate::memo::Memo;
use crate::types::{
    AccountId, AccountOptions, AssetAmount, AssetId, AssetOptions, Authority, BalanceId,
    BitAssetOptions, CallOrderExtensions, CommitteeMemberId, Extensions, HtlcHash, HtlcId,
    LimitOrderId, Price, PriceFeed, ProposalId, TimePointSec, VestingBalanceId, VestingPolicy,
    WitnessId, WorkerInitializer,
};

// ---------------------------------------------------------------------------
// Transfers and markets
// ---------------------------------------------------------------------------

graphene_object! {
    /// Moves `amount` from one account to another, optionally with a memo.
    pub struct Transfer {
        #[serde(default)]
        pub fee: AssetAmount,
        pub from: AccountId,
        pub to: AccountId,
        pub amount: AssetAmount,
        pub memo: Option<Memo>,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct LimitOrderCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub seller: AccountId,
        pub amount_to_sell: AssetAmount,
        pub min_to_receive: AssetAmount,
        /// The order is cancelled automatically at this time.
        pub expiration: TimePointSec,
        pub fill_or_kill: bool,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct LimitOrderCancel {
        #[serde(default)]
        pub fee: AssetAmount,
        pub fee_paying_account: AccountId,
        pub order: LimitOrderId,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    /// Adjusts a margin position. Negative deltas reduce it.
    pub struct CallOrderUpdate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub funding_account: AccountId,
        pub delta_collateral: AssetAmount,
        pub delta_debt: AssetAmount,
        #[serde(default)]
        pub extensions: CallOrderExtensions,
    }
}

graphene_object! {
    pub struct BidCollateral {
        #[serde(default)]
        pub fee: AssetAmount,
        pub bidder: AccountId,
        pub additional_collateral: AssetAmount,
        pub debt_covered: AssetAmount,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

graphene_object! {
    /// Registers a new account. The registrar pays the fee.
    pub struct AccountCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub registrar: AccountId,
        pub referrer: AccountId,
        /// Share of the fee going to the referrer, 1/100 of a percent.
        pub referrer_percent: u16,
        pub name: String,
        pub owner: Authority,
        pub active: Authority,
        pub options: AccountOptions,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    /// Replaces any of an account's authorities or options.
    pub struct AccountUpdate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub account: AccountId,
        pub owner: Option<Authority>,
        pub active: Option<Authority>,
        pub new_options: Option<AccountOptions>,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AccountWhitelist {
        #[serde(default)]
        pub fee: AssetAmount,
        pub authorizing_account: AccountId,
        pub account_to_list: AccountId,
        /// 0 = none, 1 = white, 2 = black, 3 = both.
        pub new_listing: u8,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AccountUpgrade {
        #[serde(default)]
        pub fee: AssetAmount,
        pub account_to_upgrade: AccountId,
        pub upgrade_to_lifetime_member: bool,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AccountTransfer {
        #[serde(default)]
        pub fee: AssetAmount,
        pub account_id: AccountId,
        pub new_owner: AccountId,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

graphene_object! {
    pub struct AssetCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub symbol: String,
        pub precision: u8,
        pub common_options: AssetOptions,
        /// Present only for market-pegged assets.
        pub bitasset_opts: Option<BitAssetOptions>,
        pub is_prediction_market: bool,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetUpdate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub asset_to_update: AssetId,
        pub new_issuer: Option<AccountId>,
        pub new_options: AssetOptions,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetUpdateBitasset {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub asset_to_update: AssetId,
        pub new_options: BitAssetOptions,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetUpdateFeedProducers {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub asset_to_update: AssetId,
        pub new_feed_producers: Vec<AccountId>,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetIssue {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub asset_to_issue: AssetAmount,
        pub issue_to_account: AccountId,
        pub memo: Option<Memo>,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetReserve {
        #[serde(default)]
        pub fee: AssetAmount,
        pub payer: AccountId,
        pub amount_to_reserve: AssetAmount,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetFundFeePool {
        #[serde(default)]
        pub fee: AssetAmount,
        pub from_account: AccountId,
        pub asset_id: AssetId,
        /// Always in the core asset.
        #[serde(with = "crate::types::int_or_string")]
        pub amount: i64,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetSettle {
        #[serde(default)]
        pub fee: AssetAmount,
        pub account: AccountId,
        pub amount: AssetAmount,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetGlobalSettle {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub asset_to_settle: AssetId,
        pub settle_price: Price,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetPublishFeed {
        #[serde(default)]
        pub fee: AssetAmount,
        pub publisher: AccountId,
        pub asset_id: AssetId,
        pub feed: PriceFeed,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetClaimFees {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub amount_to_claim: AssetAmount,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetClaimPool {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub asset_id: AssetId,
        pub amount_to_claim: AssetAmount,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct AssetUpdateIssuer {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub asset_to_update: AssetId,
        pub new_issuer: AccountId,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    /// Moves an asset between two accounts on the issuer's authority.
    pub struct OverrideTransfer {
        #[serde(default)]
        pub fee: AssetAmount,
        pub issuer: AccountId,
        pub from: AccountId,
        pub to: AccountId,
        pub amount: AssetAmount,
        pub memo: Option<Memo>,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

// ---------------------------------------------------------------------------
// Witnesses, committee, workers
// ---------------------------------------------------------------------------

// The next few payloads predate the extensions convention and end without one.

graphene_object! {
    pub struct WitnessCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub witness_account: AccountId,
        pub url: String,
        pub block_signing_key: PublicKey,
    }
}

graphene_object! {
    pub struct WitnessUpdate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub witness: WitnessId,
        pub witness_account: AccountId,
        pub new_url: Option<String>,
        pub new_signing_key: Option<PublicKey>,
    }
}

graphene_object! {
    pub struct CommitteeMemberCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub committee_member_account: AccountId,
        pub url: String,
    }
}

graphene_object! {
    pub struct CommitteeMemberUpdate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub committee_member: CommitteeMemberId,
        pub committee_member_account: AccountId,
        pub new_url: Option<String>,
    }
}

graphene_object! {
    pub struct WorkerCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub owner: AccountId,
        pub work_begin_date: TimePointSec,
        pub work_end_date: TimePointSec,
        #[serde(with = "crate::types::int_or_string")]
        pub daily_pay: i64,
        pub name: String,
        pub url: String,
        pub initializer: WorkerInitializer,
    }
}

graphene_object! {
    pub struct WithdrawPermissionCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub withdraw_from_account: AccountId,
        pub authorized_account: AccountId,
        pub withdrawal_limit: AssetAmount,
        pub withdrawal_period_sec: u32,
        pub periods_until_expiration: u32,
        pub period_start_time: TimePointSec,
    }
}

// ---------------------------------------------------------------------------
// Vesting and balances
// ---------------------------------------------------------------------------

graphene_object! {
    pub struct VestingBalanceCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub creator: AccountId,
        pub owner: AccountId,
        pub amount: AssetAmount,
        pub policy: VestingPolicy,
    }
}

graphene_object! {
    pub struct VestingBalanceWithdraw {
        #[serde(default)]
        pub fee: AssetAmount,
        pub vesting_balance: VestingBalanceId,
        pub owner: AccountId,
        pub amount: AssetAmount,
    }
}

graphene_object! {
    /// Claims a genesis balance held by a key rather than an account.
    pub struct BalanceClaim {
        #[serde(default)]
        pub fee: AssetAmount,
        pub deposit_to_account: AccountId,
        pub balance_to_claim: BalanceId,
        pub balance_owner_key: PublicKey,
        pub total_claimed: AssetAmount,
    }
}

graphene_object! {
    /// Opaque application data, signed by `required_auths`.
    pub struct Custom {
        #[serde(default)]
        pub fee: AssetAmount,
        pub payer: AccountId,
        pub required_auths: Vec<AccountId>,
        pub id: u16,
        pub data: Bytes,
    }
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

graphene_object! {
    /// One operation inside a proposal.
    pub struct OpWrapper {
        pub op: Operation,
    }
}

impl From<Operation> for OpWrapper {
    fn from(op: Operation) -> Self {
        Self { op }
    }
}

graphene_object! {
    /// Proposes a set of operations to be executed once every required
    /// authority has approved them.
    pub struct ProposalCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub fee_paying_account: AccountId,
        pub expiration_time: TimePointSec,
        pub proposed_ops: Vec<OpWrapper>,
        /// Required when the proposal touches committee-owned accounts.
        pub review_period_seconds: Option<u32>,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct ProposalUpdate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub fee_paying_account: AccountId,
        pub proposal: ProposalId,
        #[serde(default)]
        pub active_approvals_to_add: Vec<AccountId>,
        #[serde(default)]
        pub active_approvals_to_remove: Vec<AccountId>,
        #[serde(default)]
        pub owner_approvals_to_add: Vec<AccountId>,
        #[serde(default)]
        pub owner_approvals_to_remove: Vec<AccountId>,
        #[serde(default)]
        pub key_approvals_to_add: Vec<PublicKey>,
        #[serde(default)]
        pub key_approvals_to_remove: Vec<PublicKey>,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct ProposalDelete {
        #[serde(default)]
        pub fee: AssetAmount,
        pub fee_paying_account: AccountId,
        pub using_owner_authority: bool,
        pub proposal: ProposalId,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

// ---------------------------------------------------------------------------
// Hashed time-locked contracts
// ---------------------------------------------------------------------------

graphene_object! {
    pub struct HtlcCreate {
        #[serde(default)]
        pub fee: AssetAmount,
        pub from: AccountId,
        pub to: AccountId,
        pub amount: AssetAmount,
        pub preimage_hash: HtlcHash,
        pub preimage_size: u16,
        pub claim_period_seconds: u32,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct HtlcRedeem {
        #[serde(default)]
        pub fee: AssetAmount,
        pub htlc_id: HtlcId,
        pub redeemer: AccountId,
        pub preimage: Bytes,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

graphene_object! {
    pub struct HtlcExtend {
        #[serde(default)]
        pub fee: AssetAmount,
        pub htlc_id: HtlcId,
        pub update_issuer: AccountId,
        pub seconds_to_add: u32,
        #[serde(default)]
        pub extensions: Extensions,
    }
}
