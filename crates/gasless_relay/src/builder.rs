//! Builds the unsigned `[sponsor, user]` pair for a requested action.

use crate::error::SponsorError;
use base64::{Engine, prelude::BASE64_STANDARD};
use gasless_algod::{AlgodClient, TransactionParams};
use gasless_transact::{
    Address, ApplicationCallTransactionBuilder, AssetConfigTransactionBuilder, Byte32,
    OnApplicationComplete, PaymentTransactionBuilder, Transaction, TransactionHeader,
    TransactionHeaderBuilder, Transactions, compute_group,
};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// The flat fee the sponsor pays for a two-transaction group: its own fee plus the user's.
pub fn sponsor_fee(min_fee: u64) -> Result<u64, SponsorError> {
    min_fee
        .checked_mul(2)
        .ok_or_else(|| SponsorError::LedgerUnavailableError {
            message: format!("node reported an implausible minimum fee {min_fee}"),
        })
}

/// An application call argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AppArg {
    /// UTF-8 bytes of the string.
    Text(String),
    /// 8-byte big-endian integer.
    Uint(u64),
    /// Raw bytes, base64 in JSON.
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl AppArg {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            AppArg::Text(text) => text.as_bytes().to_vec(),
            AppArg::Uint(value) => value.to_be_bytes().to_vec(),
            AppArg::Bytes(bytes) => bytes.clone(),
        }
    }
}

mod base64_bytes {
    use base64::{Engine, prelude::BASE64_STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64_STANDARD.decode(encoded).map_err(D::Error::custom)
    }
}

/// Parameters of a sponsored payment.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentParams {
    #[serde_as(as = "DisplayFromStr")]
    pub receiver: Address,
    /// microALGO.
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Never sponsored. Accepted on the wire only so it can be refused explicitly.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_remainder_to: Option<Address>,
}

/// Parameters of a sponsored call to a deployed application.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCallParams {
    pub app_id: u64,
    /// Numeric on-completion action, `0` (NoOp) when omitted.
    #[serde(default)]
    pub on_complete: OnApplicationComplete,
    #[serde(default)]
    pub args: Vec<AppArg>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    #[serde(default)]
    pub accounts: Vec<Address>,
    #[serde(default)]
    pub foreign_apps: Vec<u64>,
    #[serde(default)]
    pub foreign_assets: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn default_total() -> u64 {
    1
}

/// Parameters of a sponsored asset creation. Unset credentials default to the user.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCreateParams {
    #[serde(default = "default_total")]
    pub total: u64,
    #[serde(default)]
    pub decimals: u32,
    #[serde(default)]
    pub default_frozen: bool,
    #[serde(default)]
    pub unit_name: String,
    #[serde(default)]
    pub asset_name: String,
    #[serde(default)]
    pub url: String,
    #[serde_as(as = "Option<serde_with::base64::Base64>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_hash: Option<Byte32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<Address>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<Address>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze: Option<Address>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clawback: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// What the user wants done. In JSON: `{"action": "payment", "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "camelCase")]
pub enum Action {
    Payment(PaymentParams),
    AppCall(AppCallParams),
    AssetCreate(AssetCreateParams),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Payment(_) => "payment",
            Action::AppCall(_) => "appCall",
            Action::AssetCreate(_) => "assetCreate",
        }
    }

    fn note(&self) -> Option<Vec<u8>> {
        let note = match self {
            Action::Payment(p) => &p.note,
            Action::AppCall(a) => &a.note,
            Action::AssetCreate(a) => &a.note,
        };
        note.as_ref()
            .filter(|n| !n.is_empty())
            .map(|n| n.as_bytes().to_vec())
    }

    /// Builds the user transaction with a zero fee.
    fn to_transaction(
        &self,
        header: TransactionHeader,
        user: &Address,
    ) -> Result<Transaction, SponsorError> {
        match self {
            Action::Payment(params) => {
                if params.close_remainder_to.is_some() {
                    return Err(SponsorError::validation(
                        "closeRemainderTo is not allowed in sponsored payments",
                    ));
                }
                PaymentTransactionBuilder::default()
                    .header(header)
                    .receiver(params.receiver.clone())
                    .amount(params.amount)
                    .build()
                    .map_err(|e| SponsorError::validation(e.to_string()))
            }
            Action::AppCall(params) => {
                let mut builder = ApplicationCallTransactionBuilder::default();
                builder
                    .header(header)
                    .app_id(params.app_id)
                    .on_complete(params.on_complete);
                if !params.args.is_empty() {
                    builder.args(params.args.iter().map(AppArg::to_bytes).collect());
                }
                if !params.accounts.is_empty() {
                    builder.account_references(params.accounts.clone());
                }
                if !params.foreign_apps.is_empty() {
                    builder.app_references(params.foreign_apps.clone());
                }
                if !params.foreign_assets.is_empty() {
                    builder.asset_references(params.foreign_assets.clone());
                }
                builder
                    .build()
                    .map_err(|e| SponsorError::validation(e.to_string()))
            }
            Action::AssetCreate(params) => {
                let credential = |value: &Option<Address>| value.clone().unwrap_or_else(|| user.clone());
                let mut builder = AssetConfigTransactionBuilder::default();
                builder
                    .header(header)
                    .total(params.total)
                    .manager(credential(&params.manager))
                    .reserve(credential(&params.reserve))
                    .freeze(credential(&params.freeze))
                    .clawback(credential(&params.clawback));
                // Zero and empty values are left unset so the transaction equals its decoded form
                if params.decimals > 0 {
                    builder.decimals(params.decimals);
                }
                if params.default_frozen {
                    builder.default_frozen(true);
                }
                if !params.unit_name.is_empty() {
                    builder.unit_name(params.unit_name.clone());
                }
                if !params.asset_name.is_empty() {
                    builder.asset_name(params.asset_name.clone());
                }
                if !params.url.is_empty() {
                    builder.url(params.url.clone());
                }
                if let Some(metadata_hash) = params.metadata_hash {
                    builder.metadata_hash(metadata_hash);
                }
                builder
                    .build()
                    .map_err(|e| SponsorError::validation(e.to_string()))
            }
        }
    }
}

/// Both unsigned halves of a sponsored group, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct SponsoredGroup {
    pub sponsor_txn: Transaction,
    pub user_txn: Transaction,
    pub group_id: Byte32,
    /// The minimum fee the group was built against.
    pub min_fee: u64,
}

impl SponsoredGroup {
    pub fn sponsor_fee(&self) -> u64 {
        self.sponsor_txn.fee()
    }
}

#[derive(Clone)]
pub struct GroupBuilder {
    algod: AlgodClient,
    validity_window: u64,
}

impl GroupBuilder {
    pub fn new(algod: AlgodClient, validity_window: u64) -> Self {
        GroupBuilder {
            algod,
            validity_window,
        }
    }

    /// Builds `[sponsor, user]` for `action` against freshly fetched network parameters.
    pub async fn build_sponsored_group(
        &self,
        action: &Action,
        user: &Address,
        sponsor: &Address,
    ) -> Result<SponsoredGroup, SponsorError> {
        if user == sponsor {
            return Err(SponsorError::validation(
                "the sponsor cannot sponsor its own transactions",
            ));
        }
        if user.is_zero() {
            return Err(SponsorError::validation("user address is required"));
        }

        let params = self.algod.transaction_params().await?;
        self.assemble(action, user, sponsor, &params)
    }

    fn assemble(
        &self,
        action: &Action,
        user: &Address,
        sponsor: &Address,
        params: &TransactionParams,
    ) -> Result<SponsoredGroup, SponsorError> {
        let fee = sponsor_fee(params.min_fee)?;

        let mut user_header = self.header(params, user, 0)?;
        if let Some(note) = action.note() {
            user_header.note = Some(note);
        }
        let user_txn = action.to_transaction(user_header, user)?;

        let sponsor_txn = PaymentTransactionBuilder::default()
            .header(self.header(params, sponsor, fee)?)
            .receiver(sponsor.clone())
            .amount(0)
            .build()
            .map_err(|e| SponsorError::validation(e.to_string()))?;

        let ungrouped = [sponsor_txn, user_txn];
        let group_id = compute_group(&ungrouped).map_err(|e| SponsorError::validation(e.to_string()))?;
        let grouped = ungrouped
            .as_slice()
            .assign_group()
            .map_err(|e| SponsorError::validation(e.to_string()))?;
        let [sponsor_txn, user_txn]: [Transaction; 2] = grouped
            .try_into()
            .map_err(|_| SponsorError::validation("grouping changed the group size"))?;

        debug!(
            "Built {} group {} for {} sponsored by {} (fee {})",
            action.name(),
            BASE64_STANDARD.encode(group_id),
            user,
            sponsor,
            fee
        );

        Ok(SponsoredGroup {
            sponsor_txn,
            user_txn,
            group_id,
            min_fee: params.min_fee,
        })
    }

    fn header(
        &self,
        params: &TransactionParams,
        sender: &Address,
        fee: u64,
    ) -> Result<TransactionHeader, SponsorError> {
        let first_valid = params.last_round;
        let last_valid = first_valid
            .checked_add(self.validity_window)
            .ok_or_else(|| SponsorError::validation("validity window overflows the round number"))?;

        let mut header = TransactionHeaderBuilder::default()
            .sender(sender.clone())
            .first_valid(first_valid)
            .last_valid(last_valid)
            .genesis_id(params.genesis_id.clone())
            .genesis_hash(params.genesis_hash_bytes()?)
            .build()
            .map_err(|e| SponsorError::validation(e.to_string()))?;
        header.fee = (fee > 0).then_some(fee);
        Ok(header)
    }
}
