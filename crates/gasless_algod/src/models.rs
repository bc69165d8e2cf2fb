use crate::AlgodError;
use base64::{Engine, prelude::BASE64_STANDARD};
use gasless_transact::Byte32;
use serde::{Deserialize, Serialize};

/// Suggested parameters for a new transaction, as returned by `/v2/transactions/params`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TransactionParams {
    pub consensus_version: String,
    pub fee: u64,
    pub genesis_hash: String,
    pub genesis_id: String,
    pub last_round: u64,
    pub min_fee: u64,
}

impl TransactionParams {
    pub fn genesis_hash_bytes(&self) -> Result<Byte32, AlgodError> {
        BASE64_STANDARD
            .decode(&self.genesis_hash)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| AlgodError::InvalidResponse {
                message: format!("genesis hash '{}' is not 32 base64 bytes", self.genesis_hash),
            })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawTransactionResponse {
    #[serde(rename = "txId")]
    pub tx_id: String,
}

/// The subset of `/v2/transactions/pending/{txid}` needed to track confirmation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct PendingTransactionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_round: Option<u64>,

    /// Non-empty when the node evicted the transaction from its pool.
    #[serde(default)]
    pub pool_error: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    pub last_round: u64,
}

/// The balance fields of `/v2/accounts/{address}`, in microALGO.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct AccountInformation {
    pub address: String,
    pub amount: u64,
    pub min_balance: u64,
}
