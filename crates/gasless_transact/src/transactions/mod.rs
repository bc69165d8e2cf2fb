//! Transaction types that can appear in a sponsored group, along with signed transactions
//! and atomic grouping.

mod application_call;
mod asset_config;
mod common;
mod payment;

pub use application_call::{
    ApplicationCallTransactionBuilder, ApplicationCallTransactionFields, OnApplicationComplete,
};
pub use asset_config::{
    AssetConfigTransactionBuilder, AssetConfigTransactionFields, asset_config_deserializer,
    asset_config_serializer,
};
pub use common::{TransactionHeader, TransactionHeaderBuilder, TransactionValidationError};
pub use payment::{PaymentTransactionBuilder, PaymentTransactionFields};

use crate::Address;
use crate::constants::{
    ALGORAND_SIGNATURE_BYTE_LENGTH, HASH_BYTES_LENGTH, TRANSACTION_DOMAIN_SEPARATOR,
};
use crate::error::TransactError;
use crate::traits::{AlgorandMsgpack, TransactionId, Transactions};
use crate::utils::{compute_group, is_zero_addr_opt};
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as};

/// Enumeration of the transaction types a sponsored group is built from.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(tag = "type")]
pub enum Transaction {
    #[serde(rename = "pay")]
    Payment(PaymentTransactionFields),

    #[serde(serialize_with = "asset_config_serializer")]
    #[serde(deserialize_with = "asset_config_deserializer")]
    #[serde(rename = "acfg")]
    AssetConfig(AssetConfigTransactionFields),

    #[serde(rename = "appl")]
    ApplicationCall(ApplicationCallTransactionFields),
}

impl Transaction {
    pub fn header(&self) -> &TransactionHeader {
        match self {
            Transaction::Payment(p) => &p.header,
            Transaction::AssetConfig(a) => &a.header,
            Transaction::ApplicationCall(a) => &a.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut TransactionHeader {
        match self {
            Transaction::Payment(p) => &mut p.header,
            Transaction::AssetConfig(a) => &mut a.header,
            Transaction::ApplicationCall(a) => &mut a.header,
        }
    }

    pub fn sender(&self) -> &Address {
        &self.header().sender
    }

    /// The flat fee carried by the transaction, 0 when absent.
    pub fn fee(&self) -> u64 {
        self.header().fee.unwrap_or_default()
    }

    /// Returns a copy with the group ID removed.
    pub fn ungrouped(&self) -> Transaction {
        let mut tx = self.clone();
        tx.header_mut().group = None;
        tx
    }
}

impl AlgorandMsgpack for Transaction {
    const PREFIX: &'static [u8] = TRANSACTION_DOMAIN_SEPARATOR;
}

impl TransactionId for Transaction {}

/// A signed transaction.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct SignedTransaction {
    /// The transaction that has been signed.
    #[serde(rename = "txn")]
    pub transaction: Transaction,

    /// Optional Ed25519 signature authorizing the transaction.
    #[serde(rename = "sig")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub signature: Option<[u8; ALGORAND_SIGNATURE_BYTE_LENGTH]>,

    /// Optional auth address applicable if the transaction sender is a rekeyed account.
    #[serde(rename = "sgnr")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub auth_address: Option<Address>,
}

impl SignedTransaction {
    /// The address whose key must have produced `signature`.
    pub fn signer(&self) -> &Address {
        self.auth_address
            .as_ref()
            .unwrap_or(&self.transaction.header().sender)
    }

    fn from_msgpack_value(value: rmpv::Value) -> Result<Self, TransactError> {
        let rmpv::Value::Map(map) = value else {
            return Err(TransactError::InputError {
                message: "expected signed transaction to be a map".to_string(),
            });
        };

        let mut transaction = None;
        let mut signature = None;
        let mut auth_address = None;

        for (key, value) in map {
            match key.as_str() {
                Some("txn") => {
                    // The transaction type is only known once the inner map is decoded on its own.
                    let mut txn_buf = Vec::new();
                    rmpv::encode::write_value(&mut txn_buf, &value)?;
                    transaction = Some(Transaction::decode(&txn_buf)?);
                }
                Some("sig") => {
                    let bytes: [u8; ALGORAND_SIGNATURE_BYTE_LENGTH] = value
                        .as_slice()
                        .and_then(|bytes| bytes.try_into().ok())
                        .ok_or_else(|| TransactError::InputError {
                            message: "signature must be 64 bytes".to_string(),
                        })?;
                    signature = Some(bytes);
                }
                Some("sgnr") => {
                    let bytes: [u8; HASH_BYTES_LENGTH] = value
                        .as_slice()
                        .and_then(|bytes| bytes.try_into().ok())
                        .ok_or_else(|| TransactError::InvalidAddress {
                            message: "auth address must be 32 bytes".to_string(),
                        })?;
                    auth_address = Some(Address(bytes));
                }
                Some(other) => {
                    return Err(TransactError::InputError {
                        message: format!("unsupported signed transaction field '{other}'"),
                    });
                }
                None => {
                    return Err(TransactError::InputError {
                        message: "signed transaction keys must be strings".to_string(),
                    });
                }
            }
        }

        let transaction = transaction.ok_or_else(|| TransactError::InputError {
            message: "signed transaction is missing the 'txn' field".to_string(),
        })?;

        Ok(SignedTransaction {
            transaction,
            signature,
            auth_address,
        })
    }
}

impl AlgorandMsgpack for SignedTransaction {
    /// Decodes msgpack bytes into a [`SignedTransaction`].
    ///
    /// Only single-signature authorization (`sig`, optionally with `sgnr`) is accepted.
    fn decode(bytes: &[u8]) -> Result<Self, TransactError> {
        let mut reader = bytes;
        let value = rmpv::decode::read_value(&mut reader)?;
        if !reader.is_empty() {
            return Err(TransactError::InputError {
                message: format!(
                    "{} trailing bytes after signed transaction",
                    reader.len()
                ),
            });
        }
        Self::from_msgpack_value(value)
    }
}

impl TransactionId for SignedTransaction {
    /// The ID of a signed transaction is the ID of the transaction it wraps.
    fn id_raw(&self) -> Result<[u8; HASH_BYTES_LENGTH], TransactError> {
        self.transaction.id_raw()
    }
}

/// Splits the concatenated encoding of a signed group, as it is posted to the network,
/// into its signed transactions in order.
pub fn decode_signed_group(bytes: &[u8]) -> Result<Vec<SignedTransaction>, TransactError> {
    let mut reader = bytes;
    let mut group = Vec::new();
    while !reader.is_empty() {
        let value = rmpv::decode::read_value(&mut reader)?;
        group.push(SignedTransaction::from_msgpack_value(value)?);
    }
    if group.is_empty() {
        return Err(TransactError::InputError {
            message: "attempted to decode an empty group".to_string(),
        });
    }
    Ok(group)
}

impl Transactions for &[Transaction] {
    /// Groups the supplied transactions by calculating and assigning the group to each transaction.
    fn assign_group(self) -> Result<Vec<Transaction>, TransactError> {
        let group_id = compute_group(self)?;
        Ok(self
            .iter()
            .map(|tx| {
                let mut tx = tx.clone();
                tx.header_mut().group = Some(group_id);
                tx
            })
            .collect())
    }
}
