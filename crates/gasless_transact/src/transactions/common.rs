//! Header fields shared by every transaction type, and the validation errors raised
//! against transaction fields.

use crate::Address;
use crate::constants::Byte32;
use crate::utils::{
    is_empty_bytes32_opt, is_empty_string_opt, is_empty_vec_opt, is_zero, is_zero_addr,
    is_zero_addr_opt, is_zero_opt,
};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as, skip_serializing_none};
use snafu::Snafu;

/// The fields common to all Algorand transactions.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Builder)]
#[builder(setter(strip_option))]
pub struct TransactionHeader {
    /// The account that authorises and pays for the transaction unless it is fee pooled.
    #[serde(rename = "snd")]
    #[serde(skip_serializing_if = "is_zero_addr")]
    #[serde(default)]
    pub sender: Address,

    /// Flat fee in microALGO. A sponsored user transaction carries `None` or `0`.
    #[serde(rename = "fee")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    #[builder(default)]
    pub fee: Option<u64>,

    /// First round in which the transaction may be confirmed.
    #[serde(rename = "fv")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub first_valid: u64,

    /// Last round in which the transaction may be confirmed.
    #[serde(rename = "lv")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub last_valid: u64,

    /// Hash of the genesis block of the network the transaction is bound to.
    #[serde(rename = "gh")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_bytes32_opt")]
    #[serde(default)]
    #[builder(default)]
    pub genesis_hash: Option<Byte32>,

    /// Human readable genesis identifier, e.g. `testnet-v1.0`.
    #[serde(rename = "gen")]
    #[serde(skip_serializing_if = "is_empty_string_opt")]
    #[serde(default)]
    #[builder(default)]
    pub genesis_id: Option<String>,

    #[serde(rename = "note")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub note: Option<Vec<u8>>,

    /// Rekeys the sender to this address once confirmed.
    #[serde(rename = "rekey")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    #[builder(default)]
    pub rekey_to: Option<Address>,

    #[serde(rename = "lx")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_bytes32_opt")]
    #[serde(default)]
    #[builder(default)]
    pub lease: Option<Byte32>,

    /// Group ID binding this transaction to the other members of its atomic group.
    #[serde(rename = "grp")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_bytes32_opt")]
    #[serde(default)]
    #[builder(default)]
    pub group: Option<Byte32>,
}

#[derive(Debug, Snafu, PartialEq, Clone)]
pub enum TransactionValidationError {
    #[snafu(display("{field} is required"))]
    RequiredField { field: String },

    #[snafu(display("{field} cannot exceed {max} {unit}, got {actual}"))]
    FieldTooLong {
        field: String,
        actual: usize,
        max: usize,
        unit: String,
    },

    #[snafu(display("{field} cannot contain more than {max} entries, got {actual}"))]
    TooManyEntries {
        field: String,
        actual: usize,
        max: usize,
    },
}
