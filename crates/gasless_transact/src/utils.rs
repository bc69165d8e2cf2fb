use crate::constants::{
    ALGORAND_CHECKSUM_BYTE_LENGTH, ALGORAND_PUBLIC_KEY_BYTE_LENGTH, Byte32,
    GROUP_DOMAIN_SEPARATOR, HASH_BYTES_LENGTH, MAX_TX_GROUP_SIZE,
};
use crate::{Address, AlgorandMsgpack, Transaction, TransactError, TransactionId};
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as};
use sha2::{Digest, Sha512_256};
use std::collections::BTreeMap;

pub fn sort_msgpack_value(value: rmpv::Value) -> rmpv::Value {
    match value {
        rmpv::Value::Map(m) => {
            let mut sorted_map: BTreeMap<String, rmpv::Value> = BTreeMap::new();

            for (k, v) in m {
                if let rmpv::Value::String(key) = k {
                    let key_str = key.into_str().unwrap_or_default();
                    sorted_map.insert(key_str, sort_msgpack_value(v));
                }
            }

            rmpv::Value::Map(
                sorted_map
                    .into_iter()
                    .map(|(k, v)| (rmpv::Value::String(k.into()), v))
                    .collect(),
            )
        }
        rmpv::Value::Array(arr) => {
            rmpv::Value::Array(arr.into_iter().map(sort_msgpack_value).collect())
        }
        v => v,
    }
}

pub fn is_zero<T>(n: &T) -> bool
where
    T: PartialEq + From<u8>,
{
    *n == T::from(0u8)
}

pub fn is_zero_opt<T>(n: &Option<T>) -> bool
where
    T: PartialEq + From<u8>,
{
    n.as_ref().is_none_or(is_zero)
}

pub fn is_zero_addr(addr: &Address) -> bool {
    addr.as_bytes() == &[0u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH]
}

pub fn is_zero_addr_opt(addr: &Option<Address>) -> bool {
    addr.as_ref().is_none_or(is_zero_addr)
}

pub fn is_empty_bytes32(bytes: &Byte32) -> bool {
    bytes == &[0u8; 32]
}

pub fn is_empty_bytes32_opt(bytes: &Option<Byte32>) -> bool {
    bytes.as_ref().is_none_or(is_empty_bytes32)
}

pub fn is_empty_string_opt(string: &Option<String>) -> bool {
    string.as_ref().is_none_or(String::is_empty)
}

pub fn is_empty_vec_opt<T>(vec: &Option<Vec<T>>) -> bool {
    vec.as_ref().is_none_or(Vec::is_empty)
}

pub fn is_false_opt(bool: &Option<bool>) -> bool {
    bool.as_ref().is_none_or(|b| !b)
}

pub fn pub_key_to_checksum(pub_key: &Byte32) -> [u8; ALGORAND_CHECKSUM_BYTE_LENGTH] {
    let digest = Sha512_256::digest(pub_key);

    let mut checksum = [0u8; ALGORAND_CHECKSUM_BYTE_LENGTH];
    checksum.copy_from_slice(&digest[(HASH_BYTES_LENGTH - ALGORAND_CHECKSUM_BYTE_LENGTH)..]);
    checksum
}

/// SHA-512/256 of the given bytes.
pub fn hash(bytes: &[u8]) -> Byte32 {
    let mut hash_bytes = [0u8; HASH_BYTES_LENGTH];
    hash_bytes.copy_from_slice(&Sha512_256::digest(bytes)[..HASH_BYTES_LENGTH]);
    hash_bytes
}

/// Computes the group ID of an ordered list of ungrouped transactions.
///
/// The result depends on the order of `txs`: the same transactions in a different order
/// produce a different group ID.
pub fn compute_group(txs: &[Transaction]) -> Result<Byte32, TransactError> {
    if txs.is_empty() {
        return Err(TransactError::InputError {
            message: String::from("Transaction group size cannot be 0"),
        });
    }

    if txs.len() > MAX_TX_GROUP_SIZE {
        return Err(TransactError::InputError {
            message: format!(
                "Transaction group size exceeds the max limit of {}",
                MAX_TX_GROUP_SIZE
            ),
        });
    }

    let tx_hashes = txs
        .iter()
        .map(|tx| {
            if tx.header().group.is_some() {
                return Err(TransactError::InputError {
                    message: "Transactions must not already be grouped".to_string(),
                });
            }
            tx.id_raw()
        })
        .collect::<Result<Vec<Byte32>, TransactError>>()?;

    let grouped = GroupedTransactions { tx_hashes }.encode()?;
    Ok(hash(&grouped))
}

// Only used internally for generating the group id
#[serde_as]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct GroupedTransactions {
    #[serde(rename = "txlist")]
    #[serde_as(as = "Vec<Bytes>")]
    pub tx_hashes: Vec<Byte32>,
}

impl AlgorandMsgpack for GroupedTransactions {
    const PREFIX: &'static [u8] = GROUP_DOMAIN_SEPARATOR;
}
