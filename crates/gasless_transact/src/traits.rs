//! Core traits shared by every msgpack-encodable Algorand structure.

use crate::constants::HASH_BYTES_LENGTH;
use crate::error::TransactError;
use crate::utils::{hash, sort_msgpack_value};
use crate::Transaction;
use serde::{Deserialize, Serialize};

/// Canonical msgpack encoding with an optional domain separation prefix.
///
/// Maps are emitted with their keys sorted and with empty or zero values omitted, which is the
/// only encoding the network accepts for hashing and signature verification.
pub trait AlgorandMsgpack: Serialize + for<'de> Deserialize<'de> {
    const PREFIX: &'static [u8] = b"";

    /// Decodes msgpack bytes, tolerating a leading domain prefix.
    fn decode(bytes: &[u8]) -> Result<Self, TransactError> {
        if bytes.is_empty() {
            return Err(TransactError::InputError {
                message: "attempted to decode 0 bytes".to_string(),
            });
        }

        let bytes = bytes.strip_prefix(Self::PREFIX).unwrap_or(bytes);

        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Encodes with the domain prefix, producing the bytes that are hashed and signed.
    fn encode(&self) -> Result<Vec<u8>, TransactError> {
        let raw = self.encode_raw()?;
        let mut buf = Vec::with_capacity(Self::PREFIX.len() + raw.len());
        buf.extend_from_slice(Self::PREFIX);
        buf.extend_from_slice(&raw);
        Ok(buf)
    }

    /// Encodes without the domain prefix, producing the bytes that travel on the wire.
    fn encode_raw(&self) -> Result<Vec<u8>, TransactError> {
        let mut temp_buf = Vec::new();
        let mut serializer = rmp_serde::Serializer::new(&mut temp_buf).with_struct_map();
        self.serialize(&mut serializer)?;

        let value: rmpv::Value = rmpv::decode::read_value(&mut temp_buf.as_slice())?;
        let mut final_buf = Vec::new();
        rmpv::encode::write_value(&mut final_buf, &sort_msgpack_value(value))?;
        Ok(final_buf)
    }
}

pub trait TransactionId: AlgorandMsgpack {
    /// Generates the raw transaction ID as a hash of the prefixed encoding.
    fn id_raw(&self) -> Result<[u8; HASH_BYTES_LENGTH], TransactError> {
        let encoded_tx = self.encode()?;
        Ok(hash(&encoded_tx))
    }

    /// Generates the transaction ID as a base32 string without padding.
    fn id(&self) -> Result<String, TransactError> {
        Ok(base32::encode(
            base32::Alphabet::Rfc4648 { padding: false },
            &self.id_raw()?,
        ))
    }
}

pub trait Transactions {
    fn assign_group(self) -> Result<Vec<Transaction>, TransactError>;
}

pub trait Validate {
    fn validate(&self) -> Result<(), Vec<String>>;
}
