//! Algorand addresses are base32-encoded strings that represent 32 bytes plus a checksum.
//!
//! An address is a 58-character base32 string encoding a 32-byte public key followed by
//! a 4-byte checksum. Both the sponsor and the user of a sponsored group are identified
//! by an [`Address`].

use crate::constants::Byte32;
use crate::error::TransactError;
use crate::utils::pub_key_to_checksum;
use crate::{
    ALGORAND_ADDRESS_LENGTH, ALGORAND_CHECKSUM_BYTE_LENGTH, ALGORAND_PUBLIC_KEY_BYTE_LENGTH,
};
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Represents an Algorand address as decoded bytes without the checksum.
///
/// On the wire (msgpack) an address is the raw 32 bytes; for humans it is the base32 string
/// produced by [`Address::as_str`].
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Address(#[serde_as(as = "Bytes")] pub Byte32);

impl Address {
    /// Returns the 32 bytes of the address as a byte array reference.
    pub fn as_bytes(&self) -> &Byte32 {
        &self.0
    }

    /// Returns the base32-encoded string representation of the address, including the checksum.
    pub fn as_str(&self) -> String {
        let mut buffer = [0u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH + ALGORAND_CHECKSUM_BYTE_LENGTH];
        buffer[..ALGORAND_PUBLIC_KEY_BYTE_LENGTH].copy_from_slice(&self.0);
        buffer[ALGORAND_PUBLIC_KEY_BYTE_LENGTH..].copy_from_slice(&self.checksum());

        base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &buffer)
    }

    /// Computes the 4-byte checksum for the address.
    pub fn checksum(&self) -> [u8; ALGORAND_CHECKSUM_BYTE_LENGTH] {
        pub_key_to_checksum(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH]
    }
}

impl FromStr for Address {
    type Err = TransactError;

    /// Parses a 58-character base32 Algorand address string into an [`Address`].
    ///
    /// Returns an error if the string is not exactly 58 characters, is not valid base32,
    /// or if the checksum does not match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ALGORAND_ADDRESS_LENGTH {
            return Err(TransactError::InvalidAddress {
                message: "Algorand address must be exactly 58 characters".into(),
            });
        }
        let decoded_address = base32::decode(base32::Alphabet::Rfc4648 { padding: false }, s)
            .ok_or_else(|| TransactError::InvalidAddress {
                message: "Invalid base32 encoding for Algorand address".into(),
            })?;

        let pub_key: Byte32 = decoded_address
            .get(..ALGORAND_PUBLIC_KEY_BYTE_LENGTH)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| TransactError::InvalidAddress {
                message: "Could not decode address into 32-byte public key".into(),
            })?;
        let checksum: [u8; ALGORAND_CHECKSUM_BYTE_LENGTH] = decoded_address
            .get(ALGORAND_PUBLIC_KEY_BYTE_LENGTH..)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| TransactError::InvalidAddress {
                message: "Could not get 4-byte checksum from decoded address".into(),
            })?;

        if pub_key_to_checksum(&pub_key) != checksum {
            return Err(TransactError::InvalidAddress {
                message: "Checksum is invalid".into(),
            });
        }
        Ok(Address(pub_key))
    }
}

impl Display for Address {
    /// Formats the address as a base32-encoded string.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_zero_address_round_trip() {
        let zero = Address::default();
        assert!(zero.is_zero());
        assert_eq!(
            zero.to_string(),
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ"
        );
        assert_eq!(zero, zero.to_string().parse().unwrap());
    }

    #[rstest]
    #[case::too_short("RIMARGKZU46OZ77OLPDHHPUJ7YBSHRTCYMQUC64KZCCMESQAFQMYU6SL2", "exactly 58 characters")]
    #[case::bad_checksum("RIMARGKZU46OZ77OLPDHHPUJ7YBSHRTCYMQUC64KZCCMESQAFQMYU6SL2A", "Checksum is invalid")]
    #[case::not_base32("RIMARGKZU46OZ77OLPDHHPUJ7YBSHRTCYMQUC64KZCCMESQAFQMYU6SL2!", "Invalid base32")]
    fn test_invalid_addresses(#[case] input: &str, #[case] expected: &str) {
        let err = input.parse::<Address>().unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "unexpected error message: {err}"
        );
    }
}
