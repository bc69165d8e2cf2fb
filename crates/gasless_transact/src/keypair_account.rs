//! Algorand ed25519 keypair account representation.
//!
//! A [`KeyPairAccount`] wraps the 32-byte ed25519 public key of an account. Its [`Address`]
//! is the same 32 bytes encoded with a checksum, and the public key is what a signature on a
//! transaction sent from that address is verified against.

use crate::address::Address;
use crate::constants::Byte32;
use crate::error::TransactError;
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Represents an ed25519 keypair Algorand account.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(transparent)]
pub struct KeyPairAccount {
    /// The 32-byte Ed25519 public key associated with this account.
    #[serde_as(as = "Bytes")]
    pub pub_key: Byte32,
}

impl KeyPairAccount {
    /// Creates a new [`KeyPairAccount`] from a 32-byte public key.
    pub fn from_pubkey(pub_key: &Byte32) -> Self {
        KeyPairAccount { pub_key: *pub_key }
    }

    /// Returns the [`Address`] corresponding to this account's public key.
    pub fn address(&self) -> Address {
        Address(self.pub_key)
    }
}

impl From<Address> for KeyPairAccount {
    fn from(addr: Address) -> Self {
        KeyPairAccount::from_pubkey(addr.as_bytes())
    }
}

impl From<KeyPairAccount> for Address {
    fn from(account: KeyPairAccount) -> Address {
        Address(account.pub_key)
    }
}

impl FromStr for KeyPairAccount {
    type Err = TransactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Address>().map(Into::into)
    }
}

impl Display for KeyPairAccount {
    /// Formats the [`KeyPairAccount`] as a base32-encoded Algorand address string.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.address().as_str())
    }
}
