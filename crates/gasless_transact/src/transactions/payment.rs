//! Payment transactions move microALGO between accounts.
//!
//! Both halves of a sponsored payment group are payments: the user's transfer and the
//! sponsor's zero-amount self-payment that carries the pooled fee.

use crate::transactions::common::TransactionHeader;
use crate::utils::{is_zero, is_zero_addr, is_zero_addr_opt};
use crate::{Address, Transaction};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none};

/// Represents a payment transaction that transfers ALGO between accounts.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Builder)]
#[builder(
    name = "PaymentTransactionBuilder",
    setter(strip_option),
    build_fn(name = "build_fields")
)]
pub struct PaymentTransactionFields {
    /// Common transaction header fields.
    #[serde(flatten)]
    pub header: TransactionHeader,

    /// The address of the account receiving the ALGO payment.
    #[serde(rename = "rcv")]
    #[serde(skip_serializing_if = "is_zero_addr")]
    #[serde(default)]
    pub receiver: Address,

    /// The amount of microALGO to send.
    #[serde(rename = "amt")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub amount: u64,

    /// Optional address to send all remaining funds to, closing the sender account.
    #[serde(rename = "close")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    #[builder(default)]
    pub close_remainder_to: Option<Address>,
}

impl PaymentTransactionBuilder {
    pub fn build(&self) -> Result<Transaction, PaymentTransactionBuilderError> {
        self.build_fields().map(Transaction::Payment)
    }
}

impl PaymentTransactionFields {
    /// True when this payment only exists to carry a pooled fee: it pays nothing to anyone
    /// but its own sender and can neither close nor rekey the sender account.
    pub fn is_fee_carrier(&self) -> bool {
        self.receiver == self.header.sender
            && self.amount == 0
            && is_zero_addr_opt(&self.close_remainder_to)
            && is_zero_addr_opt(&self.header.rekey_to)
    }
}
