mod address;
pub mod constants;
mod error;
mod keypair_account;
pub mod mnemonic;
mod traits;
mod transactions;
mod utils;

// Re-export all the public items
pub use address::Address;
pub use constants::*;
pub use error::TransactError;
pub use keypair_account::KeyPairAccount;
pub use traits::{AlgorandMsgpack, TransactionId, Transactions, Validate};
pub use transactions::{
    ApplicationCallTransactionBuilder, ApplicationCallTransactionFields,
    AssetConfigTransactionBuilder, AssetConfigTransactionFields, OnApplicationComplete,
    PaymentTransactionBuilder, PaymentTransactionFields, SignedTransaction, Transaction,
    TransactionHeader, TransactionHeaderBuilder, TransactionValidationError,
    decode_signed_group,
};
pub use utils::{compute_group, hash};

#[cfg(test)]
mod tests;

#[cfg(feature = "test_utils")]
pub mod test_utils;
