//! Error types for the transaction codec.
//!
//! Covers msgpack encoding and decoding failures, malformed addresses and mnemonics,
//! and invalid input to grouping and validation.

use snafu::Snafu;

/// Represents errors that can occur while building, encoding or decoding Algorand transactions.
#[derive(Debug, Snafu)]
pub enum TransactError {
    #[snafu(display("Error ocurred during encoding: {source}"))]
    EncodingError { source: rmp_serde::encode::Error },

    #[snafu(display("Error ocurred during decoding: {source}"))]
    DecodingError { source: rmp_serde::decode::Error },

    #[snafu(display("Error ocurred during msgpack encoding: {source}"))]
    MsgpackEncodingError { source: rmpv::encode::Error },

    #[snafu(display("Error ocurred during msgpack decoding: {source}"))]
    MsgpackDecodingError { source: rmpv::decode::Error },

    #[snafu(display("Unknown transaction type: {message}"))]
    UnknownTransactionType { message: String },

    #[snafu(display("{message}"))]
    InputError { message: String },

    #[snafu(display("{message}"))]
    InvalidAddress { message: String },

    #[snafu(display("Invalid mnemonic: {message}"))]
    InvalidMnemonic { message: String },
}

impl From<rmp_serde::encode::Error> for TransactError {
    fn from(source: rmp_serde::encode::Error) -> Self {
        TransactError::EncodingError { source }
    }
}

impl From<rmp_serde::decode::Error> for TransactError {
    fn from(source: rmp_serde::decode::Error) -> Self {
        TransactError::DecodingError { source }
    }
}

impl From<rmpv::encode::Error> for TransactError {
    fn from(source: rmpv::encode::Error) -> Self {
        TransactError::MsgpackEncodingError { source }
    }
}

impl From<rmpv::decode::Error> for TransactError {
    fn from(source: rmpv::decode::Error) -> Self {
        TransactError::MsgpackDecodingError { source }
    }
}
