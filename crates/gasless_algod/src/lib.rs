mod client;
mod config;
mod error;
mod models;

pub use client::AlgodClient;
pub use config::{AlgoClientConfig, LOCALNET_TOKEN};
pub use error::AlgodError;
pub use models::{
    AccountInformation, NodeStatus, PendingTransactionResponse, RawTransactionResponse,
    TransactionParams,
};

#[cfg(test)]
mod tests;
