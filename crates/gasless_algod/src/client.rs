//! A typed client over the handful of algod endpoints a fee-sponsoring relay needs.

use crate::error::AlgodError;
use crate::models::{
    AccountInformation, NodeStatus, PendingTransactionResponse, RawTransactionResponse,
    TransactionParams,
};
use gasless_http_client::{HttpClient, HttpMethod};
use gasless_transact::Address;
use log::debug;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "default_http_client")]
use crate::config::AlgoClientConfig;
#[cfg(feature = "default_http_client")]
use gasless_http_client::DefaultHttpClient;

#[derive(Clone)]
pub struct AlgodClient {
    http_client: Arc<dyn HttpClient>,
}

impl AlgodClient {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        AlgodClient { http_client }
    }

    #[cfg(feature = "default_http_client")]
    pub fn from_config(
        config: &AlgoClientConfig,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, AlgodError> {
        let base_url = config.base_url();
        let http_client = match &config.token {
            Some(token) => {
                DefaultHttpClient::with_header(&base_url, "X-Algo-API-Token", token, timeout)?
            }
            None => DefaultHttpClient::with_timeout(&base_url, timeout)?,
        };
        Ok(AlgodClient::new(Arc::new(http_client)))
    }

    /// Fetches suggested transaction parameters. Never cached: every caller gets the node's
    /// current view of the minimum fee and last round.
    pub async fn transaction_params(&self) -> Result<TransactionParams, AlgodError> {
        self.get_json("/v2/transactions/params".to_string(), None)
            .await
    }

    /// Broadcasts one or more concatenated signed transactions as a single submission.
    pub async fn raw_transaction(&self, signed: Vec<u8>) -> Result<RawTransactionResponse, AlgodError> {
        let headers = HashMap::from([(
            "Content-Type".to_string(),
            "application/x-binary".to_string(),
        )]);
        let response = self
            .http_client
            .request(
                HttpMethod::Post,
                "/v2/transactions".to_string(),
                None,
                Some(signed),
                Some(headers),
            )
            .await?;
        parse_json(&response.body)
    }

    pub async fn pending_transaction_information(
        &self,
        tx_id: &str,
    ) -> Result<PendingTransactionResponse, AlgodError> {
        self.get_json(format!("/v2/transactions/pending/{}", tx_id), None)
            .await
    }

    pub async fn status(&self) -> Result<NodeStatus, AlgodError> {
        self.get_json("/v2/status".to_string(), None).await
    }

    /// Blocks until the node has seen a block after `round`.
    pub async fn wait_for_block(&self, round: u64) -> Result<NodeStatus, AlgodError> {
        self.get_json(format!("/v2/status/wait-for-block-after/{}", round), None)
            .await
    }

    pub async fn account_information(
        &self,
        address: &Address,
    ) -> Result<AccountInformation, AlgodError> {
        let query = HashMap::from([("exclude".to_string(), "all".to_string())]);
        self.get_json(format!("/v2/accounts/{}", address), Some(query))
            .await
    }

    /// Polls for `tx_id` to be confirmed for at most `max_rounds` rounds.
    ///
    /// Returns the pending transaction response carrying the confirmed round, a
    /// [`AlgodError::Rejected`] when the node evicted the transaction from its pool, or
    /// [`AlgodError::MaxWaitRoundExpired`] once the budget is spent.
    pub async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        max_rounds: u64,
    ) -> Result<PendingTransactionResponse, AlgodError> {
        let status = self.status().await?;
        let start_round = status.last_round + 1;
        let mut current_round = start_round;

        while current_round < start_round + max_rounds {
            match self.pending_transaction_information(tx_id).await {
                Ok(response) => {
                    if !response.pool_error.is_empty() {
                        return Err(AlgodError::Rejected {
                            message: format!(
                                "Transaction {} was rejected; pool error: {}",
                                tx_id, response.pool_error
                            ),
                        });
                    }
                    if response.confirmed_round.is_some() {
                        return Ok(response);
                    }
                }
                // The node may not know about the transaction yet
                Err(error) if error.is_not_found() => {}
                Err(error) => return Err(error),
            }

            debug!("{} not confirmed as of round {}", tx_id, current_round);
            self.wait_for_block(current_round).await?;
            current_round += 1;
        }

        Err(AlgodError::MaxWaitRoundExpired {
            tx_id: tx_id.to_string(),
            max_rounds,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: String,
        query: Option<HashMap<String, String>>,
    ) -> Result<T, AlgodError> {
        let response = self
            .http_client
            .request(HttpMethod::Get, path, query, None, None)
            .await?;
        parse_json(&response.body)
    }
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AlgodError> {
    serde_json::from_slice(body).map_err(|e| AlgodError::InvalidResponse {
        message: e.to_string(),
    })
}
