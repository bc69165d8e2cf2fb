//! Client side of the relay: build, let the wallet sign, submit.

use crate::builder::Action;
use crate::error::SponsorError;
use crate::receipt::SponsorshipReceipt;
use crate::server::{BuildRequest, BuildResponse, ErrorBody, SubmitRequest, SubmitResponse};
use async_trait::async_trait;
use base64::{Engine, prelude::BASE64_STANDARD};
use gasless_http_client::{HttpClient, HttpError, HttpMethod};
use gasless_transact::{Address, AlgorandMsgpack, SignedTransaction, Transaction};
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// The wallet boundary. Implementations sign with a key the relay never sees.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    async fn sign(&self, transaction: &Transaction) -> Result<SignedTransaction, String>;
}

/// A caller-supplied way of running an action with the user paying its own fee.
#[async_trait]
pub trait PaidSubmitter: Send + Sync {
    async fn submit_paid(
        &self,
        action: &Action,
        user: &Address,
    ) -> Result<SponsorshipReceipt, SponsorError>;
}

/// What to do when the relay cannot sponsor.
#[derive(Clone, Default)]
pub enum FallbackPolicy {
    /// Report every relay failure to the caller.
    #[default]
    Disallow,
    /// Run the paid path when the relay has no sponsor configured.
    AllowPaidFallback(Arc<dyn PaidSubmitter>),
}

/// The unsigned pair returned by the relay.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedGroup {
    pub user_txn: Transaction,
    pub sponsor_txn: Transaction,
    pub sponsor_txn_bytes: Vec<u8>,
    pub group_id: String,
}

pub struct GaslessClient {
    http_client: Arc<dyn HttpClient>,
    fallback: FallbackPolicy,
}

impl GaslessClient {
    pub fn new(http_client: Arc<dyn HttpClient>, fallback: FallbackPolicy) -> Self {
        GaslessClient {
            http_client,
            fallback,
        }
    }

    #[cfg(feature = "default_http_client")]
    pub fn from_url(relay_url: &str, fallback: FallbackPolicy) -> Self {
        Self::new(
            Arc::new(gasless_http_client::DefaultHttpClient::new(relay_url)),
            fallback,
        )
    }

    pub async fn sponsor_address(&self) -> Result<Address, SponsorError> {
        let body: serde_json::Value = self
            .call(HttpMethod::Get, "/sponsor/address", None::<&()>)
            .await?;
        body.get("address")
            .and_then(|address| address.as_str())
            .and_then(|address| address.parse().ok())
            .ok_or_else(|| SponsorError::LedgerUnavailableError {
                message: "relay returned no sponsor address".to_string(),
            })
    }

    pub async fn build(&self, action: &Action, user: &Address) -> Result<UnsignedGroup, SponsorError> {
        let request = BuildRequest {
            action: action.clone(),
            user_address: user.clone(),
        };
        let response: BuildResponse = self
            .call(HttpMethod::Post, "/sponsor/build", Some(&request))
            .await?;

        let decode = |encoded: &str| -> Result<(Transaction, Vec<u8>), SponsorError> {
            let bytes = BASE64_STANDARD
                .decode(encoded)
                .map_err(|e| SponsorError::validation(e.to_string()))?;
            let txn = Transaction::decode(&bytes).map_err(|e| SponsorError::validation(e.to_string()))?;
            Ok((txn, bytes))
        };
        let (user_txn, _) = decode(&response.user_txn_unsigned)?;
        let (sponsor_txn, sponsor_txn_bytes) = decode(&response.sponsor_txn_unsigned)?;

        if user_txn.sender() != user || user_txn.fee() != 0 {
            return Err(SponsorError::validation(
                "relay built a user transaction that does not match the request",
            ));
        }

        Ok(UnsignedGroup {
            user_txn,
            sponsor_txn,
            sponsor_txn_bytes,
            group_id: response.group_id,
        })
    }

    pub async fn submit(
        &self,
        signed_user_txn: &SignedTransaction,
        unsigned_sponsor_txn: &[u8],
        max_rounds_to_wait: Option<u64>,
    ) -> Result<SponsorshipReceipt, SponsorError> {
        let request = SubmitRequest {
            signed_user_txn: signed_user_txn
                .encode()
                .map_err(|e| SponsorError::validation(e.to_string()))?,
            unsigned_sponsor_txn: unsigned_sponsor_txn.to_vec(),
            max_rounds_to_wait,
        };
        let response: SubmitResponse = self
            .call(HttpMethod::Post, "/sponsor/submit", Some(&request))
            .await?;
        Ok(response.receipt)
    }

    /// Re-queries a transaction that timed out.
    pub async fn status(&self, tx_id: &str) -> Result<SponsorshipReceipt, SponsorError> {
        let response: SubmitResponse = self
            .call(HttpMethod::Get, &format!("/sponsor/status/{tx_id}"), None::<&()>)
            .await?;
        Ok(response.receipt)
    }

    /// Runs `action` for `user` end to end, asking `signer` to sign the user's half.
    pub async fn execute(
        &self,
        action: &Action,
        user: &Address,
        signer: &dyn WalletSigner,
    ) -> Result<SponsorshipReceipt, SponsorError> {
        match self.execute_sponsored(action, user, signer).await {
            Err(error @ SponsorError::ConfigurationError { .. }) => match &self.fallback {
                FallbackPolicy::AllowPaidFallback(paid) => {
                    warn!("Relay cannot sponsor ({error}), falling back to a paid transaction");
                    let mut receipt = paid.submit_paid(action, user).await?;
                    receipt.gasless = false;
                    Ok(receipt)
                }
                FallbackPolicy::Disallow => Err(error),
            },
            other => other,
        }
    }

    async fn execute_sponsored(
        &self,
        action: &Action,
        user: &Address,
        signer: &dyn WalletSigner,
    ) -> Result<SponsorshipReceipt, SponsorError> {
        let group = self.build(action, user).await?;
        let signed = signer
            .sign(&group.user_txn)
            .await
            .map_err(|reason| SponsorError::SigningError { message: reason })?;
        if signed.transaction != group.user_txn {
            return Err(SponsorError::SigningError {
                message: "wallet signed a different transaction".to_string(),
            });
        }

        let receipt = self.submit(&signed, &group.sponsor_txn_bytes, None).await?;
        info!("Gasless {} confirmed: {}", action.name(), receipt.tx_id);
        Ok(receipt)
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, SponsorError> {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| SponsorError::validation(e.to_string()))?;
        let headers = HashMap::from([(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )]);

        let response = self
            .http_client
            .request(method, path.to_string(), None, body, Some(headers))
            .await
            .map_err(relay_error)?;
        serde_json::from_slice(&response.body).map_err(|e| SponsorError::LedgerUnavailableError {
            message: format!("unexpected relay response: {e}"),
        })
    }
}

/// Rebuilds the relay's error from its response body.
fn relay_error(error: HttpError) -> SponsorError {
    match error {
        HttpError::RequestError { message } => SponsorError::LedgerUnavailableError {
            message: format!("relay unreachable: {message}"),
        },
        HttpError::StatusError { status, message } => {
            match serde_json::from_str::<ErrorBody>(&message) {
                Ok(body) => SponsorError::from_kind(body.kind, body.error, body.tx_id),
                Err(_) => SponsorError::LedgerUnavailableError {
                    message: format!("relay returned {status}: {message}"),
                },
            }
        }
    }
}
