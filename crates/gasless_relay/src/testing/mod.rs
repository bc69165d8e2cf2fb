//! An in-memory algod for exercising the relay without a network.
//!
//! [`FakeLedger`] serves the algod routes the relay uses. Submitted groups are checked the
//! way a node checks them (signatures, group ID, pooled fees, balances) and are applied all
//! or nothing.

use crate::config::RelayConfig;
use crate::pipeline::Relay;
use crate::sponsor::{SponsorAccountManager, verify_signature};
use async_trait::async_trait;
use base64::{Engine, prelude::BASE64_STANDARD};
use gasless_algod::{
    AccountInformation, AlgodClient, NodeStatus, PendingTransactionResponse,
    RawTransactionResponse, TransactionParams,
};
use gasless_http_client::{HttpClient, HttpError, HttpMethod, HttpResponse};
use gasless_transact::{
    Address, Byte32, Transaction, TransactionId, compute_group, decode_signed_group,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const FAKE_GENESIS_ID: &str = "testnet-v1.0";
pub const FAKE_GENESIS_HASH: &str = "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=";
pub const FAKE_MIN_FEE: u64 = 1000;
pub const FAKE_MIN_BALANCE: u64 = 100_000;

#[derive(Debug, Clone)]
struct PendingTxn {
    due_round: Option<u64>,
    confirmed_round: Option<u64>,
}

#[derive(Debug)]
struct LedgerState {
    round: u64,
    min_fee: u64,
    genesis_hash: Byte32,
    balances: HashMap<Address, u64>,
    pending: HashMap<String, PendingTxn>,
    confirm_after: Option<u64>,
    offline: bool,
    offline_after_submit: bool,
    reject_with: Option<String>,
    requests: Vec<(HttpMethod, String)>,
    submissions: Vec<Vec<String>>,
}

pub struct FakeLedger {
    state: Mutex<LedgerState>,
}

impl Default for FakeLedger {
    fn default() -> Self {
        let mut genesis_hash = [0u8; 32];
        if let Ok(bytes) = BASE64_STANDARD.decode(FAKE_GENESIS_HASH) {
            genesis_hash.copy_from_slice(&bytes);
        }
        FakeLedger {
            state: Mutex::new(LedgerState {
                round: 1000,
                min_fee: FAKE_MIN_FEE,
                genesis_hash,
                balances: HashMap::new(),
                pending: HashMap::new(),
                confirm_after: Some(1),
                offline: false,
                offline_after_submit: false,
                reject_with: None,
                requests: Vec::new(),
                submissions: Vec::new(),
            }),
        }
    }
}

impl FakeLedger {
    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fund(self, address: &Address, amount: u64) -> Self {
        self.state().balances.insert(address.clone(), amount);
        self
    }

    pub fn with_min_fee(self, min_fee: u64) -> Self {
        self.state().min_fee = min_fee;
        self
    }

    /// Rounds between submission and confirmation. `None` never confirms.
    pub fn confirm_after(self, rounds: Option<u64>) -> Self {
        self.state().confirm_after = rounds;
        self
    }

    /// Every request fails as if the node were unreachable.
    pub fn offline(self) -> Self {
        self.state().offline = true;
        self
    }

    /// The node becomes unreachable right after accepting a submission.
    pub fn offline_after_submit(self) -> Self {
        self.state().offline_after_submit = true;
        self
    }

    pub fn reject_submissions(self, message: &str) -> Self {
        self.state().reject_with = Some(message.to_string());
        self
    }

    pub fn set_balance(&self, address: &Address, amount: u64) {
        self.state().balances.insert(address.clone(), amount);
    }

    pub fn set_min_fee(&self, min_fee: u64) {
        self.state().min_fee = min_fee;
    }

    /// Confirms everything still pending in the current round.
    pub fn confirm_pending(&self) {
        let mut state = self.state();
        let round = state.round;
        for pending in state.pending.values_mut() {
            pending.confirmed_round.get_or_insert(round);
        }
    }

    pub fn balance(&self, address: &Address) -> u64 {
        self.state().balances.get(address).copied().unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<(HttpMethod, String)> {
        self.state().requests.clone()
    }

    /// Transaction IDs of every accepted submission, in group order.
    pub fn submissions(&self) -> Vec<Vec<String>> {
        self.state().submissions.clone()
    }

    pub fn params(&self) -> TransactionParams {
        let state = self.state();
        TransactionParams {
            consensus_version: "future".to_string(),
            fee: 0,
            genesis_hash: BASE64_STANDARD.encode(state.genesis_hash),
            genesis_id: FAKE_GENESIS_ID.to_string(),
            last_round: state.round,
            min_fee: state.min_fee,
        }
    }

    fn submit(&self, body: &[u8]) -> Result<RawTransactionResponse, HttpError> {
        let mut state = self.state();
        if let Some(message) = state.reject_with.clone() {
            return Err(rejection(message));
        }

        let group = decode_signed_group(body).map_err(|e| rejection(e.to_string()))?;
        let txns: Vec<&Transaction> = group.iter().map(|signed| &signed.transaction).collect();

        for signed in &group {
            verify_signature(signed).map_err(rejection)?;
            if signed.transaction.header().genesis_hash != Some(state.genesis_hash) {
                return Err(rejection("genesis hash mismatch".to_string()));
            }
        }

        if group.len() > 1 {
            let ungrouped: Vec<Transaction> = txns.iter().map(|tx| tx.ungrouped()).collect();
            let expected = compute_group(&ungrouped).map_err(|e| rejection(e.to_string()))?;
            if txns.iter().any(|tx| tx.header().group != Some(expected)) {
                return Err(rejection("group ID mismatch, the group is incomplete or altered".to_string()));
            }
        }

        let total_fee: u64 = txns.iter().map(|tx| tx.fee()).sum();
        let required_fee = state.min_fee * txns.len() as u64;
        if total_fee < required_fee {
            return Err(rejection(format!(
                "fee too small: group pays {total_fee}, needs {required_fee}"
            )));
        }

        // Balances are applied to a copy and committed only if every transaction fits
        let mut balances = state.balances.clone();
        for tx in &txns {
            let (receiver, amount) = match tx {
                Transaction::Payment(fields) => (Some(&fields.receiver), fields.amount),
                _ => (None, 0),
            };
            let sender_balance = balances.get(tx.sender()).copied().unwrap_or_default();
            let remaining = sender_balance
                .checked_sub(tx.fee() + amount)
                .filter(|remaining| *remaining >= FAKE_MIN_BALANCE)
                .ok_or_else(|| {
                    rejection(format!(
                        "TransactionPool.Remember: overspend (account {}, balance {})",
                        tx.sender(),
                        sender_balance
                    ))
                })?;
            balances.insert(tx.sender().clone(), remaining);
            if let Some(receiver) = receiver {
                *balances.entry(receiver.clone()).or_default() += amount;
            }
        }
        state.balances = balances;

        let ids = txns
            .iter()
            .map(|tx| tx.id())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| rejection(e.to_string()))?;
        let round = state.round;
        let due_round = state.confirm_after.map(|after| round + after);
        for id in &ids {
            state.pending.insert(
                id.clone(),
                PendingTxn {
                    due_round,
                    confirmed_round: due_round.filter(|due| *due <= round),
                },
            );
        }
        state.submissions.push(ids.clone());
        if state.offline_after_submit {
            state.offline = true;
        }

        Ok(RawTransactionResponse {
            tx_id: ids.into_iter().next().unwrap_or_default(),
        })
    }

    fn wait_for_block(&self, after: u64) -> NodeStatus {
        let mut state = self.state();
        state.round = state.round.max(after + 1);
        let round = state.round;
        for pending in state.pending.values_mut() {
            if pending.confirmed_round.is_none() && pending.due_round.is_some_and(|due| due <= round)
            {
                pending.confirmed_round = Some(round);
            }
        }
        NodeStatus { last_round: round }
    }

    fn route(&self, method: &HttpMethod, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>, HttpError> {
        match (method, path) {
            (HttpMethod::Get, "/v2/transactions/params") => to_json(&self.params()),
            (HttpMethod::Get, "/v2/status") => to_json(&NodeStatus {
                last_round: self.state().round,
            }),
            (HttpMethod::Post, "/v2/transactions") => to_json(&self.submit(body.unwrap_or_default())?),
            (HttpMethod::Get, path) if path.starts_with("/v2/status/wait-for-block-after/") => {
                let after = path
                    .rsplit('/')
                    .next()
                    .and_then(|round| round.parse().ok())
                    .ok_or_else(|| status_error(400, "invalid round".to_string()))?;
                to_json(&self.wait_for_block(after))
            }
            (HttpMethod::Get, path) if path.starts_with("/v2/transactions/pending/") => {
                let tx_id = path.trim_start_matches("/v2/transactions/pending/");
                let pending = self.state().pending.get(tx_id).cloned();
                match pending {
                    Some(pending) => to_json(&PendingTransactionResponse {
                        confirmed_round: pending.confirmed_round,
                        pool_error: String::new(),
                    }),
                    None => Err(status_error(404, "txn does not exist".to_string())),
                }
            }
            (HttpMethod::Get, path) if path.starts_with("/v2/accounts/") => {
                let address: Address = path
                    .trim_start_matches("/v2/accounts/")
                    .parse()
                    .map_err(|_| status_error(400, "invalid address".to_string()))?;
                to_json(&AccountInformation {
                    address: address.to_string(),
                    amount: self.balance(&address),
                    min_balance: FAKE_MIN_BALANCE,
                })
            }
            _ => Err(status_error(404, format!("no route for {path}"))),
        }
    }
}

#[async_trait]
impl HttpClient for FakeLedger {
    async fn request(
        &self,
        method: HttpMethod,
        path: String,
        _query: Option<HashMap<String, String>>,
        body: Option<Vec<u8>>,
        _headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, HttpError> {
        {
            let mut state = self.state();
            state.requests.push((method.clone(), path.clone()));
            if state.offline {
                return Err(HttpError::RequestError {
                    message: "connection refused".to_string(),
                });
            }
        }

        let body = self.route(&method, &path, body.as_deref())?;
        Ok(HttpResponse {
            body,
            headers: HashMap::new(),
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, HttpError> {
    serde_json::to_vec(value).map_err(|e| status_error(500, e.to_string()))
}

fn status_error(status: u16, message: String) -> HttpError {
    HttpError::StatusError {
        status,
        message: serde_json::json!({ "message": message }).to_string(),
    }
}

fn rejection(message: String) -> HttpError {
    status_error(400, message)
}

/// A relay backed by `ledger` with default configuration.
pub fn relay_with(ledger: Arc<FakeLedger>, sponsor: SponsorAccountManager) -> Relay {
    Relay::new(AlgodClient::new(ledger), Arc::new(sponsor), &RelayConfig::default())
}
