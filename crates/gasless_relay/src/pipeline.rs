//! Validates, co-signs, submits and tracks sponsored groups.
//!
//! A request moves strictly forward through [`Stage`]s. Every check that can be done
//! locally runs before the ledger is contacted, and the sponsor key signs only after the
//! whole group has been validated.

use crate::builder::{Action, GroupBuilder, SponsoredGroup, sponsor_fee};
use crate::config::{MAX_CONFIRMATION_ROUNDS, RelayConfig};
use crate::error::SponsorError;
use crate::receipt::{SponsorshipReceipt, explorer_url};
use crate::sponsor::{BalanceInfo, SponsorAccountManager, verify_signature};
use base64::{Engine, prelude::BASE64_STANDARD};
use derive_more::Display;
use gasless_algod::{AlgodClient, AlgodError};
use gasless_transact::{
    Address, AlgorandMsgpack, SignedTransaction, Transaction, TransactionId, compute_group,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    SponsorSigned,
    Submitted,
    Confirmed,
}

/// The two halves of a submission after local validation.
#[derive(Debug)]
struct ValidatedGroup {
    sponsor_txn: Transaction,
    user_bytes: Vec<u8>,
    user_tx_id: String,
    group_id: String,
}

/// A group this relay co-signed and the node accepted.
#[derive(Debug, Clone)]
struct Broadcast {
    group_id: String,
    sponsor_tx_id: String,
}

pub struct Relay {
    algod: AlgodClient,
    sponsor: Arc<SponsorAccountManager>,
    builder: GroupBuilder,
    explorer_base_url: String,
    confirmation_rounds: u64,
    /// Keyed by the user's transaction ID.
    broadcasts: Mutex<HashMap<String, Broadcast>>,
}

impl Relay {
    pub fn new(algod: AlgodClient, sponsor: Arc<SponsorAccountManager>, config: &RelayConfig) -> Self {
        Relay {
            builder: GroupBuilder::new(algod.clone(), config.validity_window),
            algod,
            sponsor,
            explorer_base_url: config.explorer_base_url.clone(),
            confirmation_rounds: config.confirmation_rounds.clamp(1, MAX_CONFIRMATION_ROUNDS),
            broadcasts: Mutex::new(HashMap::new()),
        }
    }

    pub fn sponsor(&self) -> &SponsorAccountManager {
        &self.sponsor
    }

    pub fn sponsor_address(&self) -> Result<&Address, SponsorError> {
        self.sponsor.address()
    }

    pub async fn sponsor_info(&self) -> Result<(Address, BalanceInfo), SponsorError> {
        let address = self.sponsor.address()?.clone();
        let balance = self.sponsor.get_balance_info(&self.algod).await?;
        Ok((address, balance))
    }

    /// Builds the unsigned `[sponsor, user]` pair for `action` on behalf of `user`.
    pub async fn build(&self, action: &Action, user: &Address) -> Result<SponsoredGroup, SponsorError> {
        let sponsor = self.sponsor.address()?;
        self.builder.build_sponsored_group(action, user, sponsor).await
    }

    /// Runs a user-signed group through validation, co-signing, submission and
    /// confirmation.
    ///
    /// `max_rounds` defaults to the configured budget and is capped at
    /// [`MAX_CONFIRMATION_ROUNDS`]. Once the group is broadcast, failures to observe it are
    /// reported as [`SponsorError::TimedOut`] carrying the user's transaction ID.
    pub async fn submit(
        &self,
        signed_user_txn: &[u8],
        unsigned_sponsor_txn: &[u8],
        max_rounds: Option<u64>,
    ) -> Result<SponsorshipReceipt, SponsorError> {
        debug!("Sponsorship request: {}", Stage::Received);
        let max_rounds = self.round_budget(max_rounds)?;
        let sponsor = self.sponsor.address()?;

        let validated = validate_locally(signed_user_txn, unsigned_sponsor_txn, sponsor)?;
        self.validate_against_network(&validated).await?;
        debug!("{}: {}", validated.user_tx_id, Stage::Validated);

        self.sponsor
            .ensure_can_cover(validated.sponsor_txn.fee(), &self.algod)
            .await?;

        let signed_sponsor = self.sponsor.sign_transaction(&validated.sponsor_txn)?;
        debug!("{}: {}", validated.user_tx_id, Stage::SponsorSigned);

        let payload = assemble(&signed_sponsor, &validated.user_bytes)?;
        let response = self.algod.raw_transaction(payload).await.map_err(|error| {
            warn!("Submission of {} failed: {error}", validated.user_tx_id);
            SponsorError::from(error)
        })?;
        debug!(
            "{}: {} (node reported {})",
            validated.user_tx_id,
            Stage::Submitted,
            response.tx_id
        );

        let broadcast = Broadcast {
            group_id: validated.group_id,
            sponsor_tx_id: signed_sponsor
                .id()
                .map_err(|e| SponsorError::validation(e.to_string()))?,
        };
        self.broadcasts()
            .insert(validated.user_tx_id.clone(), broadcast.clone());

        let receipt = self.confirm(&validated.user_tx_id, max_rounds).await?;
        Ok(with_broadcast(receipt, broadcast))
    }

    /// Polls again for a transaction that previously timed out.
    ///
    /// Only groups this relay broadcast are reported. The user's transaction carries the
    /// group ID, so once it is confirmed the sponsor transaction recorded with it is too.
    pub async fn requery(
        &self,
        tx_id: &str,
        max_rounds: Option<u64>,
    ) -> Result<SponsorshipReceipt, SponsorError> {
        if !is_transaction_id(tx_id) {
            return Err(SponsorError::validation(format!(
                "'{tx_id}' is not a transaction ID"
            )));
        }
        let max_rounds = self.round_budget(max_rounds)?;
        let broadcast = self.broadcasts().get(tx_id).cloned().ok_or_else(|| {
            SponsorError::validation(format!("{tx_id} was not sponsored by this relay"))
        })?;

        let receipt = self.confirm(tx_id, max_rounds).await?;
        Ok(with_broadcast(receipt, broadcast))
    }

    fn broadcasts(&self) -> MutexGuard<'_, HashMap<String, Broadcast>> {
        self.broadcasts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn round_budget(&self, requested: Option<u64>) -> Result<u64, SponsorError> {
        match requested {
            None => Ok(self.confirmation_rounds),
            Some(0) => Err(SponsorError::validation(
                "maxRoundsToWait must be at least 1",
            )),
            Some(rounds) => Ok(rounds.min(MAX_CONFIRMATION_ROUNDS)),
        }
    }

    async fn validate_against_network(&self, validated: &ValidatedGroup) -> Result<(), SponsorError> {
        let params = self.algod.transaction_params().await?;
        let genesis_hash = params.genesis_hash_bytes()?;

        if validated.sponsor_txn.header().genesis_hash != Some(genesis_hash) {
            return Err(SponsorError::validation(format!(
                "transactions are not for network {}",
                params.genesis_id
            )));
        }

        let expected_fee = sponsor_fee(params.min_fee)?;
        if validated.sponsor_txn.fee() != expected_fee {
            return Err(SponsorError::validation(format!(
                "sponsor fee must be {expected_fee} microALGO, got {}",
                validated.sponsor_txn.fee()
            )));
        }
        Ok(())
    }

    async fn confirm(&self, tx_id: &str, max_rounds: u64) -> Result<SponsorshipReceipt, SponsorError> {
        match self.algod.wait_for_confirmation(tx_id, max_rounds).await {
            Ok(response) => {
                let confirmed_round = response.confirmed_round.unwrap_or_default();
                info!("{tx_id}: {} in round {confirmed_round}", Stage::Confirmed);
                Ok(SponsorshipReceipt {
                    tx_id: tx_id.to_string(),
                    confirmed_round,
                    gasless: true,
                    explorer_url: explorer_url(&self.explorer_base_url, tx_id),
                    group_id: None,
                    sponsor_tx_id: None,
                })
            }
            Err(error @ AlgodError::Rejected { .. }) => {
                warn!("{tx_id} was rejected: {error}");
                Err(error.into())
            }
            Err(error) => {
                warn!("{tx_id} not confirmed: {error}");
                Err(SponsorError::TimedOut {
                    tx_id: tx_id.to_string(),
                    message: match error {
                        AlgodError::MaxWaitRoundExpired { max_rounds, .. } => format!(
                            "unconfirmed after {max_rounds} rounds, re-query by transaction ID"
                        ),
                        other => format!("lost track of the transaction: {other}"),
                    },
                })
            }
        }
    }
}

/// Checks everything about a submission that needs no network access.
fn validate_locally(
    signed_user_txn: &[u8],
    unsigned_sponsor_txn: &[u8],
    sponsor: &Address,
) -> Result<ValidatedGroup, SponsorError> {
    let sponsor_txn = Transaction::decode(unsigned_sponsor_txn)
        .map_err(|e| SponsorError::validation(format!("invalid sponsor transaction: {e}")))?;
    let signed_user = SignedTransaction::decode(signed_user_txn)
        .map_err(|e| SponsorError::validation(format!("invalid user transaction: {e}")))?;

    if sponsor_txn.sender() != sponsor {
        return Err(SponsorError::validation(format!(
            "sponsor transaction sender {} is not the sponsor {}",
            sponsor_txn.sender(),
            sponsor
        )));
    }
    match &sponsor_txn {
        Transaction::Payment(fields) if fields.is_fee_carrier() => {}
        _ => {
            return Err(SponsorError::validation(
                "sponsor transaction must be a zero-amount self-payment",
            ));
        }
    }

    let user_txn = &signed_user.transaction;
    if signed_user.signature.is_none() {
        return Err(SponsorError::validation("user transaction is not signed"));
    }
    if user_txn.sender() == sponsor {
        return Err(SponsorError::validation(
            "user transaction must not be sent by the sponsor",
        ));
    }
    let reencoded = signed_user
        .encode()
        .map_err(|e| SponsorError::validation(e.to_string()))?;
    if reencoded != signed_user_txn {
        return Err(SponsorError::validation(
            "user transaction contains fields that cannot be sponsored",
        ));
    }
    verify_signature(&signed_user)
        .map_err(|reason| SponsorError::validation(format!("user signature invalid: {reason}")))?;

    let group_id = match (sponsor_txn.header().group, user_txn.header().group) {
        (Some(sponsor_group), Some(user_group)) if sponsor_group == user_group => sponsor_group,
        (Some(_), Some(_)) => {
            return Err(SponsorError::validation(
                "user and sponsor transactions carry different group IDs",
            ));
        }
        _ => {
            return Err(SponsorError::validation(
                "both transactions must carry a group ID",
            ));
        }
    };
    let expected = compute_group(&[sponsor_txn.ungrouped(), user_txn.ungrouped()])
        .map_err(|e| SponsorError::validation(e.to_string()))?;
    if expected != group_id {
        return Err(SponsorError::validation(
            "group ID does not match the [sponsor, user] transactions",
        ));
    }

    if user_txn.fee() != 0 {
        return Err(SponsorError::validation(format!(
            "user transaction fee must be 0, got {}",
            user_txn.fee()
        )));
    }
    if user_txn.header().genesis_hash != sponsor_txn.header().genesis_hash {
        return Err(SponsorError::validation(
            "user and sponsor transactions are for different networks",
        ));
    }

    let user_tx_id = user_txn
        .id()
        .map_err(|e| SponsorError::validation(e.to_string()))?;

    Ok(ValidatedGroup {
        sponsor_txn,
        user_bytes: reencoded,
        user_tx_id,
        group_id: BASE64_STANDARD.encode(group_id),
    })
}

fn with_broadcast(receipt: SponsorshipReceipt, broadcast: Broadcast) -> SponsorshipReceipt {
    SponsorshipReceipt {
        group_id: Some(broadcast.group_id),
        sponsor_tx_id: Some(broadcast.sponsor_tx_id),
        ..receipt
    }
}

/// Concatenates the group in submission order: sponsor first.
fn assemble(signed_sponsor: &SignedTransaction, user_bytes: &[u8]) -> Result<Vec<u8>, SponsorError> {
    let mut payload = signed_sponsor
        .encode()
        .map_err(|e| SponsorError::validation(e.to_string()))?;
    payload.extend_from_slice(user_bytes);
    Ok(payload)
}

fn is_transaction_id(tx_id: &str) -> bool {
    tx_id.len() == 52
        && base32::decode(base32::Alphabet::Rfc4648 { padding: false }, tx_id)
            .is_some_and(|bytes| bytes.len() == 32)
}
