//! The sponsor account: the single credential that pays pooled fees.
//!
//! The manager is either [`SponsorAccountManager::Ready`] or explicitly
//! [`SponsorAccountManager::Disabled`]. A disabled relay still answers status queries but
//! every operation that needs the key fails with a configuration error, without contacting
//! the ledger.

use crate::error::SponsorError;
use derive_more::Debug;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use gasless_algod::AlgodClient;
use gasless_transact::{
    Address, AlgorandMsgpack, KeyPairAccount, SignedTransaction, Transaction, mnemonic,
};
use log::{info, warn};
use rand::rngs::OsRng;
use serde::Serialize;

/// A loaded sponsor credential. The key never leaves this struct.
#[derive(Debug, Clone)]
pub struct SponsorAccount {
    address: Address,
    #[debug(skip)]
    signing_key: SigningKey,
}

impl SponsorAccount {
    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = KeyPairAccount::from_pubkey(&signing_key.verifying_key().to_bytes()).address();
        SponsorAccount {
            address,
            signing_key,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Balance figures of the sponsor, in microALGO. Advisory only: another process spending
/// from the same account can invalidate them at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceInfo {
    pub balance: u64,
    pub min_balance: u64,
    pub available_for_fees: u64,
}

/// A freshly generated sponsor credential.
#[derive(Debug)]
pub struct GeneratedSponsor {
    pub address: Address,
    #[debug(skip)]
    pub mnemonic: String,
}

#[derive(Debug, Clone)]
pub enum SponsorAccountManager {
    Ready(SponsorAccount),
    Disabled { reason: String },
}

impl SponsorAccountManager {
    /// Loads the sponsor from a 25-word mnemonic.
    pub fn initialize(secret: &str) -> Result<Self, SponsorError> {
        if secret.trim().is_empty() {
            return Err(SponsorError::ConfigurationError {
                message: "sponsor mnemonic is empty".to_string(),
            });
        }
        let key = mnemonic::to_key(secret).map_err(|e| SponsorError::ConfigurationError {
            message: format!("sponsor mnemonic is invalid: {e}"),
        })?;
        let account = SponsorAccount::from_signing_key(SigningKey::from_bytes(&key));
        info!("Sponsor account loaded: {}", account.address);
        Ok(SponsorAccountManager::Ready(account))
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        SponsorAccountManager::Disabled {
            reason: reason.into(),
        }
    }

    /// Builds the manager a relay starts with. Missing or invalid secrets leave sponsorship
    /// disabled rather than stopping the relay.
    pub fn from_secret(secret: Option<&str>) -> Self {
        match secret {
            None => {
                warn!("No sponsor mnemonic configured, gasless transactions are disabled");
                Self::disabled("no sponsor mnemonic configured")
            }
            Some(secret) => Self::initialize(secret).unwrap_or_else(|error| {
                warn!("{error}, gasless transactions are disabled");
                Self::disabled(error.to_string())
            }),
        }
    }

    /// Creates a new random sponsor credential. The mnemonic is handed out exactly once.
    pub fn generate() -> (Self, GeneratedSponsor) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let phrase = mnemonic::from_key(&signing_key.to_bytes());
        let account = SponsorAccount::from_signing_key(signing_key);
        let generated = GeneratedSponsor {
            address: account.address.clone(),
            mnemonic: phrase,
        };
        (SponsorAccountManager::Ready(account), generated)
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, SponsorAccountManager::Ready(_))
    }

    pub fn account(&self) -> Result<&SponsorAccount, SponsorError> {
        match self {
            SponsorAccountManager::Ready(account) => Ok(account),
            SponsorAccountManager::Disabled { reason } => Err(SponsorError::not_configured(reason)),
        }
    }

    pub fn address(&self) -> Result<&Address, SponsorError> {
        self.account().map(SponsorAccount::address)
    }

    /// Queries the ledger for the sponsor balance.
    pub async fn get_balance_info(&self, algod: &AlgodClient) -> Result<BalanceInfo, SponsorError> {
        let address = self.address()?;
        let info = algod.account_information(address).await?;
        Ok(BalanceInfo {
            balance: info.amount,
            min_balance: info.min_balance,
            available_for_fees: info.amount.saturating_sub(info.min_balance),
        })
    }

    /// Refuses early when the sponsor clearly cannot pay `fee`.
    ///
    /// A failed balance query is logged and ignored; the ledger has the final word.
    pub async fn ensure_can_cover(&self, fee: u64, algod: &AlgodClient) -> Result<(), SponsorError> {
        match self.get_balance_info(algod).await {
            Ok(balance) if balance.available_for_fees < fee => {
                Err(SponsorError::LedgerRejectionError {
                    message: format!(
                        "sponsor has {} microALGO available for fees, {} required",
                        balance.available_for_fees, fee
                    ),
                })
            }
            Ok(_) => Ok(()),
            Err(SponsorError::ConfigurationError { message }) => {
                Err(SponsorError::ConfigurationError { message })
            }
            Err(error) => {
                warn!("Skipping sponsor balance pre-flight: {error}");
                Ok(())
            }
        }
    }

    /// Signs `transaction` with the sponsor key. Only transactions sent by the sponsor are
    /// ever signed.
    pub fn sign_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<SignedTransaction, SponsorError> {
        let account = self.account()?;
        if transaction.sender() != &account.address {
            return Err(SponsorError::SigningError {
                message: format!(
                    "transaction sender {} is not the sponsor {}",
                    transaction.sender(),
                    account.address
                ),
            });
        }

        let bytes = transaction.encode().map_err(|e| SponsorError::ValidationError {
            message: format!("failed to encode sponsor transaction: {e}"),
        })?;
        let signature = account.signing_key.sign(&bytes);

        Ok(SignedTransaction {
            transaction: transaction.clone(),
            signature: Some(signature.to_bytes()),
            auth_address: None,
        })
    }
}

/// Checks the ed25519 signature of `signed` against its authorizing address.
pub fn verify_signature(signed: &SignedTransaction) -> Result<(), String> {
    let signature = signed
        .signature
        .ok_or_else(|| "transaction is not signed".to_string())?;
    let verifying_key = VerifyingKey::from_bytes(signed.signer().as_bytes())
        .map_err(|e| format!("signer {} is not a valid public key: {e}", signed.signer()))?;
    let bytes = signed
        .transaction
        .encode()
        .map_err(|e| format!("failed to encode transaction: {e}"))?;

    verifying_key
        .verify(&bytes, &Signature::from_bytes(&signature))
        .map_err(|_| format!("signature does not match signer {}", signed.signer()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gasless_transact::test_utils::{AccountMother, SIGNING_PRIVATE_KEY, TransactionMother};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const SIGNER_MNEMONIC: &str = "park palace mouse tomorrow piano valve castle solution garlic rhythm cabbage fork sleep comfort uphold area giant better height frozen ask tank gesture ability little";

    #[test]
    fn test_initialize_derives_address() {
        let manager = SponsorAccountManager::initialize(SIGNER_MNEMONIC).unwrap();
        assert_eq!(
            manager.address().unwrap(),
            &AccountMother::signer().address()
        );
        assert_eq!(mnemonic::from_key(&SIGNING_PRIVATE_KEY), SIGNER_MNEMONIC);
    }

    #[rstest]
    #[case::empty("")]
    #[case::short("park palace mouse")]
    #[case::bad_checksum("park palace mouse tomorrow piano valve castle solution garlic rhythm cabbage fork sleep comfort uphold area giant better height frozen ask tank gesture ability abandon")]
    fn test_initialize_rejects_bad_secrets(#[case] secret: &str) {
        let error = SponsorAccountManager::initialize(secret).unwrap_err();
        assert!(matches!(error, SponsorError::ConfigurationError { .. }));
    }

    #[test]
    fn test_from_secret_disables_on_failure() {
        let manager = SponsorAccountManager::from_secret(Some("not a mnemonic"));
        assert!(!manager.is_configured());
        assert!(matches!(
            manager.address(),
            Err(SponsorError::ConfigurationError { .. })
        ));
        assert!(!SponsorAccountManager::from_secret(None).is_configured());
    }

    #[test]
    fn test_sign_only_sponsor_transactions() {
        let manager = SponsorAccountManager::initialize(SIGNER_MNEMONIC).unwrap();
        let sponsor = AccountMother::signer().address();

        let own = TransactionMother::fee_carrier(&sponsor, 2000).build().unwrap();
        let signed = manager.sign_transaction(&own).unwrap();
        assert!(verify_signature(&signed).is_ok());

        let foreign = TransactionMother::simple_payment().build().unwrap();
        let error = manager.sign_transaction(&foreign).unwrap_err();
        assert!(matches!(error, SponsorError::SigningError { .. }));
    }

    #[test]
    fn test_disabled_manager_refuses_to_sign() {
        let manager = SponsorAccountManager::disabled("no sponsor mnemonic configured");
        let txn = TransactionMother::simple_payment().build().unwrap();
        assert!(matches!(
            manager.sign_transaction(&txn),
            Err(SponsorError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_generate_round_trips_through_mnemonic() {
        let (manager, generated) = SponsorAccountManager::generate();
        let reloaded = SponsorAccountManager::initialize(&generated.mnemonic).unwrap();
        assert_eq!(reloaded.address().unwrap(), &generated.address);
        assert_eq!(manager.address().unwrap(), &generated.address);
        assert!(!format!("{generated:?}").contains(&generated.mnemonic));
    }

    #[test]
    fn test_tampered_transaction_fails_verification() {
        let manager = SponsorAccountManager::initialize(SIGNER_MNEMONIC).unwrap();
        let sponsor = AccountMother::signer().address();
        let txn = TransactionMother::fee_carrier(&sponsor, 2000).build().unwrap();
        let mut signed = manager.sign_transaction(&txn).unwrap();
        signed.transaction.header_mut().fee = Some(3000);
        assert!(verify_signature(&signed).is_err());
    }
}
