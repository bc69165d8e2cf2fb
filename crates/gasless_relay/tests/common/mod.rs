#![allow(dead_code)]

use async_trait::async_trait;
use gasless_relay::testing::{FakeLedger, relay_with};
use gasless_relay::{
    Action, AppArg, AppCallParams, AssetCreateParams, PaymentParams, Relay,
    SponsorAccountManager, SponsoredGroup, WalletSigner,
};
use gasless_transact::test_utils::{AccountMother, sign_with_test_key};
use gasless_transact::{
    Address, AlgorandMsgpack, OnApplicationComplete, SignedTransaction, Transaction,
    Transactions,
};
use std::sync::Arc;

pub const SPONSOR_FUNDS: u64 = 10_000_000;
pub const USER_FUNDS: u64 = 1_000_000;

pub struct RelayFixture {
    pub ledger: Arc<FakeLedger>,
    pub relay: Arc<Relay>,
    pub sponsor: Address,
    pub user: Address,
}

impl RelayFixture {
    pub fn new() -> Self {
        Self::with_ledger(|ledger| ledger)
    }

    /// A relay with a fresh sponsor, funded along with the user on a ledger adjusted by
    /// `configure`.
    pub fn with_ledger(configure: impl FnOnce(FakeLedger) -> FakeLedger) -> Self {
        let (manager, generated) = SponsorAccountManager::generate();
        let user = AccountMother::signer().address();
        let ledger = Arc::new(configure(
            FakeLedger::default()
                .fund(&generated.address, SPONSOR_FUNDS)
                .fund(&user, USER_FUNDS),
        ));
        RelayFixture {
            relay: Arc::new(relay_with(ledger.clone(), manager)),
            ledger,
            sponsor: generated.address,
            user,
        }
    }

    pub fn disabled() -> Self {
        let ledger = Arc::new(FakeLedger::default());
        RelayFixture {
            relay: Arc::new(relay_with(
                ledger.clone(),
                SponsorAccountManager::disabled("no sponsor mnemonic configured"),
            )),
            ledger,
            sponsor: AccountMother::zero_address_account().address(),
            user: AccountMother::signer().address(),
        }
    }

    pub async fn build(&self, action: &Action) -> SponsoredGroup {
        self.relay.build(action, &self.user).await.unwrap()
    }
}

pub fn receiver() -> Address {
    AccountMother::neil().address()
}

pub fn payment(amount: u64) -> Action {
    Action::Payment(PaymentParams {
        receiver: receiver(),
        amount,
        note: None,
        close_remainder_to: None,
    })
}

pub fn app_call() -> Action {
    Action::AppCall(AppCallParams {
        app_id: 1234,
        on_complete: OnApplicationComplete::NoOp,
        args: vec![AppArg::Text("vote".to_string()), AppArg::Uint(2)],
        accounts: vec![receiver()],
        foreign_apps: vec![],
        foreign_assets: vec![],
        note: Some("sponsored vote".to_string()),
    })
}

pub fn asset_create() -> Action {
    Action::AssetCreate(AssetCreateParams {
        total: 1_000,
        decimals: 2,
        default_frozen: false,
        unit_name: "GAS".to_string(),
        asset_name: "Gasless".to_string(),
        url: "https://example.com/gasless".to_string(),
        metadata_hash: None,
        manager: None,
        reserve: None,
        freeze: None,
        clawback: None,
        note: None,
    })
}

/// The wire form of a built group after the user signed their half.
pub fn signed_submission(group: &SponsoredGroup) -> (Vec<u8>, Vec<u8>) {
    (
        sign_with_test_key(&group.user_txn).encode().unwrap(),
        group.sponsor_txn.encode_raw().unwrap(),
    )
}

/// Regroups `[sponsor, user]` after `edit` has changed them, then signs the user half.
pub fn regrouped_submission(
    group: &SponsoredGroup,
    edit: impl FnOnce(&mut Transaction, &mut Transaction),
) -> (Vec<u8>, Vec<u8>) {
    let mut sponsor_txn = group.sponsor_txn.ungrouped();
    let mut user_txn = group.user_txn.ungrouped();
    edit(&mut sponsor_txn, &mut user_txn);
    let grouped = [sponsor_txn, user_txn].as_slice().assign_group().unwrap();
    (
        sign_with_test_key(&grouped[1]).encode().unwrap(),
        grouped[0].encode_raw().unwrap(),
    )
}

pub fn posted_transactions(ledger: &FakeLedger) -> usize {
    ledger
        .requests()
        .iter()
        .filter(|(_, path)| path == "/v2/transactions")
        .count()
}

/// A wallet holding the test signing key.
pub struct TestWallet;

#[async_trait]
impl WalletSigner for TestWallet {
    async fn sign(&self, transaction: &Transaction) -> Result<SignedTransaction, String> {
        Ok(sign_with_test_key(transaction))
    }
}
