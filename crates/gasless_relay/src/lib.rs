mod builder;
pub mod client;
mod config;
mod error;
mod pipeline;
mod receipt;
pub mod server;
mod sponsor;

pub use builder::{
    Action, AppArg, AppCallParams, AssetCreateParams, GroupBuilder, PaymentParams,
    SponsoredGroup, sponsor_fee,
};
pub use client::{FallbackPolicy, GaslessClient, PaidSubmitter, UnsignedGroup, WalletSigner};
pub use config::{
    DEFAULT_BIND, DEFAULT_CONFIRMATION_ROUNDS, DEFAULT_EXPLORER_BASE_URL,
    DEFAULT_VALIDITY_WINDOW, MAX_CONFIRMATION_ROUNDS, RelayConfig,
};
pub use error::{ErrorKind, SponsorError};
pub use pipeline::{Relay, Stage};
pub use receipt::{SponsorshipReceipt, explorer_url};
pub use sponsor::{
    BalanceInfo, GeneratedSponsor, SponsorAccount, SponsorAccountManager, verify_signature,
};

#[cfg(feature = "test_utils")]
pub mod testing;
