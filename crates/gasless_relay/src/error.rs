//! The error taxonomy surfaced to relay callers.
//!
//! Each variant calls for a different reaction from the client: fix the input, rebuild the
//! group, retry later, or re-query by transaction ID. [`SponsorError::kind`] gives the stable
//! name used on the wire so clients can branch on it without parsing messages.

use derive_more::Display;
use gasless_algod::AlgodError;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum SponsorError {
    /// The sponsor is not initialized or its secret is invalid.
    #[snafu(display("Sponsor not configured: {message}"))]
    ConfigurationError { message: String },

    /// Malformed input, sender mismatch, group mismatch or wrong fee.
    #[snafu(display("Invalid sponsorship request: {message}"))]
    ValidationError { message: String },

    /// The sponsor key was asked to sign a transaction it does not send.
    #[snafu(display("Refusing to sign: {message}"))]
    SigningError { message: String },

    /// The node could not be reached or did not answer sensibly.
    #[snafu(display("Ledger unavailable: {message}"))]
    LedgerUnavailableError { message: String },

    /// The node answered and refused the transaction group.
    #[snafu(display("Ledger rejected the transaction: {message}"))]
    LedgerRejectionError { message: String },

    /// The group was broadcast but not seen confirmed within the round budget.
    #[snafu(display("Transaction {tx_id} not confirmed yet: {message}"))]
    TimedOut { tx_id: String, message: String },
}

/// Stable, machine readable names of the error variants.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigurationError,
    ValidationError,
    SigningError,
    LedgerUnavailableError,
    LedgerRejectionError,
    TimedOut,
}

impl SponsorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SponsorError::ConfigurationError { .. } => ErrorKind::ConfigurationError,
            SponsorError::ValidationError { .. } => ErrorKind::ValidationError,
            SponsorError::SigningError { .. } => ErrorKind::SigningError,
            SponsorError::LedgerUnavailableError { .. } => ErrorKind::LedgerUnavailableError,
            SponsorError::LedgerRejectionError { .. } => ErrorKind::LedgerRejectionError,
            SponsorError::TimedOut { .. } => ErrorKind::TimedOut,
        }
    }

    /// The message without the variant's prefix.
    pub fn message(&self) -> &str {
        match self {
            SponsorError::ConfigurationError { message }
            | SponsorError::ValidationError { message }
            | SponsorError::SigningError { message }
            | SponsorError::LedgerUnavailableError { message }
            | SponsorError::LedgerRejectionError { message }
            | SponsorError::TimedOut { message, .. } => message,
        }
    }

    /// The transaction ID a caller should keep for re-querying, if any.
    pub fn tx_id(&self) -> Option<&str> {
        match self {
            SponsorError::TimedOut { tx_id, .. } => Some(tx_id),
            _ => None,
        }
    }

    /// Rebuilds an error from its wire form.
    pub fn from_kind(kind: ErrorKind, message: String, tx_id: Option<String>) -> Self {
        match kind {
            ErrorKind::ConfigurationError => SponsorError::ConfigurationError { message },
            ErrorKind::ValidationError => SponsorError::ValidationError { message },
            ErrorKind::SigningError => SponsorError::SigningError { message },
            ErrorKind::LedgerUnavailableError => SponsorError::LedgerUnavailableError { message },
            ErrorKind::LedgerRejectionError => SponsorError::LedgerRejectionError { message },
            ErrorKind::TimedOut => SponsorError::TimedOut {
                tx_id: tx_id.unwrap_or_default(),
                message,
            },
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        SponsorError::ValidationError {
            message: message.into(),
        }
    }

    pub(crate) fn not_configured(reason: &str) -> Self {
        SponsorError::ConfigurationError {
            message: reason.to_string(),
        }
    }
}

impl From<AlgodError> for SponsorError {
    fn from(error: AlgodError) -> Self {
        match error {
            AlgodError::Rejected { message } => SponsorError::LedgerRejectionError { message },
            AlgodError::InvalidConfiguration { message } => {
                SponsorError::ConfigurationError { message }
            }
            AlgodError::MaxWaitRoundExpired { tx_id, max_rounds } => SponsorError::TimedOut {
                tx_id,
                message: format!("unconfirmed after {max_rounds} rounds, re-query by transaction ID"),
            },
            other @ (AlgodError::Unavailable { .. }
            | AlgodError::NotFound { .. }
            | AlgodError::InvalidResponse { .. }) => SponsorError::LedgerUnavailableError {
                message: other.to_string(),
            },
        }
    }
}
