//! Relay configuration, read from the environment and an optional `.env` file.

use crate::error::SponsorError;
use derive_more::Debug;
use gasless_algod::AlgoClientConfig;
use std::env;
use std::str::FromStr;

pub const DEFAULT_BIND: &str = "0.0.0.0:5001";
pub const DEFAULT_EXPLORER_BASE_URL: &str = "https://testnet.explorer.perawallet.app/tx";
pub const DEFAULT_CONFIRMATION_ROUNDS: u64 = 10;
pub const MAX_CONFIRMATION_ROUNDS: u64 = 1000;
pub const DEFAULT_VALIDITY_WINDOW: u64 = 1000;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub algod: AlgoClientConfig,

    /// 25-word sponsor mnemonic. `None` runs the relay with sponsorship disabled.
    #[debug(skip)]
    pub sponsor_mnemonic: Option<String>,

    /// Address the HTTP server listens on.
    pub bind: String,

    /// Transaction IDs are appended to this to form explorer links.
    pub explorer_base_url: String,

    /// Default number of rounds to wait for confirmation.
    pub confirmation_rounds: u64,

    /// Rounds between first and last validity of built transactions.
    pub validity_window: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            algod: AlgoClientConfig::localnet(),
            sponsor_mnemonic: None,
            bind: DEFAULT_BIND.to_string(),
            explorer_base_url: DEFAULT_EXPLORER_BASE_URL.to_string(),
            confirmation_rounds: DEFAULT_CONFIRMATION_ROUNDS,
            validity_window: DEFAULT_VALIDITY_WINDOW,
        }
    }
}

impl RelayConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, SponsorError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SponsorError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = RelayConfig::default();

        let confirmation_rounds = parse_or(
            "CONFIRMATION_ROUNDS",
            non_empty("CONFIRMATION_ROUNDS"),
            defaults.confirmation_rounds,
        )?;
        if confirmation_rounds == 0 || confirmation_rounds > MAX_CONFIRMATION_ROUNDS {
            return Err(SponsorError::ConfigurationError {
                message: format!(
                    "CONFIRMATION_ROUNDS must be between 1 and {MAX_CONFIRMATION_ROUNDS}, got {confirmation_rounds}"
                ),
            });
        }

        let validity_window = parse_or(
            "VALIDITY_WINDOW",
            non_empty("VALIDITY_WINDOW"),
            defaults.validity_window,
        )?;
        if validity_window == 0 {
            return Err(SponsorError::ConfigurationError {
                message: "VALIDITY_WINDOW must be at least 1".to_string(),
            });
        }

        Ok(RelayConfig {
            algod: AlgoClientConfig::from_lookup(&lookup)?,
            sponsor_mnemonic: non_empty("SPONSOR_MNEMONIC")
                .or_else(|| non_empty("ALGORAND_SPONSOR_MNEMONIC")),
            bind: non_empty("RELAY_BIND").unwrap_or(defaults.bind),
            explorer_base_url: non_empty("EXPLORER_BASE_URL").unwrap_or(defaults.explorer_base_url),
            confirmation_rounds,
            validity_window,
        })
    }
}

fn parse_or<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, SponsorError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SponsorError::ConfigurationError {
                message: format!("{name} must be a number, got '{raw}'"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_target_localnet_without_sponsor() {
        let config = RelayConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.algod, AlgoClientConfig::localnet());
        assert_eq!(config.sponsor_mnemonic, None);
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.confirmation_rounds, 10);
        assert_eq!(config.validity_window, 1000);
    }

    #[test]
    fn test_reads_overrides_and_mnemonic_alias() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("ALGOD_SERVER", "https://testnet-api.algonode.cloud"),
            ("ALGOD_PORT", "443"),
            ("ALGORAND_SPONSOR_MNEMONIC", "word word"),
            ("RELAY_BIND", "127.0.0.1:8080"),
            ("CONFIRMATION_ROUNDS", "25"),
        ]))
        .unwrap();
        assert_eq!(config.algod, AlgoClientConfig::algonode("testnet"));
        assert_eq!(config.sponsor_mnemonic.as_deref(), Some("word word"));
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.confirmation_rounds, 25);
    }

    #[test]
    fn test_primary_mnemonic_wins_over_alias() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("SPONSOR_MNEMONIC", "primary"),
            ("ALGORAND_SPONSOR_MNEMONIC", "alias"),
        ]))
        .unwrap();
        assert_eq!(config.sponsor_mnemonic.as_deref(), Some("primary"));
    }

    #[test]
    fn test_bad_numbers_are_configuration_errors() {
        let error =
            RelayConfig::from_lookup(lookup_from(&[("CONFIRMATION_ROUNDS", "ten")])).unwrap_err();
        assert!(matches!(error, SponsorError::ConfigurationError { .. }));

        let error =
            RelayConfig::from_lookup(lookup_from(&[("CONFIRMATION_ROUNDS", "5000")])).unwrap_err();
        assert!(matches!(error, SponsorError::ConfigurationError { .. }));
    }

    #[test]
    fn test_bad_algod_port_is_a_configuration_error() {
        let error = RelayConfig::from_lookup(lookup_from(&[
            ("ALGOD_SERVER", "https://node.example"),
            ("ALGOD_PORT", "44o1"),
        ]))
        .unwrap_err();
        assert!(matches!(error, SponsorError::ConfigurationError { .. }), "{error:?}");
        assert!(error.message().contains("ALGOD_PORT"));
    }

    #[test]
    fn test_debug_redacts_mnemonic() {
        let config = RelayConfig {
            sponsor_mnemonic: Some("secret words".to_string()),
            ..RelayConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret words"));
        assert!(printed.contains("explorer_base_url"));
    }
}
