use crate::error::AlgodError;

pub const LOCALNET_TOKEN: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Config for an algod client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgoClientConfig {
    /// Base URL of the server e.g. http://localhost, https://testnet-api.algonode.cloud, etc.
    pub server: String,
    /// Port, appended to `server` when present.
    pub port: Option<u16>,
    /// Sent as `X-Algo-API-Token` when present.
    pub token: Option<String>,
}

impl AlgoClientConfig {
    /// Reads `ALGOD_SERVER`, `ALGOD_PORT` and `ALGOD_TOKEN` through `lookup`, falling back to
    /// LocalNet when `ALGOD_SERVER` is not set. A port that is not a number is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AlgodError> {
        let Some(server) = lookup("ALGOD_SERVER").filter(|server| !server.is_empty()) else {
            return Ok(Self::localnet());
        };
        let port = match lookup("ALGOD_PORT").filter(|port| !port.trim().is_empty()) {
            Some(port) => Some(port.trim().parse::<u16>().map_err(|_| {
                AlgodError::InvalidConfiguration {
                    message: format!("ALGOD_PORT must be a port number, got '{port}'"),
                }
            })?),
            None => None,
        };
        Ok(AlgoClientConfig {
            server,
            port,
            token: lookup("ALGOD_TOKEN").filter(|t| !t.is_empty()),
        })
    }

    pub fn localnet() -> Self {
        AlgoClientConfig {
            server: "http://localhost".to_string(),
            port: Some(4001),
            token: Some(LOCALNET_TOKEN.to_string()),
        }
    }

    /// Free public endpoints, e.g. `algonode("testnet")`.
    pub fn algonode(network: &str) -> Self {
        AlgoClientConfig {
            server: format!("https://{}-api.algonode.cloud", network),
            port: Some(443),
            token: None,
        }
    }

    pub fn base_url(&self) -> String {
        let server = self.server.trim_end_matches('/');
        match self.port {
            Some(port) => format!("{}:{}", server, port),
            None => server.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_base_url() {
        assert_eq!(AlgoClientConfig::localnet().base_url(), "http://localhost:4001");
        assert_eq!(
            AlgoClientConfig::algonode("testnet").base_url(),
            "https://testnet-api.algonode.cloud:443"
        );
        let bare = AlgoClientConfig {
            server: "https://node.example/".to_string(),
            port: None,
            token: None,
        };
        assert_eq!(bare.base_url(), "https://node.example");
    }

    #[test]
    fn test_from_lookup() {
        let vars = HashMap::from([
            ("ALGOD_SERVER", "https://testnet-api.algonode.cloud"),
            ("ALGOD_PORT", "443"),
            ("ALGOD_TOKEN", ""),
        ]);
        let config =
            AlgoClientConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config, AlgoClientConfig::algonode("testnet"));

        let empty = AlgoClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(empty, AlgoClientConfig::localnet());
    }

    #[test]
    fn test_unparseable_port_is_rejected() {
        let vars = HashMap::from([("ALGOD_SERVER", "https://node.example"), ("ALGOD_PORT", "44o1")]);
        let error = AlgoClientConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap_err();
        assert!(matches!(error, AlgodError::InvalidConfiguration { .. }), "{error:?}");
        assert!(error.to_string().contains("44o1"));
    }
}
