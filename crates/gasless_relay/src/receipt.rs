use serde::{Deserialize, Serialize};

/// Proof that a sponsored group was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipReceipt {
    /// ID of the user's transaction.
    pub tx_id: String,
    pub confirmed_round: u64,
    /// `false` only when the client fell back to paying its own fee.
    pub gasless: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    /// Base64 ID of the sponsored group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor_tx_id: Option<String>,
}

/// Joins an explorer base URL and a transaction ID.
pub fn explorer_url(base: &str, tx_id: &str) -> Option<String> {
    let base = base.trim().trim_end_matches('/');
    (!base.is_empty()).then(|| format!("{base}/{tx_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_explorer_url() {
        assert_eq!(
            explorer_url("https://testnet.explorer.perawallet.app/tx/", "ABC").as_deref(),
            Some("https://testnet.explorer.perawallet.app/tx/ABC")
        );
        assert_eq!(explorer_url("", "ABC"), None);
    }

    #[test]
    fn test_receipt_json_is_camel_case() {
        let receipt = SponsorshipReceipt {
            tx_id: "ABC".to_string(),
            confirmed_round: 7,
            gasless: true,
            explorer_url: None,
            group_id: None,
            sponsor_tx_id: None,
        };
        assert_eq!(
            serde_json::to_value(&receipt).unwrap(),
            serde_json::json!({"txId": "ABC", "confirmedRound": 7, "gasless": true})
        );
    }
}
