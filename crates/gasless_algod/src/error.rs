use gasless_http_client::HttpError;
use snafu::Snafu;

/// Errors returned by the algod client.
///
/// The split between [`AlgodError::Unavailable`] and [`AlgodError::Rejected`] matters to callers:
/// the first means the node could not be reached or did not answer sensibly, the second means
/// the node answered and refused what was asked of it.
#[derive(Debug, Snafu)]
pub enum AlgodError {
    #[snafu(display("Algod unavailable: {message}"))]
    Unavailable { message: String },

    #[snafu(display("Algod rejected the request: {message}"))]
    Rejected { message: String },

    #[snafu(display("Not found: {message}"))]
    NotFound { message: String },

    #[snafu(display("Invalid algod response: {message}"))]
    InvalidResponse { message: String },

    #[snafu(display("Transaction {tx_id} unconfirmed after {max_rounds} rounds"))]
    MaxWaitRoundExpired { tx_id: String, max_rounds: u64 },

    #[snafu(display("Invalid algod configuration: {message}"))]
    InvalidConfiguration { message: String },
}

impl AlgodError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AlgodError::NotFound { .. })
    }
}

impl From<HttpError> for AlgodError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::RequestError { message } => AlgodError::Unavailable { message },
            HttpError::StatusError { status, message } => {
                let message = node_message(&message);
                match status {
                    404 => AlgodError::NotFound { message },
                    401 | 403 => AlgodError::Unavailable {
                        message: format!("node refused access ({status}): {message}"),
                    },
                    400..=499 => AlgodError::Rejected { message },
                    _ => AlgodError::Unavailable {
                        message: format!("node returned {status}: {message}"),
                    },
                }
            }
        }
    }
}

/// Algod wraps errors as `{"message": "..."}`; unwrap it when present.
fn node_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::transport(HttpError::RequestError { message: "connection refused".into() }, "Unavailable")]
    #[case::bad_request(HttpError::StatusError { status: 400, message: r#"{"message":"overspend"}"#.into() }, "Rejected")]
    #[case::not_found(HttpError::StatusError { status: 404, message: "".into() }, "NotFound")]
    #[case::unauthorized(HttpError::StatusError { status: 401, message: "".into() }, "Unavailable")]
    #[case::server_error(HttpError::StatusError { status: 503, message: "".into() }, "Unavailable")]
    fn test_http_error_classification(#[case] error: HttpError, #[case] expected: &str) {
        let error = AlgodError::from(error);
        assert!(
            format!("{error:?}").starts_with(expected),
            "{error:?} is not {expected}"
        );
    }

    #[test]
    fn test_node_message_is_unwrapped() {
        let error = AlgodError::from(HttpError::StatusError {
            status: 400,
            message: r#"{"message":"TransactionPool.Remember: overspend"}"#.to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Algod rejected the request: TransactionPool.Remember: overspend"
        );
    }
}
