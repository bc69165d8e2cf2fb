use crate::{AlgodClient, AlgodError};
use async_trait::async_trait;
use gasless_http_client::{HttpClient, HttpError, HttpMethod, HttpResponse};
use gasless_transact::Address;
use pretty_assertions::assert_eq;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

type Reply = Result<String, HttpError>;

/// Replays scripted replies per path and records every request it sees.
#[derive(Default)]
struct ScriptedHttpClient {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<(HttpMethod, String)>>,
}

impl ScriptedHttpClient {
    fn reply(self, path: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    fn requests(&self) -> Vec<(HttpMethod, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn request(
        &self,
        method: HttpMethod,
        path: String,
        _query: Option<HashMap<String, String>>,
        _body: Option<Vec<u8>>,
        _headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push((method, path.clone()));
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(&path).expect("unexpected request");
        // The last reply for a path repeats forever
        let reply = match queue.len() {
            1 => queue.front().cloned(),
            _ => queue.pop_front(),
        }
        .expect("no reply scripted");

        reply.map(|body| HttpResponse {
            body: body.into_bytes(),
            headers: HashMap::new(),
        })
    }
}

fn client(http: ScriptedHttpClient) -> (AlgodClient, Arc<ScriptedHttpClient>) {
    let http = Arc::new(http);
    (AlgodClient::new(http.clone()), http)
}

const TX_ID: &str = "TZM3P4ZL4DLIEZ3WOEP67MQ6JITTO4D3NJN3RCA5YDBC3V4LA5LA";

fn pending_path() -> String {
    format!("/v2/transactions/pending/{TX_ID}")
}

#[tokio::test]
async fn test_transaction_params() {
    let (algod, _) = client(ScriptedHttpClient::default().reply(
        "/v2/transactions/params",
        Ok(r#"{
            "consensus-version": "future",
            "fee": 0,
            "genesis-hash": "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=",
            "genesis-id": "testnet-v1.0",
            "last-round": 1000,
            "min-fee": 1000
        }"#
        .to_string()),
    ));

    let params = algod.transaction_params().await.unwrap();
    assert_eq!(params.min_fee, 1000);
    assert_eq!(params.last_round, 1000);
    assert_eq!(params.genesis_hash_bytes().unwrap().len(), 32);
}

#[tokio::test]
async fn test_raw_transaction_rejection_keeps_node_message() {
    let (algod, _) = client(ScriptedHttpClient::default().reply(
        "/v2/transactions",
        Err(HttpError::StatusError {
            status: 400,
            message: r#"{"message":"TransactionPool.Remember: transaction already in ledger"}"#
                .to_string(),
        }),
    ));

    let err = algod.raw_transaction(vec![1, 2, 3]).await.unwrap_err();
    match err {
        AlgodError::Rejected { message } => {
            assert_eq!(message, "TransactionPool.Remember: transaction already in ledger")
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_account_information_uses_address_path() {
    let address: Address = "JB3K6HTAXODO4THESLNYTSG6GQUFNEVIQG7A6ZYVDACR6WA3ZF52TKU5NA"
        .parse()
        .unwrap();
    let path = format!("/v2/accounts/{address}");
    let (algod, _) = client(ScriptedHttpClient::default().reply(
        &path,
        Ok(format!(
            r#"{{"address":"{address}","amount":5000000,"min-balance":100000,"round":12}}"#
        )),
    ));

    let info = algod.account_information(&address).await.unwrap();
    assert_eq!((info.amount, info.min_balance), (5_000_000, 100_000));
}

#[tokio::test]
async fn test_wait_for_confirmation_after_unknown_and_pending_rounds() {
    let (algod, http) = client(
        ScriptedHttpClient::default()
            .reply("/v2/status", Ok(r#"{"last-round":99}"#.to_string()))
            .reply(
                &pending_path(),
                Err(HttpError::StatusError {
                    status: 404,
                    message: "txn not found".to_string(),
                }),
            )
            .reply(&pending_path(), Ok(r#"{"pool-error":""}"#.to_string()))
            .reply(
                &pending_path(),
                Ok(r#"{"confirmed-round":102,"pool-error":""}"#.to_string()),
            )
            .reply(
                "/v2/status/wait-for-block-after/100",
                Ok(r#"{"last-round":101}"#.to_string()),
            )
            .reply(
                "/v2/status/wait-for-block-after/101",
                Ok(r#"{"last-round":102}"#.to_string()),
            ),
    );

    let confirmed = algod.wait_for_confirmation(TX_ID, 5).await.unwrap();
    assert_eq!(confirmed.confirmed_round, Some(102));
    assert_eq!(
        http.requests()
            .iter()
            .filter(|(_, path)| path.starts_with("/v2/status/wait-for-block-after"))
            .count(),
        2
    );
}

#[tokio::test]
async fn test_wait_for_confirmation_pool_error_is_a_rejection() {
    let (algod, _) = client(
        ScriptedHttpClient::default()
            .reply("/v2/status", Ok(r#"{"last-round":10}"#.to_string()))
            .reply(
                &pending_path(),
                Ok(r#"{"pool-error":"overspend"}"#.to_string()),
            ),
    );

    let err = algod.wait_for_confirmation(TX_ID, 3).await.unwrap_err();
    assert!(matches!(err, AlgodError::Rejected { .. }), "{err:?}");
    assert!(err.to_string().contains("overspend"));
}

#[tokio::test]
async fn test_wait_for_confirmation_respects_round_budget() {
    let mut http = ScriptedHttpClient::default()
        .reply("/v2/status", Ok(r#"{"last-round":10}"#.to_string()))
        .reply(&pending_path(), Ok(r#"{"pool-error":""}"#.to_string()));
    for round in 11..14 {
        http = http.reply(
            &format!("/v2/status/wait-for-block-after/{round}"),
            Ok(format!(r#"{{"last-round":{}}}"#, round + 1)),
        );
    }
    let (algod, http) = client(http);

    let err = algod.wait_for_confirmation(TX_ID, 3).await.unwrap_err();
    match err {
        AlgodError::MaxWaitRoundExpired { tx_id, max_rounds } => {
            assert_eq!((tx_id.as_str(), max_rounds), (TX_ID, 3));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    let polls = http
        .requests()
        .iter()
        .filter(|(_, path)| path == &pending_path())
        .count();
    assert_eq!(polls, 3);
}

#[tokio::test]
async fn test_wait_for_confirmation_transport_failure() {
    let (algod, _) = client(ScriptedHttpClient::default().reply(
        "/v2/status",
        Err(HttpError::RequestError {
            message: "connection reset".to_string(),
        }),
    ));

    let err = algod.wait_for_confirmation(TX_ID, 3).await.unwrap_err();
    assert!(matches!(err, AlgodError::Unavailable { .. }), "{err:?}");
}
