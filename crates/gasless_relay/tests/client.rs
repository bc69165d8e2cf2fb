mod common;

use actix_web::{App, HttpServer, web};
use async_trait::async_trait;
use common::{RelayFixture, TestWallet, USER_FUNDS, payment, receiver};
use gasless_http_client::{HttpClient, HttpError, HttpMethod, HttpResponse};
use gasless_relay::server::configure;
use gasless_relay::{
    Action, FallbackPolicy, GaslessClient, PaidSubmitter, SponsorError, SponsorshipReceipt,
};
use gasless_transact::test_utils::AccountMother;
use gasless_transact::Address;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A relay that answers every request with the same failure.
struct FailingRelay(HttpError);

#[async_trait]
impl HttpClient for FailingRelay {
    async fn request(
        &self,
        _method: HttpMethod,
        _path: String,
        _query: Option<HashMap<String, String>>,
        _body: Option<Vec<u8>>,
        _headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, HttpError> {
        Err(self.0.clone())
    }
}

fn relay_error(status: u16, kind: &str) -> FailingRelay {
    FailingRelay(HttpError::StatusError {
        status,
        message: serde_json::json!({"success": false, "error": "nope", "kind": kind}).to_string(),
    })
}

#[derive(Default)]
struct CountingPaidPath {
    calls: AtomicUsize,
}

#[async_trait]
impl PaidSubmitter for CountingPaidPath {
    async fn submit_paid(
        &self,
        _action: &Action,
        _user: &Address,
    ) -> Result<SponsorshipReceipt, SponsorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SponsorshipReceipt {
            tx_id: "PAID".to_string(),
            confirmed_round: 1,
            gasless: true,
            explorer_url: None,
            group_id: None,
            sponsor_tx_id: None,
        })
    }
}

fn user() -> Address {
    AccountMother::signer().address()
}

#[tokio::test]
async fn test_disallowed_fallback_surfaces_configuration_error() {
    let client = GaslessClient::new(
        Arc::new(relay_error(503, "ConfigurationError")),
        FallbackPolicy::Disallow,
    );
    let error = client
        .execute(&payment(5000), &user(), &TestWallet)
        .await
        .unwrap_err();
    assert!(matches!(error, SponsorError::ConfigurationError { .. }));
}

#[tokio::test]
async fn test_allowed_fallback_runs_paid_path_and_marks_it() {
    let paid = Arc::new(CountingPaidPath::default());
    let client = GaslessClient::new(
        Arc::new(relay_error(503, "ConfigurationError")),
        FallbackPolicy::AllowPaidFallback(paid.clone()),
    );
    let receipt = client
        .execute(&payment(5000), &user(), &TestWallet)
        .await
        .unwrap();
    assert_eq!(receipt.tx_id, "PAID");
    assert!(!receipt.gasless);
    assert_eq!(paid.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fallback_is_not_used_for_other_failures() {
    let paid = Arc::new(CountingPaidPath::default());
    for relay in [
        relay_error(400, "ValidationError"),
        relay_error(502, "LedgerRejectionError"),
        FailingRelay(HttpError::RequestError {
            message: "connection refused".to_string(),
        }),
    ] {
        let client = GaslessClient::new(
            Arc::new(relay),
            FallbackPolicy::AllowPaidFallback(paid.clone()),
        );
        let error = client
            .execute(&payment(5000), &user(), &TestWallet)
            .await
            .unwrap_err();
        assert!(!matches!(error, SponsorError::ConfigurationError { .. }));
    }
    assert_eq!(paid.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_timeout_error_is_rebuilt_with_tx_id() {
    let client = GaslessClient::new(
        Arc::new(FailingRelay(HttpError::StatusError {
            status: 504,
            message: serde_json::json!({
                "success": false,
                "error": "unconfirmed after 10 rounds",
                "kind": "TimedOut",
                "txId": "TXID"
            })
            .to_string(),
        })),
        FallbackPolicy::Disallow,
    );
    let error = client.status("TXID").await.unwrap_err();
    assert_eq!(error.tx_id(), Some("TXID"));
    assert_eq!(error.message(), "unconfirmed after 10 rounds");
}

#[actix_web::test]
async fn test_end_to_end_against_a_running_relay() {
    let fixture = RelayFixture::new();
    let relay = web::Data::from(fixture.relay.clone());
    let server = HttpServer::new(move || App::new().app_data(relay.clone()).configure(configure))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let port = server.addrs()[0].port();
    let handle = server.run();
    let server_handle = handle.handle();
    actix_web::rt::spawn(handle);

    let client = GaslessClient::from_url(&format!("http://127.0.0.1:{port}"), FallbackPolicy::Disallow);
    assert_eq!(client.sponsor_address().await.unwrap(), fixture.sponsor);

    let receipt = client
        .execute(&payment(5000), &fixture.user, &TestWallet)
        .await
        .unwrap();
    assert!(receipt.gasless);
    assert_eq!(fixture.ledger.balance(&fixture.user), USER_FUNDS - 5000);
    assert_eq!(fixture.ledger.balance(&receiver()), 5000);

    let requeried = client.status(&receipt.tx_id).await.unwrap();
    assert_eq!(requeried.confirmed_round, receipt.confirmed_round);

    server_handle.stop(true).await;
}
