//! The relay's HTTP surface.
//!
//! Failures are always reported with a non-2xx status and a body of the form
//! `{"success": false, "error": "...", "kind": "...", "txId": "..."}`.

use crate::builder::Action;
use crate::error::{ErrorKind, SponsorError};
use crate::pipeline::Relay;
use crate::receipt::SponsorshipReceipt;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, get, post, web};
use base64::{Engine, prelude::BASE64_STANDARD};
use gasless_transact::{Address, AlgorandMsgpack, Transaction};
use log::info;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, base64::Base64, serde_as};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
}

impl ResponseError for SponsorError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::ValidationError | ErrorKind::SigningError => StatusCode::BAD_REQUEST,
            ErrorKind::ConfigurationError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::LedgerUnavailableError | ErrorKind::LedgerRejectionError => {
                StatusCode::BAD_GATEWAY
            }
            ErrorKind::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            error: self.message().to_string(),
            kind: self.kind(),
            tx_id: self.tx_id().map(str::to_string),
        })
    }
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    #[serde(flatten)]
    pub action: Action,
    #[serde_as(as = "DisplayFromStr")]
    pub user_address: Address,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    /// Base64 msgpack of the user's half, to be signed by the wallet.
    pub user_txn_unsigned: String,
    pub sponsor_txn_unsigned: String,
    pub group_id: String,
    pub sponsor_address: String,
    pub sponsor_fee: u64,
    pub min_fee: u64,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde_as(as = "Base64")]
    pub signed_user_txn: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub unsigned_sponsor_txn: Vec<u8>,
    #[serde(default)]
    pub max_rounds_to_wait: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: SponsorshipReceipt,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    #[serde(default)]
    pub max_rounds_to_wait: Option<u64>,
}

#[get("/sponsor/address")]
async fn sponsor_address(relay: web::Data<Relay>) -> Result<HttpResponse, SponsorError> {
    let address = relay.sponsor_address()?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "address": address.to_string() })))
}

#[get("/sponsor/info")]
async fn sponsor_info(relay: web::Data<Relay>) -> Result<HttpResponse, SponsorError> {
    if !relay.sponsor().is_configured() {
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "configured": false })));
    }
    let (address, balance) = relay.sponsor_info().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "configured": true,
        "address": address.to_string(),
        "balance": balance.balance,
        "minBalance": balance.min_balance,
        "availableForFees": balance.available_for_fees,
    })))
}

#[post("/sponsor/build")]
async fn build(
    relay: web::Data<Relay>,
    body: web::Json<BuildRequest>,
) -> Result<HttpResponse, SponsorError> {
    let request = body.into_inner();
    let group = relay.build(&request.action, &request.user_address).await?;
    let encode = |txn: &Transaction| {
        txn.encode_raw()
            .map(|bytes| BASE64_STANDARD.encode(bytes))
            .map_err(|e| SponsorError::validation(e.to_string()))
    };

    Ok(HttpResponse::Ok().json(BuildResponse {
        user_txn_unsigned: encode(&group.user_txn)?,
        sponsor_txn_unsigned: encode(&group.sponsor_txn)?,
        group_id: BASE64_STANDARD.encode(group.group_id),
        sponsor_address: group.sponsor_txn.sender().to_string(),
        sponsor_fee: group.sponsor_fee(),
        min_fee: group.min_fee,
    }))
}

#[post("/sponsor/submit")]
async fn submit(
    relay: web::Data<Relay>,
    body: web::Json<SubmitRequest>,
) -> Result<HttpResponse, SponsorError> {
    let request = body.into_inner();
    let receipt = relay
        .submit(
            &request.signed_user_txn,
            &request.unsigned_sponsor_txn,
            request.max_rounds_to_wait,
        )
        .await?;
    info!(
        "Sponsored {} confirmed in round {}",
        receipt.tx_id, receipt.confirmed_round
    );
    Ok(HttpResponse::Ok().json(SubmitResponse {
        success: true,
        receipt,
    }))
}

#[get("/sponsor/status/{tx_id}")]
async fn status(
    relay: web::Data<Relay>,
    tx_id: web::Path<String>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, SponsorError> {
    let receipt = relay.requery(&tx_id, query.max_rounds_to_wait).await?;
    Ok(HttpResponse::Ok().json(SubmitResponse {
        success: true,
        receipt,
    }))
}

#[get("/health")]
async fn health(relay: web::Data<Relay>) -> HttpResponse {
    let address = relay.sponsor_address().ok().map(ToString::to_string);
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "gaslessEnabled": address.is_some(),
        "sponsorAddress": address,
    }))
}

/// Registers every relay route along with JSON and query error handling.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| SponsorError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| SponsorError::validation(err.to_string()).into()),
    )
    .service(sponsor_address)
    .service(sponsor_info)
    .service(build)
    .service(submit)
    .service(status)
    .service(health);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case::validation(SponsorError::ValidationError { message: "bad".into() }, 400)]
    #[case::signing(SponsorError::SigningError { message: "bad".into() }, 400)]
    #[case::configuration(SponsorError::ConfigurationError { message: "off".into() }, 503)]
    #[case::unavailable(SponsorError::LedgerUnavailableError { message: "down".into() }, 502)]
    #[case::rejection(SponsorError::LedgerRejectionError { message: "overspend".into() }, 502)]
    #[case::timeout(SponsorError::TimedOut { tx_id: "ID".into(), message: "slow".into() }, 504)]
    fn test_status_codes(#[case] error: SponsorError, #[case] expected: u16) {
        assert_eq!(error.status_code().as_u16(), expected);
    }

    #[actix_web::test]
    async fn test_timeout_body_keeps_tx_id() {
        let error = SponsorError::TimedOut {
            tx_id: "TXID".into(),
            message: "unconfirmed".into(),
        };
        let body = to_bytes(error.error_response().into_body()).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert!(!body.success);
        assert_eq!(body.kind, ErrorKind::TimedOut);
        assert_eq!(body.tx_id.as_deref(), Some("TXID"));
    }
}
