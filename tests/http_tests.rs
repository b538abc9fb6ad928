#![cfg(feature = "pipeline")]

//! HTTP clients against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use idsweep::core::*;
use idsweep::validator::*;
use serde_json::json;
use wiremock::matchers::{body_json, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_probe() -> HttpProbe {
    HttpProbe::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap()
}

// ---------------------------------------------------------------------------
// URL probe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn probe_reports_final_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .and(header_regex("user-agent", "Firefox/"))
        .and(header_regex("accept", "^text/html,application/xhtml\\+xml"))
        .and(header_regex("accept-language", "^en-US"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/ok", server.uri())),
        )
        .mount(&server)
        .await;

    let probe = http_probe();
    assert_eq!(probe.probe(&format!("{}/ok", server.uri())).await, Ok(200));
    assert_eq!(probe.probe(&format!("{}/forbidden", server.uri())).await, Ok(403));
    assert_eq!(probe.probe(&format!("{}/moved", server.uri())).await, Ok(200));
    // unmatched paths get wiremock's 404
    assert_eq!(probe.probe(&format!("{}/missing", server.uri())).await, Ok(404));
}

#[tokio::test]
async fn probe_connection_refused_is_transport_error() {
    let outcome = http_probe().probe("http://127.0.0.1:1/").await;
    assert!(matches!(outcome, Err(ProbeError::Transport(_))));
    let (status, message) = probe_outcome(outcome);
    assert_eq!(status, Status::Check);
    assert!(!message.is_empty());
}

#[tokio::test]
async fn probe_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(DEFAULT_USER_AGENT, Duration::from_millis(100)).unwrap();
    let outcome = probe.probe(&server.uri()).await;
    assert!(outcome.is_err());
}

// ---------------------------------------------------------------------------
// VAT API
// ---------------------------------------------------------------------------

async fn mount_account(server: &MockServer, limit: u64, consumed: u64) {
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(query_param("access_key", "secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"limit": limit, "consumed": consumed})),
        )
        .mount(server)
        .await;
}

fn api(server: &MockServer) -> HttpVatApi {
    HttpVatApi::new(format!("{}/", server.uri()), "secret").unwrap()
}

#[tokio::test]
async fn account_status() {
    let server = MockServer::start().await;
    mount_account(&server, 1000, 250).await;

    let status = api(&server).account_status().await.unwrap();
    assert_eq!(status, AccountStatus { limit: 1000, consumed: 250 });
    assert!(!status.is_exhausted());
}

#[tokio::test]
async fn non_success_http_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid access key"))
        .mount(&server)
        .await;

    let err = api(&server).account_status().await.unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"VAT API error 401: invalid access key");
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = api(&server).account_status().await.unwrap_err();
    assert!(matches!(err, VatApiError::Parse(_)));
}

#[tokio::test]
async fn submit_sends_ids_and_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch"))
        .and(query_param("access_key", "secret"))
        .and(body_json(json!({"vat_numbers": ["DE136695976", "ATU13585627"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let token = api(&server)
        .submit_batch(&["DE136695976".into(), "ATU13585627".into()])
        .await
        .unwrap();
    assert_eq!(token, "abc123");
}

#[tokio::test]
async fn submit_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"code": 104, "info": "usage limit reached"}
        })))
        .mount(&server)
        .await;

    let err = api(&server)
        .submit_batch(&["DE136695976".into()])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        VatApiError::Api {
            code: 104,
            info: "usage limit reached".into()
        }
    );
}

#[tokio::test]
async fn poll_processing_then_complete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batch/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"code": 2001, "info": "batch still processing"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/batch/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "batch": {"errors": [], "results": [{
                "country_code": "DE",
                "vat_number": "136695976",
                "valid": true,
                "company_name": "---"
            }]}
        })))
        .mount(&server)
        .await;

    let client = api(&server);
    assert_eq!(client.poll_batch("abc123").await, Ok(PollStatus::Processing));
    let PollStatus::Complete(results) = client.poll_batch("abc123").await.unwrap() else {
        panic!("expected complete");
    };
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].vat_id(), "DE136695976");
    assert_eq!(results[0].trader_info(), TraderInfo::default());
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn vat_validator_against_mock_service() {
    let server = MockServer::start().await;
    mount_account(&server, 1000, 0).await;
    Mock::given(method("POST"))
        .and(path("/batch"))
        .and(body_json(json!({"vat_numbers": ["DE136695976", "ATU13585627"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "job-7"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/batch/job-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"code": 2001, "info": "batch still processing"}
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/batch/job-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "batch": {"errors": [], "results": [
                {
                    "country_code": "DE",
                    "vat_number": "136695976",
                    "valid": true,
                    "company_name": "ACME GMBH",
                    "company_address": "MUSTERSTR 1, 10115 BERLIN",
                    "request_date": "2024-06-15"
                },
                {"country_code": "AT", "vat_number": "U13585627", "valid": false}
            ]}
        })))
        .mount(&server)
        .await;

    let validator = Validator::VatId(
        VatValidator::with_api(Arc::new(api(&server)))
            .with_poll_interval(Duration::from_millis(5)),
    );
    let mut records = vec![
        Record::new("VAT_ID", "de136695976"),
        Record::new("VAT_ID", "ATU13585627"),
    ];
    records = validator.validate_fast(records);
    assert!(records.iter().all(|r| r.status == Status::FormalOk));

    let mut out = validator.validate_slow(records).await;
    out.sort_by(|a, b| a.value.cmp(&b.value));

    assert_eq!(out[0].value, "ATU13585627");
    assert_eq!(out[0].status, Status::Check);
    assert_eq!(out[0].status_message, "Invalid VAT ID (API check)");
    assert_eq!(out[1].status, Status::Ok);
    assert_eq!(
        out[1].additional_information,
        Some(json!({
            "name": "ACME GMBH",
            "address": "MUSTERSTR 1, 10115 BERLIN",
            "request_date": "2024-06-15"
        }))
    );
}
