//! Client for the asynchronous bulk VAT verification service.
//!
//! The service works in three steps: submit a list of VAT IDs and receive a
//! job token, poll the token until the job is done, and read per-ID results.
//! An account endpoint reports the request quota.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code the service uses for "job still processing".
pub const STILL_PROCESSING: i64 = 2001;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from the bulk verification service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum VatApiError {
    /// Network or HTTP transport failure.
    #[error("VAT API network error: {0}")]
    Network(String),
    /// The service answered with an error code.
    #[error("VAT API error {code}: {info}")]
    Api {
        /// Service-specific error code.
        code: i64,
        /// Accompanying description, possibly empty.
        info: String,
    },
    /// The response body was not what the protocol promises.
    #[error("VAT API parse error: {0}")]
    Parse(String),
    /// The account has used up its request allowance.
    #[error("VAT API quota exhausted ({consumed}/{limit} requests used)")]
    QuotaExhausted {
        /// Requests consumed in the current period.
        consumed: u64,
        /// Requests allowed in the current period.
        limit: u64,
    },
    /// The job finished without a result payload.
    #[error("VAT API job returned no results")]
    MissingResults,
    /// The job reported batch-level errors.
    #[error("VAT API job reported errors: {0}")]
    Batch(String),
}

/// Request allowance of the API account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    /// Requests allowed in the current period.
    pub limit: u64,
    /// Requests already consumed.
    pub consumed: u64,
}

impl AccountStatus {
    /// No further requests are allowed this period.
    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.limit
    }
}

/// Verification outcome for a single VAT ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatCheckResult {
    /// VAT prefix as echoed by the service.
    pub country_code: String,
    /// National number as echoed by the service.
    pub vat_number: String,
    /// Whether the number is currently registered.
    pub valid: bool,
    /// Registered trader name (if disclosed).
    #[serde(default)]
    pub company_name: Option<String>,
    /// Registered trader address (if disclosed).
    #[serde(default)]
    pub company_address: Option<String>,
    /// Date the registry was consulted.
    #[serde(default)]
    pub request_date: Option<String>,
}

impl VatCheckResult {
    /// Reassembled identifier used to match the result to its record.
    pub fn vat_id(&self) -> String {
        format!(
            "{}{}",
            self.country_code.trim().to_uppercase(),
            self.vat_number.trim().to_uppercase()
        )
    }

    /// Trader fields worth keeping, with registry placeholders dropped.
    pub fn trader_info(&self) -> TraderInfo {
        TraderInfo {
            name: disclosed(&self.company_name),
            address: disclosed(&self.company_address),
            request_date: disclosed(&self.request_date),
        }
    }
}

fn disclosed(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "---")
        .map(str::to_string)
}

/// Verified trader metadata stored with a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderInfo {
    /// Registered name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Registered address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Registry consultation date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_date: Option<String>,
}

/// State of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Not done yet; poll again later.
    Processing,
    /// Done, with one result per identifier the service could resolve.
    Complete(Vec<VatCheckResult>),
}

/// Bulk VAT verification service.
#[async_trait]
pub trait VatApi: Send + Sync {
    /// Current request allowance.
    async fn account_status(&self) -> Result<AccountStatus, VatApiError>;

    /// Queue `vat_ids` for verification and return the job token.
    async fn submit_batch(&self, vat_ids: &[String]) -> Result<String, VatApiError>;

    /// Look up a job by token.
    async fn poll_batch(&self, token: &str) -> Result<PollStatus, VatApiError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    #[serde(default)]
    info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<ErrorBody>,
    #[serde(default)]
    batch: Option<BatchBody>,
}

#[derive(Debug, Deserialize)]
struct BatchBody {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    #[serde(default)]
    results: Vec<VatCheckResult>,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    vat_numbers: &'a [String],
}

impl From<ErrorBody> for VatApiError {
    fn from(e: ErrorBody) -> Self {
        Self::Api {
            code: e.code,
            info: e.info.unwrap_or_default(),
        }
    }
}

fn interpret_poll(resp: PollResponse) -> Result<PollStatus, VatApiError> {
    if let Some(err) = resp.error {
        if err.code == STILL_PROCESSING {
            return Ok(PollStatus::Processing);
        }
        return Err(err.into());
    }
    if resp.success == Some(false) {
        return Err(VatApiError::Api {
            code: 0,
            info: "request failed without error details".into(),
        });
    }
    let Some(batch) = resp.batch else {
        return Err(VatApiError::MissingResults);
    };
    if !batch.errors.is_empty() {
        let detail = batch
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(VatApiError::Batch(detail));
    }
    Ok(PollStatus::Complete(batch.results))
}

/// [`VatApi`] over HTTPS with JSON bodies and an access key query parameter.
#[derive(Debug, Clone)]
pub struct HttpVatApi {
    client: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl HttpVatApi {
    /// Client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `VatApiError::Network` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Result<Self, VatApiError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| VatApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_key: access_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, VatApiError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| VatApiError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(VatApiError::Api {
                code: i64::from(status.as_u16()),
                info: body,
            });
        }

        serde_json::from_str(&body).map_err(|e: serde_json::Error| VatApiError::Parse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, VatApiError> {
        let resp = self
            .client
            .get(self.url(path))
            .query(&[("access_key", self.access_key.as_str())])
            .send()
            .await
            .map_err(|e| VatApiError::Network(e.to_string()))?;
        Self::read_json(resp).await
    }
}

#[async_trait]
impl VatApi for HttpVatApi {
    async fn account_status(&self) -> Result<AccountStatus, VatApiError> {
        self.get_json("account").await
    }

    async fn submit_batch(&self, vat_ids: &[String]) -> Result<String, VatApiError> {
        let resp = self
            .client
            .post(self.url("batch"))
            .query(&[("access_key", self.access_key.as_str())])
            .json(&SubmitRequest { vat_numbers: vat_ids })
            .send()
            .await
            .map_err(|e| VatApiError::Network(e.to_string()))?;
        let submitted: SubmitResponse = Self::read_json(resp).await?;

        if let Some(err) = submitted.error {
            return Err(err.into());
        }
        submitted
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VatApiError::Parse("response carried no job token".into()))
    }

    async fn poll_batch(&self, token: &str) -> Result<PollStatus, VatApiError> {
        let resp: PollResponse = self.get_json(&format!("batch/{token}")).await?;
        interpret_poll(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(json: &str) -> Result<PollStatus, VatApiError> {
        interpret_poll(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn still_processing_keeps_polling() {
        let status = poll(r#"{"success":false,"error":{"code":2001,"info":"processing"}}"#);
        assert_eq!(status, Ok(PollStatus::Processing));
    }

    #[test]
    fn other_error_codes_abort() {
        let status = poll(r#"{"success":false,"error":{"code":104,"info":"usage limit"}}"#);
        assert_eq!(
            status,
            Err(VatApiError::Api {
                code: 104,
                info: "usage limit".into()
            })
        );
    }

    #[test]
    fn missing_batch_aborts() {
        assert_eq!(poll(r#"{"success":true}"#), Err(VatApiError::MissingResults));
    }

    #[test]
    fn batch_errors_abort() {
        let status = poll(r#"{"success":true,"batch":{"errors":[{"code":1}],"results":[]}}"#);
        assert!(matches!(status, Err(VatApiError::Batch(_))));
    }

    #[test]
    fn complete_results() {
        let status = poll(
            r#"{"success":true,"batch":{"results":[
                {"country_code":"DE","vat_number":"136695976","valid":true,"company_name":"ACME GMBH"}
            ]}}"#,
        )
        .unwrap();
        let PollStatus::Complete(results) = status else {
            panic!("expected complete");
        };
        assert_eq!(results[0].vat_id(), "DE136695976");
        assert_eq!(results[0].trader_info().name.as_deref(), Some("ACME GMBH"));
    }

    #[test]
    fn placeholders_dropped() {
        let result = VatCheckResult {
            country_code: "de".into(),
            vat_number: " 136695976".into(),
            valid: true,
            company_name: Some("---".into()),
            company_address: Some(String::new()),
            request_date: Some("2024-01-15".into()),
        };
        assert_eq!(result.vat_id(), "DE136695976");
        let info = result.trader_info();
        assert!(info.name.is_none());
        assert!(info.address.is_none());
        assert_eq!(
            serde_json::to_string(&info).unwrap(),
            r#"{"request_date":"2024-01-15"}"#
        );
    }

    #[test]
    fn quota_boundary() {
        assert!(AccountStatus { limit: 100, consumed: 100 }.is_exhausted());
        assert!(!AccountStatus { limit: 100, consumed: 99 }.is_exhausted());
    }

    #[test]
    fn submit_request_shape() {
        let ids = vec!["DE136695976".to_string()];
        let json = serde_json::to_string(&SubmitRequest { vat_numbers: &ids }).unwrap();
        assert_eq!(json, r#"{"vat_numbers":["DE136695976"]}"#);
    }
}
