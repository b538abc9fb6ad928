use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use thiserror::Error;
use tracing::debug;

use super::{API_CHECK_OUTSTANDING, INVALID_URL_SYNTAX};
use crate::checks::{force_secure_scheme, is_valid_url_syntax, with_default_scheme};
use crate::core::{Record, Status};

/// Default number of probes in flight per batch.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 16;

/// Default per-probe time limit.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Browser-like user agent; many sites refuse obvious bots outright.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

const MAX_REDIRECTS: usize = 10;

/// Failure to obtain any HTTP status for a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProbeError {
    /// No response within the time limit.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Connection, TLS, redirect, or protocol failure.
    #[error("{0}")]
    Transport(String),
}

/// Reachability check for a single URL.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Fetch `url` (following redirects) and return the final status code.
    async fn probe(&self, url: &str) -> Result<u16, ProbeError>;
}

/// [`Probe`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Build a client sending browser-like headers.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Transport` if the user agent is not a valid
    /// header value or the TLS backend cannot be initialised.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ProbeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ProbeError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> Result<u16, ProbeError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;
        Ok(resp.status().as_u16())
    }
}

/// Map a probe outcome to the record status and message.
///
/// 403 counts as reachable: the host answered, it just refuses crawlers.
pub fn probe_outcome(outcome: Result<u16, ProbeError>) -> (Status, String) {
    match outcome {
        Ok(403) => (
            Status::Ok,
            "Reachable, but access forbidden (HTTP 403, likely bot protection)".to_string(),
        ),
        Ok(code) if code < 400 => (Status::Ok, String::new()),
        Ok(code) => (Status::Check, format!("HTTP status {code}")),
        Err(e) => (Status::Check, e.to_string()),
    }
}

/// URL syntax check followed by concurrent reachability probing.
#[derive(Clone)]
pub struct UrlValidator {
    probe: Arc<dyn Probe>,
    concurrency: usize,
    timeout: Duration,
}

impl std::fmt::Debug for UrlValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlValidator")
            .field("concurrency", &self.concurrency)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl UrlValidator {
    /// Validator using `probe` with default concurrency and timeout.
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        Self {
            probe,
            concurrency: DEFAULT_PROBE_CONCURRENCY,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Limit the number of probes in flight (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Upper bound for each individual probe.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Syntax check after prepending a default scheme to bare host names.
    pub fn validate_fast(&self, mut records: Vec<Record>) -> Vec<Record> {
        let now = Utc::now();
        for record in &mut records {
            let candidate = with_default_scheme(&record.value);
            if is_valid_url_syntax(&candidate) {
                record.mark(Status::FormalOk, API_CHECK_OUTSTANDING, now);
            } else {
                debug!(value = %record.value, "URL syntax rejected");
                record.mark(Status::Check, INVALID_URL_SYNTAX, now);
            }
        }
        records
    }

    /// Probe every record over HTTPS, at most `concurrency` at a time.
    ///
    /// Returns once every probe has resolved; completion order, and thus
    /// output order, is unspecified. Every record is evaluated and stamped.
    pub async fn validate_slow(&self, records: Vec<Record>) -> Vec<Record> {
        stream::iter(records)
            .map(|mut record| async move {
                let url = force_secure_scheme(&record.value);
                let outcome = tokio::time::timeout(self.timeout, self.probe.probe(&url))
                    .await
                    .unwrap_or(Err(ProbeError::Timeout(self.timeout)));
                let (status, message) = probe_outcome(outcome);
                debug!(%url, %status, %message, "probed URL");
                record.mark(status, message, Utc::now());
                record
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}
