//! Per-classification validators and the registry that dispatches to them.
//!
//! Every validator implements the same two-step contract:
//!
//! - `validate_fast` is local and deterministic. Each record ends in
//!   `check` (syntax or checksum failure) or `formal-ok` (external check
//!   outstanding), and its visit time is refreshed.
//! - `validate_slow` verifies `formal-ok` records externally. A record whose
//!   verification could not be attempted comes back untouched, visit time
//!   included, which keeps it queued for a later run.
//!
//! Both return every input record, in any order.

mod iban;
mod url;
mod vat;
mod vat_api;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

pub use iban::IbanValidator;
pub use url::{
    DEFAULT_PROBE_CONCURRENCY, DEFAULT_PROBE_TIMEOUT, DEFAULT_USER_AGENT, HttpProbe, Probe,
    ProbeError, UrlValidator, probe_outcome,
};
pub use vat::{DEFAULT_POLL_INTERVAL, VatValidator};
pub use vat_api::{
    AccountStatus, HttpVatApi, PollStatus, STILL_PROCESSING, TraderInfo, VatApi, VatApiError,
    VatCheckResult,
};

use crate::config::Config;
use crate::core::{Classification, PipelineError, Record};

/// Placeholder message for records waiting on external verification.
pub const API_CHECK_OUTSTANDING: &str = "API check outstanding";
/// URL failed the syntax pattern.
pub const INVALID_URL_SYNTAX: &str = "Invalid URL syntax";
/// VAT ID matches no national format.
pub const INVALID_VAT_SYNTAX: &str = "Invalid VAT ID syntax";
/// VAT ID failed its national check digit.
pub const INVALID_VAT_CHECKSUM: &str = "Invalid VAT ID checksum";
/// The verification service reported the VAT ID as not registered.
pub const INVALID_VAT_API: &str = "Invalid VAT ID (API check)";

/// The closed set of validators.
#[derive(Debug, Clone)]
pub enum Validator {
    /// Single-pass IBAN check; the slow step is a no-op.
    Iban(IbanValidator),
    /// URL syntax, then reachability.
    Url(UrlValidator),
    /// VAT-ID format and checksum, then bulk API verification.
    VatId(VatValidator),
}

impl Validator {
    /// Short name for log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iban(_) => "iban",
            Self::Url(_) => "url",
            Self::VatId(_) => "vat_id",
        }
    }

    /// Local, deterministic validation. Never touches the network.
    pub fn validate_fast(&self, records: Vec<Record>) -> Vec<Record> {
        match self {
            Self::Iban(v) => v.validate(records),
            Self::Url(v) => v.validate_fast(records),
            Self::VatId(v) => v.validate_fast(records),
        }
    }

    /// External verification of `formal-ok` records.
    pub async fn validate_slow(&self, records: Vec<Record>) -> Vec<Record> {
        match self {
            Self::Iban(_) => records,
            Self::Url(v) => v.validate_slow(records).await,
            Self::VatId(v) => v.validate_slow(records).await,
        }
    }
}

/// Classification → validator mapping, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    validators: HashMap<Classification, Validator>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the validator for `classification`.
    pub fn register(mut self, classification: Classification, validator: Validator) -> Self {
        self.validators.insert(classification, validator);
        self
    }

    /// Validator responsible for `classification`, if any.
    pub fn get(&self, classification: &Classification) -> Option<&Validator> {
        self.validators.get(classification)
    }

    /// Whether a validator is registered for `classification`.
    pub fn contains(&self, classification: &Classification) -> bool {
        self.validators.contains_key(classification)
    }

    /// Number of registered classifications.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Registry with the built-in URL, IBAN and VAT-ID validators.
    ///
    /// Without a VAT access key the VAT-ID validator still runs its fast
    /// phase but defers every slow batch.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if an HTTP client cannot be built
    /// from the configured values.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let probe = HttpProbe::new(&config.url.user_agent, config.url.timeout())
            .map_err(|e| PipelineError::Config(format!("URL probe client: {e}")))?;
        let url = UrlValidator::new(Arc::new(probe))
            .with_concurrency(config.url.concurrency)
            .with_timeout(config.url.timeout());

        let vat = match config.vat.access_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                let api = HttpVatApi::new(&config.vat.api_base, key)
                    .map_err(|e| PipelineError::Config(format!("VAT API client: {e}")))?;
                VatValidator::with_api(Arc::new(api))
            }
            None => {
                warn!("no VAT API access key configured, VAT IDs are checked locally only");
                VatValidator::new()
            }
        }
        .with_poll_interval(config.vat.poll_interval());

        Ok(Self::new()
            .register(Classification::Url, Validator::Url(url))
            .register(Classification::Iban, Validator::Iban(IbanValidator))
            .register(Classification::VatId, Validator::VatId(vat)))
    }
}
