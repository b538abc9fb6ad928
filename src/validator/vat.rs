use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::vat_api::{PollStatus, VatApi, VatApiError, VatCheckResult};
use super::{API_CHECK_OUTSTANDING, INVALID_VAT_API, INVALID_VAT_CHECKSUM, INVALID_VAT_SYNTAX};
use crate::checks::{check_vat_id, normalize_vat_id};
use crate::core::{Record, Status};

/// Default pause between two polls of a bulk job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// VAT-ID format and checksum validation, then bulk API verification.
#[derive(Clone)]
pub struct VatValidator {
    api: Option<Arc<dyn VatApi>>,
    poll_interval: Duration,
}

impl std::fmt::Debug for VatValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VatValidator")
            .field("api", &self.api.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Default for VatValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl VatValidator {
    /// Validator without API access: the slow phase defers every batch.
    pub fn new() -> Self {
        Self {
            api: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Validator verifying `formal-ok` records through `api`.
    pub fn with_api(api: Arc<dyn VatApi>) -> Self {
        Self {
            api: Some(api),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Pause between polls of a submitted job.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// National format, then national checksum where one is defined.
    pub fn validate_fast(&self, mut records: Vec<Record>) -> Vec<Record> {
        let now = Utc::now();
        for record in &mut records {
            match check_vat_id(&record.value) {
                Ok(_) => record.mark(Status::FormalOk, API_CHECK_OUTSTANDING, now),
                Err(e) if e.is_syntax() => {
                    debug!(value = %record.value, reason = %e, "VAT ID syntax rejected");
                    record.mark(Status::Check, INVALID_VAT_SYNTAX, now);
                }
                Err(e) => {
                    debug!(value = %record.value, reason = %e, "VAT ID checksum rejected");
                    record.mark(Status::Check, INVALID_VAT_CHECKSUM, now);
                }
            }
        }
        records
    }

    /// Verify the whole batch as one bulk job.
    ///
    /// If the quota is exhausted, the job cannot be submitted, or polling
    /// fails, the batch comes back exactly as it went in so the records stay
    /// queued for a later run.
    pub async fn validate_slow(&self, records: Vec<Record>) -> Vec<Record> {
        if records.is_empty() {
            return records;
        }
        let Some(api) = &self.api else {
            warn!(
                records = records.len(),
                "no VAT API credentials configured, deferring verification"
            );
            return records;
        };

        match self.verify(api.as_ref(), &records).await {
            Ok(results) => apply_results(records, results, Utc::now()),
            Err(e) => {
                warn!(error = %e, records = records.len(), "VAT verification aborted");
                records
            }
        }
    }

    async fn verify(
        &self,
        api: &dyn VatApi,
        records: &[Record],
    ) -> Result<Vec<VatCheckResult>, VatApiError> {
        let account = api.account_status().await?;
        if account.is_exhausted() {
            return Err(VatApiError::QuotaExhausted {
                consumed: account.consumed,
                limit: account.limit,
            });
        }

        let vat_ids: Vec<String> = records.iter().map(|r| normalize_vat_id(&r.value)).collect();
        let token = api.submit_batch(&vat_ids).await?;
        info!(%token, records = vat_ids.len(), "submitted VAT verification job");

        let mut polls = 0u32;
        loop {
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;
            match api.poll_batch(&token).await? {
                PollStatus::Processing => debug!(%token, polls, "VAT job still processing"),
                PollStatus::Complete(results) => {
                    info!(%token, polls, results = results.len(), "VAT job complete");
                    return Ok(results);
                }
            }
        }
    }
}

/// Match each result back to its record by reconstructed VAT ID.
///
/// Records without a matching result keep their state and visit time.
fn apply_results(
    mut records: Vec<Record>,
    results: Vec<VatCheckResult>,
    now: DateTime<Utc>,
) -> Vec<Record> {
    let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        positions
            .entry(normalize_vat_id(&record.value))
            .or_default()
            .push(i);
    }

    for result in results {
        let vat_id = result.vat_id();
        let Some(matched) = positions.get(&vat_id) else {
            warn!(%vat_id, "VAT result does not match any record in the batch");
            continue;
        };
        for &i in matched {
            let record = &mut records[i];
            if result.valid {
                record.mark(Status::Ok, "", now);
                record.additional_information = serde_json::to_value(result.trader_info()).ok();
            } else {
                record.mark(Status::Check, INVALID_VAT_API, now);
                record.additional_information = None;
            }
        }
    }
    records
}
