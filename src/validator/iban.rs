use chrono::Utc;
use tracing::debug;

use crate::checks::validate_iban;
use crate::core::{Record, Status};

/// Complete IBAN check (syntax + mod-97) in a single local pass.
///
/// There is no external verification step: every record ends in a terminal
/// `ok` or `check` status, so IBAN records never reach the slow queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct IbanValidator;

impl IbanValidator {
    /// Validate every record and stamp it with the current time.
    pub fn validate(&self, mut records: Vec<Record>) -> Vec<Record> {
        let now = Utc::now();
        for record in &mut records {
            debug!(value = %record.value, "validating IBAN");
            match validate_iban(&record.value) {
                Ok(()) => record.mark(Status::Ok, "", now),
                Err(e) => record.mark(Status::Check, e.to_string(), now),
            }
        }
        records
    }
}
