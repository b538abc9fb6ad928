use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Record, Status};

/// Step of the validation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Local syntax and checksum validation, no network access.
    Fast,
    /// External verification of records that passed the fast phase.
    Slow,
}

impl Phase {
    /// Whether `record` belongs in this phase's work queue.
    ///
    /// Fast: never visited, or last visited before `cutoff`.
    /// Slow: status is exactly `formal-ok`; `cutoff` is ignored.
    pub fn is_eligible(self, record: &Record, cutoff: DateTime<Utc>) -> bool {
        match self {
            Self::Fast => record.last_visited.is_none_or(|visited| visited < cutoff),
            Self::Slow => record.status == Status::FormalOk,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => f.write_str("fast"),
            Self::Slow => f.write_str("slow"),
        }
    }
}

/// Minimum age, in days relative to today, before a record is re-validated.
///
/// `-7` means "last visited more than a week ago"; `0` means "not visited
/// today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StalenessWindow(pub i64);

impl StalenessWindow {
    /// Window of `days` relative to today.
    pub fn days(days: i64) -> Self {
        Self(days)
    }

    /// Start of `now`'s UTC day shifted by the window.
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        midnight + Duration::days(self.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn cutoff_is_midnight_shifted() {
        let now = at(2024, 6, 15, 13);
        assert_eq!(StalenessWindow::days(0).cutoff(now), at(2024, 6, 15, 0));
        assert_eq!(StalenessWindow::days(-7).cutoff(now), at(2024, 6, 8, 0));
    }

    #[test]
    fn fast_eligibility_by_age() {
        let cutoff = at(2024, 6, 8, 0);
        let mut record = Record::new("URL", "example.com");
        assert!(Phase::Fast.is_eligible(&record, cutoff));

        record.last_visited = Some(at(2024, 6, 7, 23));
        assert!(Phase::Fast.is_eligible(&record, cutoff));

        record.last_visited = Some(cutoff);
        assert!(!Phase::Fast.is_eligible(&record, cutoff));
    }

    #[test]
    fn slow_eligibility_only_formal_ok() {
        let cutoff = at(2024, 6, 8, 0);
        let mut record = Record::new("URL", "example.com");
        for (status, eligible) in [
            (Status::Unset, false),
            (Status::FormalOk, true),
            (Status::Ok, false),
            (Status::Check, false),
        ] {
            record.status = status;
            assert_eq!(Phase::Slow.is_eligible(&record, cutoff), eligible, "{status:?}");
        }
    }
}
