use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::Store;
use crate::core::{Classification, Phase, PipelineError, Record, StalenessWindow};

/// In-memory [`Store`] honouring the full ordering and eligibility contract.
///
/// Records are identified by `(classification, value)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
}

impl MemoryStore {
    /// Store holding `records`.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of every record currently held.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub(crate) fn select(
        &self,
        classification: &Classification,
        phase: Phase,
        limit: usize,
        staleness: StalenessWindow,
    ) -> Vec<Record> {
        let cutoff = staleness.cutoff(Utc::now());
        let records = self.records.lock();
        let mut eligible: Vec<&Record> = records
            .iter()
            .filter(|r| &r.classification == classification && phase.is_eligible(r, cutoff))
            .collect();
        // `None < Some(_)`, so never-visited records sort first.
        eligible.sort_by(|a, b| {
            a.last_visited
                .cmp(&b.last_visited)
                .then_with(|| a.value.cmp(&b.value))
        });
        eligible.into_iter().take(limit).cloned().collect()
    }

    pub(crate) fn upsert(&self, batch: &[Record]) -> usize {
        let mut records = self.records.lock();
        let mut written = 0;
        for update in batch.iter().filter(|r| r.last_visited.is_some()) {
            let existing = records
                .iter_mut()
                .find(|r| r.classification == update.classification && r.value == update.value);
            match existing {
                Some(row) => {
                    row.status = update.status;
                    row.status_message.clone_from(&update.status_message);
                    row.last_visited = update.last_visited;
                    row.additional_information
                        .clone_from(&update.additional_information);
                }
                None => records.push(update.clone()),
            }
            written += 1;
        }
        written
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_classifications(&self) -> Result<Vec<Classification>, PipelineError> {
        let distinct: BTreeSet<Classification> = self
            .records
            .lock()
            .iter()
            .map(|r| r.classification.clone())
            .collect();
        Ok(distinct.into_iter().collect())
    }

    async fn fetch_batch(
        &self,
        classification: &Classification,
        phase: Phase,
        limit: usize,
        staleness: StalenessWindow,
    ) -> Result<Vec<Record>, PipelineError> {
        Ok(self.select(classification, phase, limit, staleness))
    }

    async fn persist_batch(&self, records: &[Record]) -> Result<usize, PipelineError> {
        Ok(self.upsert(records))
    }
}
