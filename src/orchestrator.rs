//! Convergence loop driving the fast sweep, then the slow sweep.
//!
//! Each sweep runs rounds over every classification, pulling at most one
//! batch per classification per round, until every classification has run
//! dry. A classification with a huge backlog therefore never holds up the
//! others: each gets one batch of progress per round.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::core::{Classification, Phase, PipelineError, Record, StalenessWindow};
use crate::store::Store;
use crate::validator::Registry;

/// Batch sizes and staleness window for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Records per fast-phase batch.
    pub fast_batch_size: usize,
    /// Records per slow-phase batch.
    pub slow_batch_size: usize,
    /// Minimum age before a record is fast-validated again.
    pub staleness: StalenessWindow,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            fast_batch_size: 100,
            slow_batch_size: 20,
            staleness: StalenessWindow::days(0),
        }
    }
}

impl BatchSettings {
    /// Settings from the `[batching]` section.
    pub fn from_config(config: &Config) -> Self {
        Self {
            fast_batch_size: config.batching.fast_batch_size,
            slow_batch_size: config.batching.slow_batch_size,
            staleness: config.batching.staleness(),
        }
    }

    fn batch_size(&self, phase: Phase) -> usize {
        match phase {
            Phase::Fast => self.fast_batch_size,
            Phase::Slow => self.slow_batch_size,
        }
        .max(1)
    }
}

/// Work done by one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseReport {
    /// Which sweep.
    pub phase: Phase,
    /// Rounds that processed at least one non-empty batch.
    pub rounds: usize,
    /// Batches handed to a validator.
    pub batches: usize,
    /// Records written back to the store.
    pub records: usize,
}

impl PhaseReport {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            rounds: 0,
            batches: 0,
            records: 0,
        }
    }
}

/// Work done by a full run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Local validation sweep.
    pub fast: PhaseReport,
    /// External verification sweep.
    pub slow: PhaseReport,
}

/// Drives validators over the backlog held by a [`Store`].
#[derive(Debug)]
pub struct Orchestrator<S> {
    store: S,
    registry: Registry,
    settings: BatchSettings,
}

impl<S: Store> Orchestrator<S> {
    /// Orchestrator over `store`, dispatching through `registry`.
    pub fn new(store: S, registry: Registry, settings: BatchSettings) -> Self {
        Self {
            store,
            registry,
            settings,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fast sweep to exhaustion, then slow sweep to exhaustion.
    ///
    /// The slow sweep only sees records the fast sweep marked `formal-ok`,
    /// so the order is fixed.
    ///
    /// # Errors
    ///
    /// Any store failure aborts the run. Batches persisted before the
    /// failure stay persisted; a rerun resumes from stored state.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let result: Result<RunReport, PipelineError> = async {
            let fast = self.run_phase(Phase::Fast).await?;
            let slow = self.run_phase(Phase::Slow).await?;
            Ok(RunReport { fast, slow })
        }
        .await;

        match &result {
            Ok(report) => info!(
                fast_records = report.fast.records,
                slow_records = report.slow.records,
                "finished processing all classifications"
            ),
            Err(e) => error!(error = %e, "validation run aborted"),
        }
        result
    }

    /// Run one sweep until every classification reports an empty batch.
    ///
    /// Classifications without a validator are finished immediately. Records
    /// that come back from a validator still in the phase's queue (quota
    /// exhausted, no credentials, unmatched results) are deferred: later
    /// fetches in the same sweep skip them, so they are not resubmitted once
    /// per round. A batch in which no record left the queue finishes the
    /// classification for this sweep.
    pub async fn run_phase(&self, phase: Phase) -> Result<PhaseReport, PipelineError> {
        let classifications = self.store.list_classifications().await?;
        let batch_size = self.settings.batch_size(phase);
        let mut finished = vec![false; classifications.len()];
        let mut deferred: Vec<HashSet<String>> = vec![HashSet::new(); classifications.len()];
        let mut report = PhaseReport::new(phase);

        info!(%phase, classifications = classifications.len(), batch_size, "starting sweep");

        while finished.iter().any(|done| !done) {
            let mut worked = false;

            for (i, classification) in classifications.iter().enumerate() {
                if finished[i] {
                    continue;
                }
                debug!(%phase, %classification, "next batch");

                let Some(validator) = self.registry.get(classification) else {
                    warn!(%classification, "no validator found for classification");
                    finished[i] = true;
                    continue;
                };

                let skipped = &mut deferred[i];
                let mut batch = self
                    .store
                    .fetch_batch(
                        classification,
                        phase,
                        batch_size + skipped.len(),
                        self.settings.staleness,
                    )
                    .await?;
                batch.retain(|r| !skipped.contains(&r.value));
                batch.truncate(batch_size);
                if batch.is_empty() {
                    finished[i] = true;
                    continue;
                }
                let fetched = batch.len();

                let validated = match phase {
                    Phase::Fast => validator.validate_fast(batch),
                    Phase::Slow => validator.validate_slow(batch).await,
                };
                let cutoff = self.settings.staleness.cutoff(Utc::now());
                let stuck: Vec<&Record> = validated
                    .iter()
                    .filter(|r| phase.is_eligible(r, cutoff))
                    .collect();
                let progressed = fetched.saturating_sub(stuck.len());
                skipped.extend(stuck.into_iter().map(|r| r.value.clone()));

                let written = self.store.persist_batch(&validated).await?;
                info!(%phase, %classification, fetched, written, "updated records");

                report.batches += 1;
                report.records += written;
                worked = true;

                if progressed == 0 {
                    warn!(
                        %phase, %classification, fetched,
                        "no record left the queue, deferring classification to the next run"
                    );
                    finished[i] = true;
                } else if progressed < fetched {
                    debug!(
                        %phase, %classification, deferred = fetched - progressed,
                        "records deferred to the next run"
                    );
                }
            }

            if worked {
                report.rounds += 1;
            }
        }

        info!(
            %phase,
            rounds = report.rounds,
            batches = report.batches,
            records = report.records,
            "sweep complete"
        );
        Ok(report)
    }

    /// Classifications the store knows but no validator handles.
    pub async fn unhandled_classifications(&self) -> Result<Vec<Classification>, PipelineError> {
        Ok(self
            .store
            .list_classifications()
            .await?
            .into_iter()
            .filter(|c| !self.registry.contains(c))
            .collect())
    }
}
