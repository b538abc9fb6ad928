//! Record store boundary.
//!
//! The pipeline keeps no state of its own between batches; everything it
//! needs to resume is derived from `status` and `last_visited` as read back
//! through a [`Store`].

mod json_file;
mod memory;

use async_trait::async_trait;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::core::{Classification, Phase, PipelineError, Record, StalenessWindow};

/// Persistent backlog of identifier records.
///
/// Errors are fatal to the run that hit them.
#[async_trait]
pub trait Store: Send + Sync {
    /// Distinct classifications present in the backlog.
    async fn list_classifications(&self) -> Result<Vec<Classification>, PipelineError>;

    /// Up to `limit` records of `classification` eligible for `phase`.
    ///
    /// Ordered by `last_visited` ascending with never-visited records first,
    /// then by `value`.
    async fn fetch_batch(
        &self,
        classification: &Classification,
        phase: Phase,
        limit: usize,
        staleness: StalenessWindow,
    ) -> Result<Vec<Record>, PipelineError>;

    /// Write back status, message, visit time and additional information of
    /// every record with a visit time. Returns the number of rows written.
    async fn persist_batch(&self, records: &[Record]) -> Result<usize, PipelineError>;
}
