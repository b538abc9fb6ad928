use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{MemoryStore, Store};
use crate::core::{Classification, Phase, PipelineError, Record, StalenessWindow};

/// [`Store`] backed by a JSON array of records on disk.
///
/// The file is read once on open; every persisted batch rewrites it through
/// a temporary file and an atomic rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Load all records from `path`.
    ///
    /// # Errors
    ///
    /// `PipelineError::Store` if the file is missing or not a JSON array of
    /// records.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PipelineError::Store(format!("cannot read {}: {e}", path.display())))?;
        let records: Vec<Record> = serde_json::from_str(&text)
            .map_err(|e| PipelineError::Store(format!("cannot parse {}: {e}", path.display())))?;
        debug!(path = %path.display(), records = records.len(), "opened record file");

        Ok(Self {
            path,
            inner: MemoryStore::new(records),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of every record currently held.
    pub fn snapshot(&self) -> Vec<Record> {
        self.inner.snapshot()
    }

    async fn flush(&self) -> Result<(), PipelineError> {
        let _guard = self.write_lock.lock().await;
        let json = serde_json::to_vec_pretty(&self.inner.snapshot())
            .map_err(|e| PipelineError::Store(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn list_classifications(&self) -> Result<Vec<Classification>, PipelineError> {
        self.inner.list_classifications().await
    }

    async fn fetch_batch(
        &self,
        classification: &Classification,
        phase: Phase,
        limit: usize,
        staleness: StalenessWindow,
    ) -> Result<Vec<Record>, PipelineError> {
        Ok(self.inner.select(classification, phase, limit, staleness))
    }

    async fn persist_batch(&self, records: &[Record]) -> Result<usize, PipelineError> {
        let written = self.inner.upsert(records);
        if written > 0 {
            self.flush().await?;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::core::Status;

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(
            &path,
            r#"[{"classification":"URL","value":"example.com","status":"","last_visited":null}]"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        let mut batch = store
            .fetch_batch(&Classification::Url, Phase::Fast, 10, StalenessWindow::days(0))
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
        batch[0].mark(Status::FormalOk, "API check outstanding", Utc::now());
        assert_eq!(store.persist_batch(&batch).await.unwrap(), 1);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.snapshot()[0].status, Status::FormalOk);
        assert!(!dir.path().join("records.json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_file_is_store_error() {
        let err = JsonFileStore::open("/nonexistent/records.json").await.unwrap_err();
        assert!(matches!(err, PipelineError::Store(_)));
    }
}
