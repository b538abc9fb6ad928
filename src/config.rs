//! Run configuration loaded from TOML.
//!
//! Every section and key is optional:
//!
//! ```toml
//! [batching]
//! fast_batch_size = 100
//! slow_batch_size = 20
//! history_days = -7
//!
//! [url]
//! concurrency = 16
//! timeout_secs = 10
//!
//! [vat]
//! api_base = "https://vat.example.invalid/api"
//! access_key = "secret"
//! poll_interval_secs = 5
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::core::{PipelineError, StalenessWindow};
use crate::validator::{DEFAULT_PROBE_CONCURRENCY, DEFAULT_USER_AGENT};

/// Environment variable overriding `vat.access_key`.
pub const VAT_ACCESS_KEY_ENV: &str = "IDSWEEP_VAT_ACCESS_KEY";

/// Complete run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Batch sizes and staleness window.
    pub batching: BatchingConfig,
    /// Reachability probing.
    pub url: UrlConfig,
    /// Bulk VAT verification service.
    pub vat: VatConfig,
}

/// How much work one convergence round pulls per classification.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchingConfig {
    /// Records per fast-phase batch.
    pub fast_batch_size: usize,
    /// Records per slow-phase batch.
    pub slow_batch_size: usize,
    /// Staleness window in days relative to today; must be `<= 0`.
    pub history_days: i64,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            fast_batch_size: 100,
            slow_batch_size: 20,
            history_days: 0,
        }
    }
}

impl BatchingConfig {
    /// Window used to select fast-phase work.
    pub fn staleness(&self) -> StalenessWindow {
        StalenessWindow::days(self.history_days)
    }
}

/// Reachability probe settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlConfig {
    /// Probes in flight per batch.
    pub concurrency: usize,
    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with each probe.
    pub user_agent: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_PROBE_CONCURRENCY,
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl UrlConfig {
    /// Per-probe timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bulk VAT verification service settings.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VatConfig {
    /// Service root URL.
    pub api_base: String,
    /// Account access key; slow VAT verification is skipped without one.
    pub access_key: Option<String>,
    /// Seconds between polls of a submitted job.
    pub poll_interval_secs: u64,
}

impl std::fmt::Debug for VatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VatConfig")
            .field("api_base", &self.api_base)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

impl Default for VatConfig {
    fn default() -> Self {
        Self {
            api_base: "https://vat.example.invalid/api".to_string(),
            access_key: None,
            poll_interval_secs: 5,
        }
    }
}

impl VatConfig {
    /// Pause between polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, PipelineError> {
        let config: Self = toml::from_str(s).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, apply environment overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env();
        Ok(config)
    }

    /// Take the VAT access key from the environment when set.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(VAT_ACCESS_KEY_ENV) {
            if !key.trim().is_empty() {
                self.vat.access_key = Some(key);
            }
        }
    }

    /// Check the invariants the pipeline relies on.
    ///
    /// A positive `history_days` would keep freshly visited records eligible
    /// for the fast phase, so the fast sweep would never run dry.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.batching.fast_batch_size == 0 {
            return Err(PipelineError::Config(
                "batching.fast_batch_size must be at least 1".into(),
            ));
        }
        if self.batching.slow_batch_size == 0 {
            return Err(PipelineError::Config(
                "batching.slow_batch_size must be at least 1".into(),
            ));
        }
        if self.batching.history_days > 0 {
            return Err(PipelineError::Config(format!(
                "batching.history_days must be zero or negative, got {}",
                self.batching.history_days
            )));
        }
        if self.url.concurrency == 0 {
            return Err(PipelineError::Config("url.concurrency must be at least 1".into()));
        }
        if self.url.timeout_secs == 0 {
            return Err(PipelineError::Config("url.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}
