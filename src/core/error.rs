use thiserror::Error;

/// Errors that abort a validation run.
///
/// Per-record validation failures never surface here; they are recorded as
/// `check` status on the record itself.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The record store could not be read or written.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration is missing, malformed, or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A status string that matches none of the known spellings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status '{0}'")]
pub struct StatusParseError(pub String);
