use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StatusParseError;

/// Identifier type a record carries, selecting which validator applies.
///
/// Built-in tags are canonicalised: `"vat_id"`, `" URL"` or `"Iban"` read
/// as the built-in variant and are written back as `VAT_ID`, `URL`, `IBAN`.
/// Other tags are kept as given, minus surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Classification {
    /// Web address.
    Url,
    /// International Bank Account Number.
    Iban,
    /// EU VAT identification number (country prefix + number).
    VatId,
    /// Any tag without a built-in validator.
    Other(String),
}

impl Classification {
    /// Canonical tag as stored alongside the record.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url => "URL",
            Self::Iban => "IBAN",
            Self::VatId => "VAT_ID",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Classification {
    fn from(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "URL" => Self::Url,
            "IBAN" => Self::Iban,
            "VAT_ID" | "VATID" | "VAT-ID" => Self::VatId,
            _ => Self::Other(tag.trim().to_string()),
        }
    }
}

impl From<String> for Classification {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<Classification> for String {
    fn from(c: Classification) -> Self {
        c.as_str().to_string()
    }
}

/// Validation state of a record.
///
/// `Ok` and `Check` are terminal for the phase that set them; `FormalOk`
/// means the record passed local checks and waits for external verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Status {
    /// Never validated.
    #[default]
    Unset,
    /// Structurally valid, external check outstanding.
    FormalOk,
    /// Verified.
    Ok,
    /// Failed; see the status message.
    Check,
}

impl Status {
    /// Canonical lowercase spelling written back to storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::FormalOk => "formal-ok",
            Self::Ok => "ok",
            Self::Check => "check",
        }
    }

    /// Whether the status ends processing for the phase that produced it.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ok | Self::Check)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = StatusParseError;

    /// Historical rows mix upper and lower case as well as `-`/`_`
    /// separators; all spellings map onto the same four states.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "" | "unset" | "none" => Ok(Self::Unset),
            "formalok" => Ok(Self::FormalOk),
            "ok" => Ok(Self::Ok),
            "check" => Ok(Self::Check),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Status {
    type Error = StatusParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.as_str().to_string()
    }
}

/// One identifier row pulled from the backlog for the duration of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Which validator applies.
    pub classification: Classification,
    /// Raw identifier string.
    pub value: String,
    /// Current validation state.
    #[serde(default)]
    pub status: Status,
    /// Human-readable reason; empty when the status is `ok`.
    #[serde(default)]
    pub status_message: String,
    /// Time of the most recent evaluation, `None` if never visited.
    #[serde(default)]
    pub last_visited: Option<DateTime<Utc>>,
    /// Verified metadata attached by a successful external check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<serde_json::Value>,
}

impl Record {
    /// A never-visited record.
    pub fn new(classification: impl Into<Classification>, value: impl Into<String>) -> Self {
        Self {
            classification: classification.into(),
            value: value.into(),
            status: Status::Unset,
            status_message: String::new(),
            last_visited: None,
            additional_information: None,
        }
    }

    /// Set a terminal or intermediate outcome and stamp the visit time.
    pub fn mark(&mut self, status: Status, message: impl Into<String>, now: DateTime<Utc>) {
        self.status = status;
        self.status_message = message.into();
        self.last_visited = Some(now);
    }
}
