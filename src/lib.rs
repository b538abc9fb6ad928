//! # idsweep
//!
//! Drains a shared backlog of identifier records (URLs, IBANs, EU VAT IDs)
//! and brings each record's validity status up to date, at bounded cost per
//! run.
//!
//! Validation happens in two phases. The **fast** phase is local: syntax
//! patterns and national checksums. Records that pass become `formal-ok`.
//! The **slow** phase verifies those records externally: URLs are probed
//! concurrently, VAT IDs are submitted as one bulk job per batch to a
//! rate-limited verification service. IBANs are fully decided in the fast
//! phase.
//!
//! ## Quick Start
//!
//! ```rust
//! use idsweep::checks::*;
//!
//! assert!(validate_iban("GB82WEST12345698765432").is_ok());
//! assert!(check_vat_id("ATU13585627").is_ok());
//! assert!(!is_valid_url_syntax(&with_default_scheme("not a url")));
//! ```
//!
//! With the `pipeline` feature, an [`orchestrator::Orchestrator`] drives the
//! validators in a [`validator::Registry`] over any [`store::Store`]:
//!
//! ```ignore
//! let config = Config::load("idsweep.toml")?;
//! let store = JsonFileStore::open("records.json").await?;
//! let registry = Registry::from_config(&config)?;
//! let report = Orchestrator::new(store, registry, BatchSettings::from_config(&config))
//!     .run()
//!     .await?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | (always) | Record model, IBAN / VAT-ID / URL checks |
//! | `pipeline` (default) | Validators, stores, orchestrator, TOML config |
//! | `cli` | The `idsweep` binary |

pub mod checks;
pub mod core;

#[cfg(feature = "pipeline")]
pub mod config;

#[cfg(feature = "pipeline")]
pub mod orchestrator;

#[cfg(feature = "pipeline")]
pub mod store;

#[cfg(feature = "pipeline")]
pub mod validator;

// Re-export core types at crate root for convenience
pub use crate::core::*;
