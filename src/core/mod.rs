//! Record model, pipeline phases, and run-level errors.
//!
//! A [`Record`] lives only for the duration of one batch: it is fetched from
//! the store, mutated by exactly one validator call, and handed back.

mod error;
mod phase;
mod record;

pub use error::*;
pub use phase::*;
pub use record::*;
