//! Presentation of scan outcomes
//!
//! The scan engine hands every attempt to a [`Reporter`]; the reporter alone
//! decides what is shown and how.

pub mod jsonl;
pub mod text;

use crate::models::ProbeOutcome;

pub use jsonl::JsonLinesReporter;
pub use text::TextReporter;

/// Receives every probe outcome, hit or miss
pub trait Reporter: Send + Sync {
    fn report(&self, outcome: &ProbeOutcome);
}
