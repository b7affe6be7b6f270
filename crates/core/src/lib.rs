//! Phasewatch core types.
//!
//! Shared vocabulary for the observability crates: timestamps, the clock
//! seam every time-sensitive component is built with, and identifiers.

#![warn(missing_docs)]

// Core identities
mod id;

// Time
mod clock;

// Re-exports
pub use id::*;
pub use clock::{seconds_between, Clock, ManualClock, SystemClock};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// Free-form context attached to errors and records.
pub type ContextMap = serde_json::Map<String, serde_json::Value>;
