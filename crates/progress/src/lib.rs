//! Progress Tracking
//!
//! Per-task timing, estimate-vs-actual reporting, and phase estimation.

#![warn(missing_docs)]

pub mod tracker;
pub mod sink;
pub mod manager;
pub mod report;
pub mod estimator;

pub use tracker::{TaskTracker, DEFAULT_PROGRESS_CAP};
pub use sink::{ProgressSink, SinkHandle, SinkError, SinkEvent, NullSink, RecordingSink};
pub use manager::{ProgressManager, ProgressConfig, ProgressError};
pub use report::{DurationReport, ReportEntry, ReportSummary, Deviation};
pub use estimator::{ProjectEstimator, ProjectEstimate, ProjectSize, TechLevel, PhaseEstimate};
