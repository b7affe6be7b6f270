//! Error Handling & Recovery
//!
//! An append-only log of task failures, the failure taxonomy phases raise,
//! and single-shot recovery strategies registered per task.

#![warn(missing_docs)]

pub mod error;
pub mod taxonomy;
pub mod handler;

pub use error::{TaskError, RECOVERY_ERROR_KEY};
pub use taxonomy::{ErrorCategory, ErrorKind, ErrorSeverity, TaskExecutionError};
pub use handler::{
    ErrorHandler, ErrorSummary, PhaseErrorEntry, RecoveryCounts, RecoveryOutcome, RecoveryStrategy,
};
