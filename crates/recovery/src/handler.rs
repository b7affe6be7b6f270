//! Error log and recovery execution.

use crate::error::TaskError;
use indexmap::IndexMap;
use phasewatch_core::ErrorId;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A remedy registered for a task.
///
/// Returning `Err` means the remedy itself failed.
pub trait RecoveryStrategy: Send + Sync {
    /// Try to remediate `error`.
    fn recover(&self, error: &TaskError) -> anyhow::Result<()>;
}

impl<F> RecoveryStrategy for F
where
    F: Fn(&TaskError) -> anyhow::Result<()> + Send + Sync,
{
    fn recover(&self, error: &TaskError) -> anyhow::Result<()> {
        self(error)
    }
}

/// What happened when recovery was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The strategy ran and succeeded
    Recovered,
    /// The strategy ran and failed
    Failed(String),
    /// No strategy is registered for the task
    NoStrategy,
    /// A strategy already ran against this error
    AlreadyAttempted,
    /// The error id is not in the log
    UnknownError,
}

impl RecoveryOutcome {
    /// Whether recovery succeeded.
    pub fn succeeded(&self) -> bool {
        matches!(self, RecoveryOutcome::Recovered)
    }
}

/// One error as listed in a phase group.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseErrorEntry {
    /// Task name
    pub task: String,
    /// Error message
    pub message: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Recovery counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryCounts {
    /// Errors whose recovery succeeded
    pub attempted: usize,
    /// Errors whose recovery strategy failed
    pub failed: usize,
    /// All errors
    pub total: usize,
}

/// Summary of every logged error.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    /// Number of logged errors
    pub total_errors: usize,
    /// Errors grouped by phase, phases in first-seen order
    pub errors_by_phase: IndexMap<String, Vec<PhaseErrorEntry>>,
    /// Recovery counters
    pub recovery_attempts: RecoveryCounts,
}

/// Append-only error log with per-task recovery strategies.
#[derive(Default)]
pub struct ErrorHandler {
    errors: Vec<TaskError>,
    recovery_strategies: HashMap<String, Box<dyn RecoveryStrategy>>,
}

impl ErrorHandler {
    /// Create an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error to the log.
    pub fn log_error(&mut self, error: TaskError) -> ErrorId {
        debug!(
            task = %error.task_name,
            phase = %error.phase,
            message = %error.error_message,
            "Logged task error"
        );
        let id = error.id;
        self.errors.push(error);
        id
    }

    /// Every logged error in insertion order.
    pub fn errors(&self) -> &[TaskError] {
        &self.errors
    }

    /// Look up a logged error.
    pub fn get_error(&self, id: ErrorId) -> Option<&TaskError> {
        self.errors.iter().find(|e| e.id == id)
    }

    /// All errors for a task in insertion order.
    pub fn get_task_errors(&self, task_name: &str) -> Vec<&TaskError> {
        self.errors
            .iter()
            .filter(|e| e.task_name == task_name)
            .collect()
    }

    /// Register the strategy for a task, replacing any previous one.
    pub fn add_recovery_strategy(&mut self, task_name: impl Into<String>, strategy: impl RecoveryStrategy + 'static) {
        let task_name = task_name.into();
        if self
            .recovery_strategies
            .insert(task_name.clone(), Box::new(strategy))
            .is_some()
        {
            debug!(task = %task_name, "Replaced recovery strategy");
        }
    }

    /// Whether a strategy is registered for a task.
    pub fn has_recovery_strategy(&self, task_name: &str) -> bool {
        self.recovery_strategies.contains_key(task_name)
    }

    /// Run the task's strategy against a logged error, at most once.
    pub fn attempt_recovery(&mut self, task_name: &str, error_id: ErrorId) -> RecoveryOutcome {
        let Some(error) = self.errors.iter_mut().find(|e| e.id == error_id) else {
            return RecoveryOutcome::UnknownError;
        };
        run_strategy(&self.recovery_strategies, task_name, error)
    }

    /// Run the task's strategy against a caller-held error, at most once.
    pub fn attempt_recovery_on(&self, task_name: &str, error: &mut TaskError) -> RecoveryOutcome {
        run_strategy(&self.recovery_strategies, task_name, error)
    }

    /// Totals, per-phase grouping, and recovery counters.
    pub fn get_error_summary(&self) -> ErrorSummary {
        let mut errors_by_phase: IndexMap<String, Vec<PhaseErrorEntry>> = IndexMap::new();
        let mut counts = RecoveryCounts {
            total: self.errors.len(),
            ..Default::default()
        };

        for error in &self.errors {
            errors_by_phase
                .entry(error.phase.clone())
                .or_default()
                .push(PhaseErrorEntry {
                    task: error.task_name.clone(),
                    message: error.error_message.clone(),
                    timestamp: error.timestamp.to_rfc3339(),
                });
            if error.recovery_attempted() {
                counts.attempted += 1;
            } else if error.recovery_failure().is_some() {
                counts.failed += 1;
            }
        }

        ErrorSummary {
            total_errors: self.errors.len(),
            errors_by_phase,
            recovery_attempts: counts,
        }
    }
}

fn run_strategy(
    strategies: &HashMap<String, Box<dyn RecoveryStrategy>>,
    task_name: &str,
    error: &mut TaskError,
) -> RecoveryOutcome {
    let Some(strategy) = strategies.get(task_name) else {
        return RecoveryOutcome::NoStrategy;
    };
    if error.recovery_exhausted() {
        debug!(task = %task_name, error_id = %error.id, "Recovery already attempted");
        return RecoveryOutcome::AlreadyAttempted;
    }

    match strategy.recover(error) {
        Ok(()) => {
            error.mark_recovered();
            info!(task = %task_name, error_id = %error.id, "Recovered from task error");
            RecoveryOutcome::Recovered
        }
        Err(e) => {
            let reason = e.to_string();
            warn!(task = %task_name, error_id = %error.id, reason = %reason, "Recovery strategy failed");
            error.mark_recovery_failed(reason.clone());
            RecoveryOutcome::Failed(reason)
        }
    }
}
