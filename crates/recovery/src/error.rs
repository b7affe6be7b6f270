//! Task error records.

use crate::taxonomy::TaskExecutionError;
use chrono::Utc;
use phasewatch_core::{ContextMap, ErrorId, Time};
use serde::{Deserialize, Serialize};

/// Context key under which a failed recovery stores its reason.
pub const RECOVERY_ERROR_KEY: &str = "recovery_error";

/// A logged failure of one pipeline phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskError {
    /// Unique identifier
    pub id: ErrorId,

    /// Task that failed
    pub task_name: String,

    /// What went wrong
    pub error_message: String,

    /// When it happened
    pub timestamp: Time,

    /// Pipeline phase label
    pub phase: String,

    /// Free-form details
    pub context: Option<ContextMap>,

    recovery_attempted: bool,
    #[serde(default)]
    recovery_failure: Option<String>,
}

impl TaskError {
    /// Create a new error record stamped with the system time.
    ///
    /// Components running on an injected clock should use [`TaskError::new_at`].
    pub fn new(
        task_name: impl Into<String>,
        error_message: impl Into<String>,
        phase: impl Into<String>,
    ) -> Self {
        Self::new_at(task_name, error_message, phase, Utc::now())
    }

    /// Create a new error record stamped with `timestamp`.
    pub fn new_at(
        task_name: impl Into<String>,
        error_message: impl Into<String>,
        phase: impl Into<String>,
        timestamp: Time,
    ) -> Self {
        Self {
            id: ErrorId::new(),
            task_name: task_name.into(),
            error_message: error_message.into(),
            timestamp,
            phase: phase.into(),
            context: None,
            recovery_attempted: false,
            recovery_failure: None,
        }
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: Time) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the context map.
    pub fn with_context(mut self, context: ContextMap) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a single context entry.
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context
            .get_or_insert_with(ContextMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Build a record from a raised execution error, stamped with the system time.
    pub fn from_execution_error(phase: impl Into<String>, err: &TaskExecutionError) -> Self {
        Self::from_execution_error_at(phase, err, Utc::now())
    }

    /// Build a record from a raised execution error, stamped with `timestamp`.
    pub fn from_execution_error_at(phase: impl Into<String>, err: &TaskExecutionError, timestamp: Time) -> Self {
        let mut context = err.context();
        context.insert("category".into(), err.category().as_str().into());
        context.insert("severity".into(), err.severity().as_str().into());
        if let Some(hint) = err.recovery_hint() {
            context.insert("recovery_hint".into(), hint.into());
        }
        Self::new_at(err.task_name(), err.to_string(), phase, timestamp).with_context(context)
    }

    /// Whether a recovery strategy has succeeded for this record.
    pub fn recovery_attempted(&self) -> bool {
        self.recovery_attempted
    }

    /// Reason recorded by a failed recovery, if any.
    ///
    /// The reason is also copied into `context` under [`RECOVERY_ERROR_KEY`]
    /// for reporting; editing the context does not change recovery state.
    pub fn recovery_failure(&self) -> Option<&str> {
        self.recovery_failure.as_deref()
    }

    /// A strategy has already run against this record, successfully or not.
    pub fn recovery_exhausted(&self) -> bool {
        self.recovery_attempted || self.recovery_failure().is_some()
    }

    pub(crate) fn mark_recovered(&mut self) {
        self.recovery_attempted = true;
    }

    pub(crate) fn mark_recovery_failed(&mut self, reason: String) {
        self.context
            .get_or_insert_with(ContextMap::new)
            .insert(RECOVERY_ERROR_KEY.to_string(), reason.as_str().into());
        self.recovery_failure = Some(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::ErrorSeverity;

    #[test]
    fn test_new_error_defaults() {
        let err = TaskError::new("architect", "model timed out", "System Architecture Design");
        assert!(!err.recovery_attempted());
        assert!(err.context.is_none());
        assert!(!err.recovery_exhausted());
    }

    #[test]
    fn test_context_entries() {
        let err = TaskError::new("qa", "flaky", "QA Strategy")
            .with_context_entry("attempt", 2)
            .with_context_entry("model", "local");
        let context = err.context.unwrap();
        assert_eq!(context["attempt"], 2);
        assert_eq!(context["model"], "local");
    }

    #[test]
    fn test_failed_recovery_marks_exhausted() {
        let mut err = TaskError::new("qa", "flaky", "QA Strategy");
        err.mark_recovery_failed("still flaky".into());
        assert_eq!(err.recovery_failure(), Some("still flaky"));
        assert!(err.recovery_exhausted());
        assert!(!err.recovery_attempted());
    }

    #[test]
    fn test_failure_reason_is_reported_in_context() {
        let mut err = TaskError::new("qa", "flaky", "QA Strategy");
        err.mark_recovery_failed("still flaky".into());
        assert_eq!(err.context.unwrap()[RECOVERY_ERROR_KEY], "still flaky");
    }

    #[test]
    fn test_context_key_alone_does_not_exhaust() {
        let err = TaskError::new("qa", "flaky", "QA Strategy")
            .with_context_entry(RECOVERY_ERROR_KEY, "copied from upstream");
        assert!(err.recovery_failure().is_none());
        assert!(!err.recovery_exhausted());
    }

    #[test]
    fn test_new_at_uses_given_time() {
        let t0 = Utc::now() - chrono::Duration::hours(2);
        let err = TaskError::new_at("qa", "flaky", "QA Strategy", t0);
        assert_eq!(err.timestamp, t0);

        let raised = TaskExecutionError::validation("bad output", "qa", Default::default());
        let err = TaskError::from_execution_error_at("QA Strategy", &raised, t0);
        assert_eq!(err.timestamp, t0);
        assert_eq!(err.context.unwrap()["category"], "validation_error");
    }

    #[test]
    fn test_from_execution_error() {
        let raised = TaskExecutionError::context_error(
            "missing upstream output",
            "developer",
            vec!["architecture".to_string()],
        )
        .with_severity(ErrorSeverity::Fatal)
        .with_recovery_hint("rerun the architecture phase");

        let err = TaskError::from_execution_error("Development Planning", &raised);
        assert_eq!(err.task_name, "developer");
        assert_eq!(err.error_message, "missing upstream output");
        let context = err.context.unwrap();
        assert_eq!(context["category"], "context_error");
        assert_eq!(context["severity"], "fatal");
        assert_eq!(context["recovery_hint"], "rerun the architecture phase");
        assert_eq!(context["missing_dependencies"][0], "architecture");
    }
}
