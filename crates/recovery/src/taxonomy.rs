//! Failure taxonomy raised by pipeline phases.

use phasewatch_core::ContextMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How badly a failure affects the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Does not affect the overall process
    Low,
    /// Might affect quality but does not stop execution
    Medium,
    /// Requires immediate attention
    High,
    /// Forces process termination
    Fatal,
}

impl ErrorSeverity {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Low => "low",
            ErrorSeverity::Medium => "medium",
            ErrorSeverity::High => "high",
            ErrorSeverity::Fatal => "fatal",
        }
    }
}

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Language model failures
    ModelError,
    /// Missing context or dependencies
    ContextError,
    /// Output validation failures
    ValidationError,
    /// System resource issues
    ResourceError,
    /// Execution timeout
    TimeoutError,
    /// Invalid input data
    InputError,
    /// Business logic violations
    LogicError,
}

impl ErrorCategory {
    /// Get string representation.
    ///
    /// Also the label to feed into error-pattern histograms.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ModelError => "model_error",
            ErrorCategory::ContextError => "context_error",
            ErrorCategory::ValidationError => "validation_error",
            ErrorCategory::ResourceError => "resource_error",
            ErrorCategory::TimeoutError => "timeout_error",
            ErrorCategory::InputError => "input_error",
            ErrorCategory::LogicError => "logic_error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant-specific details of an execution error.
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// The model failed to produce usable output
    Model {
        /// Model that was called
        model_name: String,
        /// Prompt details
        prompt_info: ContextMap,
    },
    /// The output failed validation
    Validation {
        /// Rule name to message
        validation_errors: BTreeMap<String, String>,
    },
    /// Upstream context was missing
    Context {
        /// Names of missing dependencies
        missing_dependencies: Vec<String>,
    },
    /// Any other category
    Other {
        /// Category
        category: ErrorCategory,
        /// Free-form details
        context: ContextMap,
    },
}

/// An error raised while executing a task.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TaskExecutionError {
    message: String,
    task_name: String,
    severity: ErrorSeverity,
    kind: ErrorKind,
    recovery_hint: Option<String>,
}

impl TaskExecutionError {
    /// A generic error of the given category, medium severity.
    pub fn new(message: impl Into<String>, task_name: impl Into<String>, category: ErrorCategory) -> Self {
        Self {
            message: message.into(),
            task_name: task_name.into(),
            severity: ErrorSeverity::Medium,
            kind: ErrorKind::Other {
                category,
                context: ContextMap::new(),
            },
            recovery_hint: None,
        }
    }

    /// The model failed to generate valid output. High severity.
    pub fn model(
        message: impl Into<String>,
        task_name: impl Into<String>,
        model_name: impl Into<String>,
        prompt_info: ContextMap,
    ) -> Self {
        Self {
            message: message.into(),
            task_name: task_name.into(),
            severity: ErrorSeverity::High,
            kind: ErrorKind::Model {
                model_name: model_name.into(),
                prompt_info,
            },
            recovery_hint: None,
        }
    }

    /// The task output failed validation. Medium severity.
    pub fn validation(
        message: impl Into<String>,
        task_name: impl Into<String>,
        validation_errors: BTreeMap<String, String>,
    ) -> Self {
        Self {
            message: message.into(),
            task_name: task_name.into(),
            severity: ErrorSeverity::Medium,
            kind: ErrorKind::Validation { validation_errors },
            recovery_hint: None,
        }
    }

    /// Task context or dependencies were missing. High severity.
    pub fn context_error(
        message: impl Into<String>,
        task_name: impl Into<String>,
        missing_dependencies: Vec<String>,
    ) -> Self {
        Self {
            message: message.into(),
            task_name: task_name.into(),
            severity: ErrorSeverity::High,
            kind: ErrorKind::Context { missing_dependencies },
            recovery_hint: None,
        }
    }

    /// Set severity.
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Set a recovery hint.
    pub fn with_recovery_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = Some(hint.into());
        self
    }

    /// Add a context entry. Only generic errors carry free-form context.
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        if let ErrorKind::Other { context, .. } = &mut self.kind {
            context.insert(key.into(), value.into());
        }
        self
    }

    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Task that raised the error.
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    /// Severity.
    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    /// Variant details.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Category derived from the variant.
    pub fn category(&self) -> ErrorCategory {
        match &self.kind {
            ErrorKind::Model { .. } => ErrorCategory::ModelError,
            ErrorKind::Validation { .. } => ErrorCategory::ValidationError,
            ErrorKind::Context { .. } => ErrorCategory::ContextError,
            ErrorKind::Other { category, .. } => *category,
        }
    }

    /// Suggested remedy.
    pub fn recovery_hint(&self) -> Option<&str> {
        self.recovery_hint.as_deref()
    }

    /// Details as a context map.
    pub fn context(&self) -> ContextMap {
        let mut map = ContextMap::new();
        match &self.kind {
            ErrorKind::Model { model_name, prompt_info } => {
                map.insert("model_name".into(), model_name.as_str().into());
                map.insert("prompt_info".into(), prompt_info.clone().into());
            }
            ErrorKind::Validation { validation_errors } => {
                let errors: ContextMap = validation_errors
                    .iter()
                    .map(|(rule, msg)| (rule.clone(), msg.as_str().into()))
                    .collect();
                map.insert("validation_errors".into(), errors.into());
            }
            ErrorKind::Context { missing_dependencies } => {
                map.insert("missing_dependencies".into(), missing_dependencies.clone().into());
            }
            ErrorKind::Other { context, .. } => map.extend(context.clone()),
        }
        map
    }
}
