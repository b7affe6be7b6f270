//! Validation rules and results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Failure of a predicate to evaluate at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuleError {
    /// The payload has the wrong shape
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// What the rule needs
        expected: &'static str,
        /// What the payload holds
        found: &'static str,
    },

    /// A required field is absent
    #[error("missing field: {0}")]
    MissingField(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl RuleError {
    /// Type mismatch against a concrete payload.
    pub fn type_mismatch(expected: &'static str, found: &Value) -> Self {
        RuleError::TypeMismatch {
            expected,
            found: json_type(found),
        }
    }
}

/// JSON type name of a value.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// How serious a failed rule is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    /// Noted, does not invalidate the result
    Warning,
    /// Invalidates the result
    Error,
    /// Affects the entire process
    Critical,
}

impl ValidationSeverity {
    /// Whether a violation at this severity makes the payload invalid.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, ValidationSeverity::Warning)
    }
}

type Predicate = Arc<dyn Fn(&Value) -> Result<bool, RuleError> + Send + Sync>;

/// A named, severity-tagged check over a payload.
#[derive(Clone)]
pub struct ValidationRule {
    /// Rule name
    pub name: String,
    /// What the rule checks
    pub description: String,
    /// Message reported when the check fails
    pub error_message: String,
    /// Severity of a failure
    pub severity: ValidationSeverity,
    predicate: Predicate,
}

impl ValidationRule {
    /// Create a rule.
    ///
    /// A predicate reports that it cannot evaluate a payload by returning
    /// `Err`; the validator turns that into an error entry. Panics are not
    /// caught and unwind through validation.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        error_message: impl Into<String>,
        severity: ValidationSeverity,
        predicate: F,
    ) -> Self
    where
        F: Fn(&Value) -> Result<bool, RuleError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            error_message: error_message.into(),
            severity,
            predicate: Arc::new(predicate),
        }
    }

    /// Start building a rule.
    pub fn builder(name: impl Into<String>) -> ValidationRuleBuilder {
        ValidationRuleBuilder::new(name)
    }

    /// Evaluate the predicate. A panicking predicate panics here.
    pub fn check(&self, data: &Value) -> Result<bool, RuleError> {
        (self.predicate)(data)
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("error_message", &self.error_message)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

fn always_true(_: &Value) -> Result<bool, RuleError> {
    Ok(true)
}

/// Builder for [`ValidationRule`].
pub struct ValidationRuleBuilder {
    name: String,
    description: String,
    error_message: Option<String>,
    severity: ValidationSeverity,
    predicate: Predicate,
}

impl ValidationRuleBuilder {
    /// Create a new builder. Defaults to error severity and an always-true check.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            error_message: None,
            severity: ValidationSeverity::Error,
            predicate: Arc::new(always_true),
        }
    }

    /// Set description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set the failure message.
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Set severity.
    pub fn severity(mut self, severity: ValidationSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the predicate.
    pub fn check<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, RuleError> + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }

    /// Build the rule. Without a message, the failure reads "<name> failed".
    pub fn build(self) -> ValidationRule {
        let error_message = self
            .error_message
            .unwrap_or_else(|| format!("{} failed", self.name));
        ValidationRule {
            name: self.name,
            description: self.description,
            error_message,
            severity: self.severity,
            predicate: self.predicate,
        }
    }
}

/// One violation in a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Rule that failed
    pub rule_name: String,
    /// Failure message
    pub message: String,
}

/// Result of validating a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no error or critical rule failed
    pub is_valid: bool,
    /// Blocking violations in rule order
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking violations in rule order
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// A result with no violations.
    pub fn valid() -> Self {
        Self::from_issues(Vec::new(), Vec::new())
    }

    /// Build a result; validity follows from `errors`.
    pub fn from_issues(errors: Vec<ValidationIssue>, warnings: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let rule = ValidationRule::builder("anything").build();
        assert_eq!(rule.severity, ValidationSeverity::Error);
        assert_eq!(rule.error_message, "anything failed");
        assert!(rule.check(&json!(null)).unwrap());
    }

    #[test]
    fn test_builder_sets_predicate() {
        let rule = ValidationRule::builder("positive")
            .description("number must be positive")
            .error_message("not positive")
            .severity(ValidationSeverity::Critical)
            .check(|v| {
                v.as_f64()
                    .map(|n| n > 0.0)
                    .ok_or_else(|| RuleError::type_mismatch("number", v))
            })
            .build();

        assert!(rule.check(&json!(3)).unwrap());
        assert!(!rule.check(&json!(-1)).unwrap());
        let err = rule.check(&json!("x")).unwrap_err();
        assert_eq!(err.to_string(), "expected number, found string");
    }

    #[test]
    fn test_severity_blocking() {
        assert!(!ValidationSeverity::Warning.is_blocking());
        assert!(ValidationSeverity::Error.is_blocking());
        assert!(ValidationSeverity::Critical.is_blocking());
    }

    #[test]
    fn test_debug_omits_predicate() {
        let rule = ValidationRule::builder("named").build();
        let debug = format!("{:?}", rule);
        assert!(debug.contains("named"));
    }
}
