//! Rule engine for task inputs and outputs.

use crate::common::common_rules;
use crate::rule::{ValidationIssue, ValidationResult, ValidationRule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Which side of a task a rule guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Payload handed to the task
    Input,
    /// Payload produced by the task
    Output,
}

/// Validator for task inputs and outputs.
///
/// A task type without rules validates trivially.
#[derive(Debug, Clone, Default)]
pub struct TaskValidator {
    input_rules: HashMap<String, Vec<ValidationRule>>,
    output_rules: HashMap<String, Vec<ValidationRule>>,
}

impl TaskValidator {
    /// Create a validator with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with the stock output rules registered.
    pub fn with_common_rules() -> Self {
        let mut validator = Self::new();
        for (task_type, rules) in common_rules() {
            for rule in rules {
                validator.add_output_rule(task_type.clone(), rule);
            }
        }
        validator
    }

    /// Append a rule for a task type and direction.
    pub fn add_rule(&mut self, direction: Direction, task_type: impl Into<String>, rule: ValidationRule) {
        let task_type = task_type.into();
        debug!(?direction, task_type = %task_type, rule = %rule.name, "Added validation rule");
        self.rules_mut(direction)
            .entry(task_type)
            .or_default()
            .push(rule);
    }

    /// Add a validation rule for task input.
    pub fn add_input_rule(&mut self, task_type: impl Into<String>, rule: ValidationRule) {
        self.add_rule(Direction::Input, task_type, rule);
    }

    /// Add a validation rule for task output.
    pub fn add_output_rule(&mut self, task_type: impl Into<String>, rule: ValidationRule) {
        self.add_rule(Direction::Output, task_type, rule);
    }

    /// Rules registered for a task type, in evaluation order.
    pub fn rules_for(&self, direction: Direction, task_type: &str) -> &[ValidationRule] {
        self.rules(direction)
            .get(task_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Validate task input data.
    pub fn validate_input(&self, task_type: &str, input_data: &Value) -> ValidationResult {
        self.validate(Direction::Input, task_type, input_data)
    }

    /// Validate task output data.
    pub fn validate_output(&self, task_type: &str, output_data: &Value) -> ValidationResult {
        self.validate(Direction::Output, task_type, output_data)
    }

    /// Run every rule for the task type; no rule short-circuits the rest.
    ///
    /// A rule returning `Err` becomes a "Validation error: <cause>" entry.
    /// A rule that panics is not contained.
    pub fn validate(&self, direction: Direction, task_type: &str, data: &Value) -> ValidationResult {
        let Some(rules) = self.rules(direction).get(task_type) else {
            return ValidationResult::valid();
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for rule in rules {
            match rule.check(data) {
                Ok(true) => {}
                Ok(false) => {
                    let issue = ValidationIssue {
                        rule_name: rule.name.clone(),
                        message: rule.error_message.clone(),
                    };
                    if rule.severity.is_blocking() {
                        errors.push(issue);
                    } else {
                        warnings.push(issue);
                    }
                }
                Err(e) => {
                    debug!(rule = %rule.name, error = %e, "Validation rule could not evaluate");
                    errors.push(ValidationIssue {
                        rule_name: rule.name.clone(),
                        message: format!("Validation error: {}", e),
                    });
                }
            }
        }

        let result = ValidationResult::from_issues(errors, warnings);
        debug!(
            ?direction,
            task_type = %task_type,
            is_valid = result.is_valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated payload"
        );
        result
    }

    fn rules(&self, direction: Direction) -> &HashMap<String, Vec<ValidationRule>> {
        match direction {
            Direction::Input => &self.input_rules,
            Direction::Output => &self.output_rules,
        }
    }

    fn rules_mut(&mut self, direction: Direction) -> &mut HashMap<String, Vec<ValidationRule>> {
        match direction {
            Direction::Input => &mut self.input_rules,
            Direction::Output => &mut self.output_rules,
        }
    }
}
