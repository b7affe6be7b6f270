//! Quality Assurance
//!
//! Severity-tagged validation rules gating task inputs and outputs.

#![warn(missing_docs)]

pub mod rule;
pub mod validator;
pub mod common;

pub use rule::{
    RuleError, ValidationIssue, ValidationResult, ValidationRule, ValidationRuleBuilder,
    ValidationSeverity,
};
pub use validator::{Direction, TaskValidator};
pub use common::common_rules;
