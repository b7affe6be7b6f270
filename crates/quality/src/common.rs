//! Stock predicates and rule sets.

use crate::rule::{RuleError, ValidationRule, ValidationSeverity};
use regex::Regex;
use serde_json::Value;

fn as_text(value: &Value) -> Result<&str, RuleError> {
    value
        .as_str()
        .ok_or_else(|| RuleError::type_mismatch("string", value))
}

/// Text with at least one non-whitespace character. `null` counts as empty.
pub fn non_empty_text(value: &Value) -> Result<bool, RuleError> {
    if value.is_null() {
        return Ok(false);
    }
    Ok(!as_text(value)?.trim().is_empty())
}

/// Text with at least `min` whitespace-separated words.
pub fn min_words(min: usize) -> impl Fn(&Value) -> Result<bool, RuleError> + Send + Sync + 'static {
    move |value: &Value| -> Result<bool, RuleError> {
        Ok(as_text(value)?.split_whitespace().count() >= min)
    }
}

/// Text containing `keyword`, ignoring case.
pub fn contains_keyword(keyword: &str) -> impl Fn(&Value) -> Result<bool, RuleError> + Send + Sync + 'static {
    let keyword = keyword.to_lowercase();
    move |value: &Value| -> Result<bool, RuleError> {
        Ok(as_text(value)?.to_lowercase().contains(&keyword))
    }
}

/// Text matching a regular expression.
pub fn matches_pattern(
    pattern: &str,
) -> Result<impl Fn(&Value) -> Result<bool, RuleError> + Send + Sync + 'static, regex::Error> {
    let re = Regex::new(pattern)?;
    Ok(move |value: &Value| -> Result<bool, RuleError> { Ok(re.is_match(as_text(value)?)) })
}

/// Object whose `field` is a non-empty array. A missing field counts as empty.
pub fn non_empty_array(field: &str) -> impl Fn(&Value) -> Result<bool, RuleError> + Send + Sync + 'static {
    let field = field.to_string();
    move |value: &Value| -> Result<bool, RuleError> {
        let object = value
            .as_object()
            .ok_or_else(|| RuleError::type_mismatch("object", value))?;
        match object.get(&field) {
            None => Ok(false),
            Some(Value::Array(items)) => Ok(!items.is_empty()),
            Some(other) => Err(RuleError::type_mismatch("array", other)),
        }
    }
}

/// Output rules for the standard pipeline task types, in registration order.
pub fn common_rules() -> Vec<(String, Vec<ValidationRule>)> {
    vec![
        (
            "requirements_spec".to_string(),
            vec![
                ValidationRule::builder("non_empty_requirements")
                    .description("Check if requirements specification is not empty")
                    .error_message("Requirements specification cannot be empty")
                    .severity(ValidationSeverity::Error)
                    .check(non_empty_text)
                    .build(),
                ValidationRule::builder("min_requirements_length")
                    .description("Check if requirements have sufficient detail")
                    .error_message("Requirements specification seems too brief")
                    .severity(ValidationSeverity::Warning)
                    .check(min_words(50))
                    .build(),
            ],
        ),
        (
            "architecture_design".to_string(),
            vec![
                ValidationRule::builder("has_components")
                    .description("Check if architecture design includes component definitions")
                    .error_message("Architecture design must include component definitions")
                    .severity(ValidationSeverity::Error)
                    .check(contains_keyword("components"))
                    .build(),
                ValidationRule::builder("has_interfaces")
                    .description("Check if architecture design includes interface definitions")
                    .error_message("Architecture design should include interface definitions")
                    .severity(ValidationSeverity::Warning)
                    .check(contains_keyword("interface"))
                    .build(),
            ],
        ),
        (
            "code_review".to_string(),
            vec![ValidationRule::builder("has_feedback")
                .description("Check if code review includes specific feedback")
                .error_message("Code review must include specific feedback points")
                .severity(ValidationSeverity::Error)
                .check(non_empty_array("feedback"))
                .build()],
        ),
    ]
}
