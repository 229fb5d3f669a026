//! Validation of user-supplied parameter values against a model's
//! declared parameters.
//!
//! All violations are collected and reported together so a submitter can
//! fix a payload in one round trip rather than one error at a time.

use std::collections::BTreeMap;

use crate::model::{Model, Parameter, ParameterType};
use crate::template::render_value;

/// A single parameter validation violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterViolation {
    pub name: String,
    pub message: String,
}

impl std::fmt::Display for ParameterViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Validate `values` against the parameters `model` declares.
///
/// Checks, per value: the name is declared somewhere in the model; the
/// value matches the declared type; numeric values respect `min`/`max`;
/// and the value is one of `choices` when choices are declared. Returns
/// every violation found, or an empty vec when the payload is valid.
///
/// Missing values are not violations here; substitution falls back to
/// defaults and raises its own error when neither exists.
pub fn validate_values(
    model: &Model,
    values: &BTreeMap<String, serde_json::Value>,
) -> Vec<ParameterViolation> {
    let declared: BTreeMap<&str, &Parameter> = model
        .declared_parameters()
        .map(|p| (p.name.as_str(), p))
        .collect();

    let mut violations = Vec::new();

    for (name, value) in values {
        let Some(param) = declared.get(name.as_str()) else {
            violations.push(ParameterViolation {
                name: name.clone(),
                message: "model does not declare a parameter with this name".to_string(),
            });
            continue;
        };

        if let Some(message) = check_value(param, value) {
            violations.push(ParameterViolation {
                name: name.clone(),
                message,
            });
        }
    }

    violations
}

/// Check one value against one declared parameter. Returns a violation
/// message, or `None` when the value is acceptable.
fn check_value(param: &Parameter, value: &serde_json::Value) -> Option<String> {
    match param.parameter_type {
        ParameterType::Str => {
            if !value.is_string() {
                return Some(format!("expected a string, got {value}"));
            }
        }
        ParameterType::Int => {
            if !value.is_i64() && !value.is_u64() {
                return Some(format!("expected an integer, got {value}"));
            }
        }
        ParameterType::Float => {
            if !value.is_number() {
                return Some(format!("expected a number, got {value}"));
            }
        }
        ParameterType::Bool => {
            if !value.is_boolean() {
                return Some(format!("expected a boolean, got {value}"));
            }
        }
    }

    if let Some(number) = value.as_f64() {
        if let Some(min) = param.min {
            if number < min {
                return Some(format!("value {number} is below the minimum {min}"));
            }
        }
        if let Some(max) = param.max {
            if number > max {
                return Some(format!("value {number} is above the maximum {max}"));
            }
        }
    }

    if let Some(choices) = &param.choices {
        // Choices are compared by rendered form so "5" and 5 line up the
        // way they do in the substituted command line.
        let rendered = render_value(value);
        if !choices.iter().any(|c| render_value(c) == rendered) {
            return Some(format!(
                "value {rendered} is not one of the declared choices"
            ));
        }
    }

    None
}
