//! Constraint checking for populated configuration structs.
//!
//! Rules come from `#[env(validate(...))]` field attributes and are evaluated by
//! [`TagValidator`]. Further checks can be plugged in through the [`Validator`] trait,
//! which is implemented for plain closures.

use crate::field::{Schema, Value};
use crate::EnvConfig;
use colored::Colorize;
use std::fmt;

/// A constraint declared on a field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Rule {
    /// Value must not be the zero value of its kind
    Required,
    /// Numeric lower bound, or minimum character count for text
    Min(f64),
    /// Numeric upper bound, or maximum character count for text
    Max(f64),
    /// Value, in its textual form, must be one of the listed strings
    OneOf(&'static [&'static str]),
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::OneOf(_) => "one_of",
        }
    }

    /// Check `value` against this rule, returning a message on violation
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Rule::Required => {
                if value.is_zero() {
                    Err("is required".to_string())
                } else {
                    Ok(())
                }
            }
            Rule::Min(min) => match magnitude(value) {
                Some(n) if n < *min => Err(format!("must be at least {}{}", min, unit(value))),
                _ => Ok(()),
            },
            Rule::Max(max) => match magnitude(value) {
                Some(n) if n > *max => Err(format!("must be at most {}{}", max, unit(value))),
                _ => Ok(()),
            },
            Rule::OneOf(allowed) => {
                let actual = value.to_string();
                if allowed.iter().any(|a| *a == actual) {
                    Ok(())
                } else {
                    Err(format!("must be one of [{}]", allowed.join(", ")))
                }
            }
        }
    }
}

/// The quantity min/max compare against: the number itself, or the character count
fn magnitude(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        Value::Text(s) => Some(s.chars().count() as f64),
        Value::Bool(_) | Value::Timestamp(_) => None,
    }
}

fn unit(value: &Value) -> &'static str {
    match value {
        Value::Text(_) => " characters",
        _ => "",
    }
}

/// One failed constraint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldViolation {
    pub field: String,
    pub rule: String,
    pub message: String,
}

/// All constraint failures found on a struct
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a single violation
    pub fn field(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut err = Self::new();
        err.push(field, rule, message);
        err
    }

    pub fn push(
        &mut self,
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.violations.push(FieldViolation {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Violations recorded against `field`
    pub fn field_violations(&self, field: &str) -> Vec<&FieldViolation> {
        self.violations.iter().filter(|v| v.field == field).collect()
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validation failed with {} error(s)",
            self.violations.len().to_string().yellow().bold()
        )?;
        for v in &self.violations {
            write!(f, "\n  - {}: {}", v.field.magenta().bold(), v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Checks a populated configuration struct
pub trait Validator<T> {
    fn validate(&self, target: &T) -> Result<(), ValidationError>;
}

impl<T, F> Validator<T> for F
where
    F: Fn(&T) -> Result<(), ValidationError>,
{
    fn validate(&self, target: &T) -> Result<(), ValidationError> {
        self(target)
    }
}

/// Evaluates the rules declared on each field of the schema
#[derive(Debug, Clone, Copy, Default)]
pub struct TagValidator;

impl TagValidator {
    pub fn check<T>(schema: &Schema<T>, target: &T) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();

        for spec in schema.fields() {
            if spec.rules.is_empty() {
                continue;
            }
            let Some(getter) = spec.getter else {
                continue;
            };
            let value = getter(target);
            for rule in &spec.rules {
                if let Err(message) = rule.check(&value) {
                    errors.push(spec.name, rule.name(), message);
                }
            }
        }

        errors.into_result()
    }
}

impl<T: EnvConfig> Validator<T> for TagValidator {
    fn validate(&self, target: &T) -> Result<(), ValidationError> {
        TagValidator::check(&T::schema(), target)
    }
}
