//! Constraint validation for property values and action parameters.
//!
//! Every validator turns an untyped wire value (`serde_json::Value`) into a
//! [`ThingValue`] or rejects it. The rule order is the same for every type:
//!
//! 1. nullable + `null` -> `ThingValue::Null`
//! 2. JSON kind must match the expected type
//! 3. parse into the target representation
//! 4. minimum / maximum
//! 5. multipleOf
//! 6. enumeration
//!
//! Only steps 3-6 vary by type. Properties and action parameters share these
//! validators, so the two call sites cannot drift apart.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

mod number;
mod string;
mod temporal;
mod value;

#[cfg(test)]
mod tests;

pub use number::{BooleanValidator, IntegerValidator, NumberValidator, WireFloat, WireInteger};
pub use string::{StringValidator, UuidValidator};
pub use temporal::{format_duration, parse_duration, DateTimeValidator, DurationValidator};
pub use value::ThingValue;

/// Reasons a raw value was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("expected {expected}, got {actual}")]
    WrongKind {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("value cannot be read as {0}")]
    Unparsable(&'static str),

    #[error("value {value} is below minimum {minimum}")]
    BelowMinimum { value: String, minimum: String },

    #[error("value {value} is above maximum {maximum}")]
    AboveMaximum { value: String, maximum: String },

    #[error("value {value} is not a multiple of {multiple_of}")]
    NotMultiple { value: String, multiple_of: String },

    #[error("value {0} is not one of the allowed values")]
    NotInEnumeration(String),

    #[error("length {0} is outside the allowed range")]
    LengthOutOfRange(usize),

    #[error("value does not match pattern '{0}'")]
    PatternMismatch(String),
}

/// A configured, immutable constraint checker
pub trait Validate: Send + Sync + fmt::Debug {
    /// Convert a raw wire value into a typed value, or reject it
    fn validate(&self, raw: &Value) -> Result<ThingValue, ValidationError>;

    /// Whether `null` is an accepted value
    fn is_nullable(&self) -> bool;
}

/// Constraint set shared by the ordered (numeric and temporal) validators
#[derive(Debug, Clone, PartialEq)]
pub struct Constraints<T> {
    pub nullable: bool,
    pub minimum: Option<T>,
    pub maximum: Option<T>,
    pub multiple_of: Option<T>,
    pub enumeration: Vec<T>,
}

impl<T> Default for Constraints<T> {
    fn default() -> Self {
        Self {
            nullable: false,
            minimum: None,
            maximum: None,
            multiple_of: None,
            enumeration: Vec::new(),
        }
    }
}

impl<T> Constraints<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn minimum(mut self, minimum: T) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: T) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn multiple_of(mut self, multiple_of: T) -> Self {
        self.multiple_of = Some(multiple_of);
        self
    }

    pub fn enumeration(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.enumeration = values.into_iter().collect();
        self
    }
}

impl<T: PartialOrd + PartialEq + fmt::Display> Constraints<T> {
    /// Steps 4 and 6; step 5 is type specific and checked by the caller
    fn check_bounds(&self, value: &T) -> Result<(), ValidationError> {
        if let Some(minimum) = &self.minimum {
            if value < minimum {
                return Err(ValidationError::BelowMinimum {
                    value: value.to_string(),
                    minimum: minimum.to_string(),
                });
            }
        }

        if let Some(maximum) = &self.maximum {
            if value > maximum {
                return Err(ValidationError::AboveMaximum {
                    value: value.to_string(),
                    maximum: maximum.to_string(),
                });
            }
        }

        Ok(())
    }

    fn check_enumeration(&self, value: &T) -> Result<(), ValidationError> {
        if !self.enumeration.is_empty() && !self.enumeration.contains(value) {
            return Err(ValidationError::NotInEnumeration(value.to_string()));
        }
        Ok(())
    }
}

/// Name of a JSON value's kind, used in error messages
pub(crate) fn json_kind(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
