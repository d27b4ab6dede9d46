use super::{json_kind, ThingValue, Validate, ValidationError};
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

/// Validator for plain and enumerated strings
///
/// Strings have no numeric bounds; instead they carry optional length limits
/// (counted in chars) and a pattern that must match the whole value.
#[derive(Debug, Clone, Default)]
pub struct StringValidator {
    nullable: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    enumeration: Vec<String>,
}

impl StringValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Anchors the expression so it must match the entire value
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(Regex::new(&format!("^(?:{})$", pattern))?);
        Ok(self)
    }

    pub fn enumeration<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.enumeration = values.into_iter().map(Into::into).collect();
        self
    }
}

impl Validate for StringValidator {
    fn validate(&self, raw: &Value) -> Result<ThingValue, ValidationError> {
        if self.nullable && raw.is_null() {
            return Ok(ThingValue::Null);
        }

        let Value::String(value) = raw else {
            return Err(ValidationError::WrongKind {
                expected: "string",
                actual: json_kind(raw),
            });
        };

        let length = value.chars().count();
        if self.min_length.is_some_and(|min| length < min)
            || self.max_length.is_some_and(|max| length > max)
        {
            return Err(ValidationError::LengthOutOfRange(length));
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                return Err(ValidationError::PatternMismatch(pattern.as_str().to_string()));
            }
        }

        if !self.enumeration.is_empty() && !self.enumeration.iter().any(|v| v == value) {
            return Err(ValidationError::NotInEnumeration(value.clone()));
        }

        Ok(ThingValue::String(value.clone()))
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Validator for hyphenated UUID strings
#[derive(Debug, Clone, Default)]
pub struct UuidValidator {
    nullable: bool,
    enumeration: Vec<Uuid>,
}

impl UuidValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn enumeration(mut self, values: impl IntoIterator<Item = Uuid>) -> Self {
        self.enumeration = values.into_iter().collect();
        self
    }
}

impl Validate for UuidValidator {
    fn validate(&self, raw: &Value) -> Result<ThingValue, ValidationError> {
        if self.nullable && raw.is_null() {
            return Ok(ThingValue::Null);
        }

        let Value::String(text) = raw else {
            return Err(ValidationError::WrongKind {
                expected: "string",
                actual: json_kind(raw),
            });
        };

        let value = Uuid::parse_str(text).map_err(|_| ValidationError::Unparsable("uuid"))?;

        if !self.enumeration.is_empty() && !self.enumeration.contains(&value) {
            return Err(ValidationError::NotInEnumeration(value.to_string()));
        }

        Ok(ThingValue::Uuid(value))
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }
}
