use super::temporal::format_duration;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use uuid::Uuid;

/// Typed value produced by a successful validation
#[derive(Debug, Clone, PartialEq)]
pub enum ThingValue {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Number(f64),
    String(String),
    Duration(Duration),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
}

impl ThingValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ThingValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ThingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of `Integer` and in-range `Unsigned` values
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ThingValue::Integer(v) => Some(*v),
            ThingValue::Unsigned(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ThingValue::Unsigned(v) => Some(*v),
            ThingValue::Integer(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Numeric view of any integer or floating value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ThingValue::Number(v) => Some(*v),
            ThingValue::Integer(v) => Some(*v as f64),
            ThingValue::Unsigned(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ThingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            ThingValue::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            ThingValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            ThingValue::Uuid(id) => Some(*id),
            _ => None,
        }
    }

    /// Wire representation, as sent to subscribers and HTTP clients
    pub fn to_json(&self) -> Value {
        match self {
            ThingValue::Null => Value::Null,
            ThingValue::Bool(b) => Value::Bool(*b),
            ThingValue::Integer(v) => Value::from(*v),
            ThingValue::Unsigned(v) => Value::from(*v),
            ThingValue::Number(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            ThingValue::String(s) => Value::String(s.clone()),
            ThingValue::Duration(d) => Value::String(format_duration(*d)),
            ThingValue::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            ThingValue::Uuid(id) => Value::String(id.to_string()),
        }
    }
}

impl Serialize for ThingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<ThingValue> for Value {
    fn from(value: ThingValue) -> Self {
        value.to_json()
    }
}
