use super::{json_kind, Constraints, ThingValue, Validate, ValidationError};
use serde_json::{Number, Value};
use std::fmt;

/// Integer types accepted on the wire
pub trait WireInteger: Copy + PartialOrd + fmt::Display + fmt::Debug + Send + Sync + 'static {
    const KIND: &'static str;

    /// Read a JSON number, failing on fractions and on values outside the type's range
    fn from_json(raw: &Number) -> Option<Self>;

    fn is_multiple_of(self, multiple_of: Self) -> bool;

    fn into_thing_value(self) -> ThingValue;
}

macro_rules! signed_integer {
    ($($ty:ty),*) => {$(
        impl WireInteger for $ty {
            const KIND: &'static str = stringify!($ty);

            fn from_json(raw: &Number) -> Option<Self> {
                raw.as_i64().and_then(|v| <$ty>::try_from(v).ok())
            }

            fn is_multiple_of(self, multiple_of: Self) -> bool {
                self.checked_rem(multiple_of) == Some(0)
            }

            fn into_thing_value(self) -> ThingValue {
                ThingValue::Integer(i64::from(self))
            }
        }
    )*};
}

macro_rules! unsigned_integer {
    ($($ty:ty),*) => {$(
        impl WireInteger for $ty {
            const KIND: &'static str = stringify!($ty);

            fn from_json(raw: &Number) -> Option<Self> {
                raw.as_u64().and_then(|v| <$ty>::try_from(v).ok())
            }

            fn is_multiple_of(self, multiple_of: Self) -> bool {
                self.checked_rem(multiple_of) == Some(0)
            }

            fn into_thing_value(self) -> ThingValue {
                ThingValue::Unsigned(u64::from(self))
            }
        }
    )*};
}

signed_integer!(i8, i16, i32, i64);
unsigned_integer!(u8, u16, u32, u64);

/// Floating point types accepted on the wire
pub trait WireFloat: Copy + PartialOrd + fmt::Display + fmt::Debug + Send + Sync + 'static {
    const KIND: &'static str;

    fn from_json(raw: &Number) -> Option<Self>;

    fn is_multiple_of(self, multiple_of: Self) -> bool;

    fn into_thing_value(self) -> ThingValue;
}

// multipleOf for floats is computed in the stored type: the quotient
// value / multiple_of must lie within an absolute epsilon of an integer
// (f64 1e-9, f32 1e-5), widened only by the type's own rounding error at
// large magnitudes. A zero or non-finite multiple rejects everything.
macro_rules! wire_float {
    ($($ty:ty => $epsilon:expr),*) => {$(
        impl WireFloat for $ty {
            const KIND: &'static str = stringify!($ty);

            fn from_json(raw: &Number) -> Option<Self> {
                let value = raw.as_f64()? as $ty;
                value.is_finite().then_some(value)
            }

            fn is_multiple_of(self, multiple_of: Self) -> bool {
                if multiple_of == 0.0 || !multiple_of.is_finite() {
                    return false;
                }
                let quotient = self / multiple_of;
                let tolerance = <$ty>::max($epsilon, <$ty>::EPSILON * quotient.abs() * 4.0);
                (quotient - quotient.round()).abs() <= tolerance
            }

            // Widen through the shortest decimal form so 0.1f32 reads back as 0.1
            fn into_thing_value(self) -> ThingValue {
                let widened = self.to_string().parse().unwrap_or(f64::from(self));
                ThingValue::Number(widened)
            }
        }
    )*};
}

wire_float!(f32 => 1e-5, f64 => 1e-9);

/// Validator for integers of any width
#[derive(Debug, Clone, Default)]
pub struct IntegerValidator<T> {
    constraints: Constraints<T>,
}

impl<T: WireInteger> IntegerValidator<T> {
    pub fn new(constraints: Constraints<T>) -> Self {
        Self { constraints }
    }
}

impl<T: WireInteger> Validate for IntegerValidator<T> {
    fn validate(&self, raw: &Value) -> Result<ThingValue, ValidationError> {
        if self.constraints.nullable && raw.is_null() {
            return Ok(ThingValue::Null);
        }

        let Value::Number(number) = raw else {
            return Err(ValidationError::WrongKind {
                expected: "integer",
                actual: json_kind(raw),
            });
        };

        let value = T::from_json(number).ok_or(ValidationError::Unparsable(T::KIND))?;

        self.constraints.check_bounds(&value)?;

        if let Some(multiple_of) = self.constraints.multiple_of {
            if !value.is_multiple_of(multiple_of) {
                return Err(ValidationError::NotMultiple {
                    value: value.to_string(),
                    multiple_of: multiple_of.to_string(),
                });
            }
        }

        self.constraints.check_enumeration(&value)?;

        Ok(value.into_thing_value())
    }

    fn is_nullable(&self) -> bool {
        self.constraints.nullable
    }
}

/// Validator for `f32`/`f64` numbers
#[derive(Debug, Clone, Default)]
pub struct NumberValidator<T> {
    constraints: Constraints<T>,
}

impl<T: WireFloat> NumberValidator<T> {
    pub fn new(constraints: Constraints<T>) -> Self {
        Self { constraints }
    }
}

impl<T: WireFloat> Validate for NumberValidator<T> {
    fn validate(&self, raw: &Value) -> Result<ThingValue, ValidationError> {
        if self.constraints.nullable && raw.is_null() {
            return Ok(ThingValue::Null);
        }

        let Value::Number(number) = raw else {
            return Err(ValidationError::WrongKind {
                expected: "number",
                actual: json_kind(raw),
            });
        };

        let value = T::from_json(number).ok_or(ValidationError::Unparsable(T::KIND))?;

        self.constraints.check_bounds(&value)?;

        if let Some(multiple_of) = self.constraints.multiple_of {
            if !value.is_multiple_of(multiple_of) {
                return Err(ValidationError::NotMultiple {
                    value: value.to_string(),
                    multiple_of: multiple_of.to_string(),
                });
            }
        }

        self.constraints.check_enumeration(&value)?;

        Ok(value.into_thing_value())
    }

    fn is_nullable(&self) -> bool {
        self.constraints.nullable
    }
}

/// Validator for booleans (only the nullable flag applies)
#[derive(Debug, Clone, Default)]
pub struct BooleanValidator {
    nullable: bool,
}

impl BooleanValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

impl Validate for BooleanValidator {
    fn validate(&self, raw: &Value) -> Result<ThingValue, ValidationError> {
        match raw {
            Value::Null if self.nullable => Ok(ThingValue::Null),
            Value::Bool(b) => Ok(ThingValue::Bool(*b)),
            other => Err(ValidationError::WrongKind {
                expected: "boolean",
                actual: json_kind(other),
            }),
        }
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }
}
