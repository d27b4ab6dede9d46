use super::*;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

#[test]
fn test_integer_accepts_value_in_range() {
    let validator = IntegerValidator::new(Constraints::new().minimum(0u8).maximum(100));

    assert_eq!(validator.validate(&json!(42)), Ok(ThingValue::Unsigned(42)));
    assert_eq!(validator.validate(&json!(0)), Ok(ThingValue::Unsigned(0)));
    assert_eq!(validator.validate(&json!(100)), Ok(ThingValue::Unsigned(100)));
}

#[test]
fn test_integer_bounds() {
    let validator = IntegerValidator::new(Constraints::new().minimum(-10i32).maximum(10));

    assert!(matches!(
        validator.validate(&json!(-11)),
        Err(ValidationError::BelowMinimum { .. })
    ));
    assert!(matches!(
        validator.validate(&json!(11)),
        Err(ValidationError::AboveMaximum { .. })
    ));
}

#[test]
fn test_integer_rejects_wrong_kind() {
    let validator = IntegerValidator::<i64>::default();

    assert_eq!(
        validator.validate(&json!("42")),
        Err(ValidationError::WrongKind {
            expected: "integer",
            actual: "string"
        })
    );
    assert!(validator.validate(&json!(true)).is_err());
    assert!(validator.validate(&json!([1])).is_err());
}

#[test]
fn test_integer_rejects_fraction_and_overflow() {
    let byte = IntegerValidator::<u8>::default();
    assert_eq!(byte.validate(&json!(256)), Err(ValidationError::Unparsable("u8")));
    assert_eq!(byte.validate(&json!(-1)), Err(ValidationError::Unparsable("u8")));
    assert_eq!(byte.validate(&json!(1.5)), Err(ValidationError::Unparsable("u8")));

    let short = IntegerValidator::<i16>::default();
    assert_eq!(short.validate(&json!(40000)), Err(ValidationError::Unparsable("i16")));
    assert_eq!(short.validate(&json!(-300)), Ok(ThingValue::Integer(-300)));
}

#[test]
fn test_integer_multiple_of() {
    let validator = IntegerValidator::new(Constraints::new().multiple_of(5i64));

    assert!(validator.validate(&json!(15)).is_ok());
    assert!(validator.validate(&json!(-10)).is_ok());
    assert!(matches!(
        validator.validate(&json!(12)),
        Err(ValidationError::NotMultiple { .. })
    ));
}

#[test]
fn test_integer_enumeration() {
    let validator = IntegerValidator::new(Constraints::new().enumeration([1i64, 2, 3]));

    assert_eq!(validator.validate(&json!(2)), Ok(ThingValue::Integer(2)));
    assert_eq!(
        validator.validate(&json!(4)),
        Err(ValidationError::NotInEnumeration("4".to_string()))
    );
}

#[test]
fn test_nullable_accepts_null() {
    let nullable = IntegerValidator::new(Constraints::<i32>::new().nullable(true).minimum(5));
    assert_eq!(nullable.validate(&json!(null)), Ok(ThingValue::Null));

    let strict = IntegerValidator::new(Constraints::<i32>::new().minimum(5));
    assert_eq!(
        strict.validate(&json!(null)),
        Err(ValidationError::WrongKind {
            expected: "integer",
            actual: "null"
        })
    );
}

#[test]
fn test_rule_order_bounds_before_enumeration() {
    // 20 is both out of range and outside the enumeration; bounds are reported first
    let validator = IntegerValidator::new(
        Constraints::new()
            .maximum(10i64)
            .multiple_of(3)
            .enumeration([1, 2, 3]),
    );

    assert!(matches!(
        validator.validate(&json!(20)),
        Err(ValidationError::AboveMaximum { .. })
    ));
    assert!(matches!(
        validator.validate(&json!(4)),
        Err(ValidationError::NotMultiple { .. })
    ));
    assert!(matches!(
        validator.validate(&json!(6)),
        Err(ValidationError::NotInEnumeration(_))
    ));
}

#[test]
fn test_number_multiple_of_half() {
    let validator = NumberValidator::new(Constraints::new().multiple_of(0.5f64));

    assert_eq!(validator.validate(&json!(1.5)), Ok(ThingValue::Number(1.5)));
    assert!(matches!(
        validator.validate(&json!(1.3)),
        Err(ValidationError::NotMultiple { .. })
    ));
}

#[test]
fn test_number_multiple_of_tolerates_binary_rounding() {
    let validator = NumberValidator::new(Constraints::new().multiple_of(0.1f64));
    assert!(validator.validate(&json!(0.3)).is_ok());
    assert!(validator.validate(&json!(0.35)).is_err());

    let single = NumberValidator::new(Constraints::new().multiple_of(0.1f32));
    assert!(single.validate(&json!(0.3)).is_ok());
    assert!(single.validate(&json!(0.25)).is_err());
}

#[test]
fn test_number_multiple_of_rejects_large_fractions() {
    let single = NumberValidator::new(Constraints::new().multiple_of(0.5f32));
    assert!(single.validate(&json!(60000.3)).is_err());
    assert!(single.validate(&json!(60000.5)).is_ok());

    let whole = NumberValidator::new(Constraints::new().multiple_of(1.0f64));
    assert!(whole.validate(&json!(2000000000.5)).is_err());
    assert!(whole.validate(&json!(2000000000.0)).is_ok());

    let sevenths = NumberValidator::new(Constraints::new().multiple_of(0.7f64));
    assert!(sevenths.validate(&json!(1e12)).is_err());
}

#[test]
fn test_single_precision_reads_back_as_sent() {
    let validator = NumberValidator::<f32>::default();

    let value = validator.validate(&json!(0.1)).unwrap();
    assert_eq!(value, ThingValue::Number(0.1));
    assert_eq!(value.to_json(), json!(0.1));
}

#[test]
fn test_number_accepts_integers_and_checks_bounds() {
    let validator = NumberValidator::new(Constraints::new().minimum(0.0f64).maximum(1.0));

    assert_eq!(validator.validate(&json!(1)), Ok(ThingValue::Number(1.0)));
    assert!(matches!(
        validator.validate(&json!(-0.01)),
        Err(ValidationError::BelowMinimum { .. })
    ));
    assert!(validator.validate(&json!("0.5")).is_err());
}

#[test]
fn test_number_f32_rejects_out_of_range() {
    let validator = NumberValidator::<f32>::default();
    assert_eq!(
        validator.validate(&json!(1e300)),
        Err(ValidationError::Unparsable("f32"))
    );
}

#[test]
fn test_number_enumeration() {
    let validator = NumberValidator::new(Constraints::new().enumeration([1.0f64, 2.5]));
    assert!(validator.validate(&json!(2.5)).is_ok());
    assert!(validator.validate(&json!(2.0)).is_err());
}

#[test]
fn test_boolean() {
    let validator = BooleanValidator::new();
    assert_eq!(validator.validate(&json!(true)), Ok(ThingValue::Bool(true)));
    assert!(validator.validate(&json!(null)).is_err());
    assert!(validator.validate(&json!(1)).is_err());

    let nullable = BooleanValidator::new().nullable(true);
    assert_eq!(nullable.validate(&json!(null)), Ok(ThingValue::Null));
}

#[test]
fn test_string_length_and_pattern() {
    let validator = StringValidator::new()
        .min_length(2)
        .max_length(5)
        .pattern("[a-z]+")
        .unwrap();

    assert_eq!(
        validator.validate(&json!("abc")),
        Ok(ThingValue::String("abc".to_string()))
    );
    assert_eq!(
        validator.validate(&json!("a")),
        Err(ValidationError::LengthOutOfRange(1))
    );
    assert_eq!(
        validator.validate(&json!("abcdef")),
        Err(ValidationError::LengthOutOfRange(6))
    );
    // pattern must match the whole value
    assert!(matches!(
        validator.validate(&json!("ab1")),
        Err(ValidationError::PatternMismatch(_))
    ));
}

#[test]
fn test_string_length_counts_chars() {
    let validator = StringValidator::new().max_length(3);
    assert!(validator.validate(&json!("äöü")).is_ok());
}

#[test]
fn test_enumerated_string() {
    let validator = StringValidator::new().enumeration(["red", "green", "blue"]);

    assert!(validator.validate(&json!("green")).is_ok());
    assert_eq!(
        validator.validate(&json!("purple")),
        Err(ValidationError::NotInEnumeration("purple".to_string()))
    );
    assert!(validator.validate(&json!(1)).is_err());
}

#[test]
fn test_uuid() {
    let id = Uuid::new_v4();
    let validator = UuidValidator::new();

    assert_eq!(
        validator.validate(&json!(id.to_string())),
        Ok(ThingValue::Uuid(id))
    );
    assert_eq!(
        validator.validate(&json!("not-a-uuid")),
        Err(ValidationError::Unparsable("uuid"))
    );

    let restricted = UuidValidator::new().enumeration([id]);
    assert!(restricted
        .validate(&json!(Uuid::new_v4().to_string()))
        .is_err());
}

#[test]
fn test_parse_duration_forms() {
    assert_eq!(parse_duration("00:00:30"), Some(Duration::seconds(30)));
    assert_eq!(parse_duration("01:30"), Some(Duration::minutes(90)));
    assert_eq!(parse_duration("2"), Some(Duration::days(2)));
    assert_eq!(
        parse_duration("1.02:03:04"),
        Some(Duration::days(1) + Duration::hours(2) + Duration::minutes(3) + Duration::seconds(4))
    );
    assert_eq!(
        parse_duration("00:00:01.5"),
        Some(Duration::milliseconds(1500))
    );
    assert_eq!(parse_duration("-00:01:00"), Some(Duration::minutes(-1)));
}

#[test]
fn test_parse_duration_rejects_invalid() {
    assert_eq!(parse_duration(""), None);
    assert_eq!(parse_duration("24:00:00"), None);
    assert_eq!(parse_duration("00:60:00"), None);
    assert_eq!(parse_duration("00:00:00.12345678"), None);
    assert_eq!(parse_duration("1:2:3:4"), None);
    assert_eq!(parse_duration("abc"), None);
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(Duration::seconds(30)), "00:00:30");
    assert_eq!(
        format_duration(Duration::days(1) + Duration::hours(2)),
        "1.02:00:00"
    );
    assert_eq!(
        format_duration(Duration::milliseconds(1500)),
        "00:00:01.5000000"
    );
    assert_eq!(format_duration(Duration::minutes(-1)), "-00:01:00");
}

#[test]
fn test_duration_validator_enumeration() {
    let validator = DurationValidator::new(
        Constraints::new().enumeration([Duration::seconds(30), Duration::minutes(1)]),
    );

    assert_eq!(
        validator.validate(&json!("00:01:00")),
        Ok(ThingValue::Duration(Duration::minutes(1)))
    );
    assert!(matches!(
        validator.validate(&json!("00:02:00")),
        Err(ValidationError::NotInEnumeration(_))
    ));
    assert_eq!(
        validator.validate(&json!(60)),
        Err(ValidationError::WrongKind {
            expected: "string",
            actual: "number"
        })
    );
}

#[test]
fn test_datetime_validator() {
    let minimum = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let validator = DateTimeValidator::new(Constraints::new().minimum(minimum));

    assert_eq!(
        validator.validate(&json!("2024-06-01T12:00:00+02:00")),
        Ok(ThingValue::DateTime(
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
        ))
    );
    assert!(matches!(
        validator.validate(&json!("2023-12-31T23:59:59Z")),
        Err(ValidationError::BelowMinimum { .. })
    ));
    assert_eq!(
        validator.validate(&json!("yesterday")),
        Err(ValidationError::Unparsable("date-time"))
    );
}

#[test]
fn test_validate_is_deterministic() {
    let validator = NumberValidator::new(
        Constraints::new()
            .minimum(-5.0f64)
            .maximum(5.0)
            .multiple_of(0.25),
    );

    for raw in [json!(1.25), json!(1.3), json!(null), json!("x"), json!(6)] {
        let first = validator.validate(&raw);
        for _ in 0..10 {
            assert_eq!(validator.validate(&raw), first);
        }
    }
}

#[test]
fn test_thing_value_to_json() {
    assert_eq!(ThingValue::Null.to_json(), json!(null));
    assert_eq!(ThingValue::Unsigned(7).to_json(), json!(7));
    assert_eq!(ThingValue::Number(0.5).to_json(), json!(0.5));
    assert_eq!(
        ThingValue::Duration(Duration::seconds(90)).to_json(),
        json!("00:01:30")
    );
    assert_eq!(
        ThingValue::DateTime(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()).to_json(),
        json!("2024-06-01T10:00:00Z")
    );
    assert_eq!(
        serde_json::to_value(ThingValue::Bool(true)).unwrap(),
        json!(true)
    );
}
