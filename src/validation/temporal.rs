use super::{json_kind, Constraints, ThingValue, Validate, ValidationError};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// Validator for time-span strings such as `"01:30:00"` or `"2.00:00:05.5"`
///
/// `multiple_of` has no meaning for temporal values and is not checked.
#[derive(Debug, Clone, Default)]
pub struct DurationValidator {
    constraints: Constraints<Duration>,
}

impl DurationValidator {
    pub fn new(constraints: Constraints<Duration>) -> Self {
        Self { constraints }
    }
}

impl Validate for DurationValidator {
    fn validate(&self, raw: &Value) -> Result<ThingValue, ValidationError> {
        if self.constraints.nullable && raw.is_null() {
            return Ok(ThingValue::Null);
        }

        let Value::String(text) = raw else {
            return Err(ValidationError::WrongKind {
                expected: "string",
                actual: json_kind(raw),
            });
        };

        let value = parse_duration(text).ok_or(ValidationError::Unparsable("duration"))?;

        self.constraints.check_bounds(&value)?;
        self.constraints.check_enumeration(&value)?;

        Ok(ThingValue::Duration(value))
    }

    fn is_nullable(&self) -> bool {
        self.constraints.nullable
    }
}

/// Validator for RFC 3339 date-time strings, normalized to UTC
///
/// `multiple_of` has no meaning for temporal values and is not checked.
#[derive(Debug, Clone, Default)]
pub struct DateTimeValidator {
    constraints: Constraints<DateTime<Utc>>,
}

impl DateTimeValidator {
    pub fn new(constraints: Constraints<DateTime<Utc>>) -> Self {
        Self { constraints }
    }
}

impl Validate for DateTimeValidator {
    fn validate(&self, raw: &Value) -> Result<ThingValue, ValidationError> {
        if self.constraints.nullable && raw.is_null() {
            return Ok(ThingValue::Null);
        }

        let Value::String(text) = raw else {
            return Err(ValidationError::WrongKind {
                expected: "string",
                actual: json_kind(raw),
            });
        };

        let value = DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ValidationError::Unparsable("date-time"))?;

        self.constraints.check_bounds(&value)?;
        self.constraints.check_enumeration(&value)?;

        Ok(ThingValue::DateTime(value))
    }

    fn is_nullable(&self) -> bool {
        self.constraints.nullable
    }
}

/// Parse a time span in `[-][d.]hh:mm[:ss[.fffffff]]` form, or a bare day count
///
/// Hours must be below 24, minutes and seconds below 60, and the fraction has
/// at most seven digits (100ns ticks).
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (days, clock) = match body.find(':') {
        None => (parse_digits(body)?, None),
        Some(colon) => match body[..colon].find('.') {
            Some(dot) => (parse_digits(&body[..dot])?, Some(&body[dot + 1..])),
            None => (0, Some(body)),
        },
    };

    let mut total = Duration::try_days(days)?;

    if let Some(clock) = clock {
        let mut parts = clock.split(':');
        let hours = parse_digits(parts.next()?)?;
        let minutes = parse_digits(parts.next()?)?;
        let (seconds, nanos) = match parts.next() {
            Some(part) => parse_seconds(part)?,
            None => (0, 0),
        };

        if parts.next().is_some() || hours > 23 || minutes > 59 || seconds > 59 {
            return None;
        }

        total = total
            .checked_add(&Duration::hours(hours))?
            .checked_add(&Duration::minutes(minutes))?
            .checked_add(&Duration::seconds(seconds))?
            .checked_add(&Duration::nanoseconds(nanos))?;
    }

    Some(if negative { -total } else { total })
}

/// Render a duration in the constant `[-][d.]hh:mm:ss[.fffffff]` form
pub fn format_duration(duration: Duration) -> String {
    let sign = if duration < Duration::zero() { "-" } else { "" };
    let duration = duration.abs();

    let total_seconds = duration.num_seconds();
    let ticks = duration.subsec_nanos() / 100;

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let day_part = if days > 0 {
        format!("{}.", days)
    } else {
        String::new()
    };
    let tick_part = if ticks > 0 {
        format!(".{:07}", ticks)
    } else {
        String::new()
    };

    format!(
        "{}{}{:02}:{:02}:{:02}{}",
        sign, day_part, hours, minutes, seconds, tick_part
    )
}

fn parse_digits(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Seconds with an optional fraction; returns (seconds, nanoseconds)
fn parse_seconds(text: &str) -> Option<(i64, i64)> {
    match text.split_once('.') {
        None => Some((parse_digits(text)?, 0)),
        Some((seconds, fraction)) => {
            if fraction.len() > 7 {
                return None;
            }
            let ticks = parse_digits(fraction)? * 10_i64.pow(7 - fraction.len() as u32);
            Some((parse_digits(seconds)?, ticks * 100))
        }
    }
}
