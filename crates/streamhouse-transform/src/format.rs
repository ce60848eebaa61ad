//! Rendering leaf values as CSV cell text.

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

use crate::error::{Result, TransformError};
use crate::value::{mismatch, Value};

/// Pattern used for every rendered timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output interpretation assigned to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Plain,
    /// Whole seconds since the Unix epoch.
    Timestamp,
}

impl DeclaredType {
    /// `timestamp` (case-insensitive) selects `Timestamp`, anything else is `Plain`.
    pub fn from_str_config(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("timestamp") {
            DeclaredType::Timestamp
        } else {
            DeclaredType::Plain
        }
    }
}

/// Time zone timestamps are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZoneSpec {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl TimeZoneSpec {
    pub fn utc() -> Self {
        TimeZoneSpec::Fixed(Utc.fix())
    }

    /// Parse `local`, `UTC`/`Z`, or a fixed offset like `+08:00`, `-0530`, `+02`.
    pub fn from_str_config(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") {
            return Ok(TimeZoneSpec::Local);
        }
        if s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
            return Ok(Self::utc());
        }

        let invalid = || TransformError::Config(format!("invalid timezone: '{}'", s));

        let (sign, digits) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => return Err(invalid()),
        };
        let digits = digits.replace(':', "");
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let (hours, minutes) = match digits.len() {
            2 => (&digits[..2], "0"),
            4 => (&digits[..2], &digits[2..]),
            _ => return Err(invalid()),
        };
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(TimeZoneSpec::Fixed)
            .ok_or_else(invalid)
    }

    fn render(&self, utc: DateTime<Utc>) -> String {
        match self {
            TimeZoneSpec::Local => utc.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
            TimeZoneSpec::Fixed(offset) => {
                utc.with_timezone(offset).format(TIMESTAMP_FORMAT).to_string()
            }
        }
    }
}

/// Render `value` as cell text according to `declared`.
///
/// Null renders as an empty cell for either declared type.
pub fn format_field(value: &Value, declared: DeclaredType, tz: &TimeZoneSpec) -> Result<String> {
    match (declared, value) {
        (_, Value::Null) => Ok(String::new()),
        (DeclaredType::Timestamp, Value::Int(secs)) => format_timestamp(*secs, tz),
        (DeclaredType::Timestamp, other) => Err(mismatch("int", other)),
        (DeclaredType::Plain, plain) => Ok(format_plain(plain)),
    }
}

/// Render whole seconds since the epoch as `YYYY-MM-DD HH:MM:SS` in `tz`.
pub fn format_timestamp(secs: i64, tz: &TimeZoneSpec) -> Result<String> {
    let utc = DateTime::<Utc>::from_timestamp(secs, 0).ok_or(TransformError::TypeMismatch {
        expected: "timestamp within range",
        actual: "int",
    })?;
    Ok(tz.render(utc))
}

fn format_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Text(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_json().to_string(),
    }
}

/// Reduce a byte sequence to its first byte, rendered as a one-character string.
pub fn format_first_byte(value: &Value) -> Result<String> {
    let bytes = value.as_bytes()?;
    bytes
        .first()
        .map(|b| char::from(*b).to_string())
        .ok_or(TransformError::TypeMismatch {
            expected: "non-empty bytes",
            actual: "bytes",
        })
}
