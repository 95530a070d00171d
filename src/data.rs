use std::{fmt, str::FromStr, sync::OnceLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::{Decimal, prelude::ToPrimitive};

/// A single typed cell. Missing cells are represented as `None` at the table level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Decimal(d) => d.normalize().to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            Value::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Wraps a parsed timestamp, collapsing midnight values to plain dates.
pub fn temporal_value(parsed: NaiveDateTime) -> Value {
    if parsed.time() == NaiveTime::MIN {
        Value::Date(parsed.date())
    } else {
        Value::DateTime(parsed)
    }
}

/// Parses a number the way a spreadsheet export writes it: plain or
/// scientific notation, optional sign, surrounding whitespace ignored.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Parses an integer, accepting integral decimals such as `3.0`.
pub fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    parse_decimal(trimmed).and_then(integral_decimal)
}

pub fn integral_decimal(value: Decimal) -> Option<i64> {
    if value.fract().is_zero() {
        value.to_i64()
    } else {
        None
    }
}

/// Tolerant decimal coercion: anything that is not a number becomes missing.
pub fn coerce_decimal(cell: Option<&Value>) -> Option<Value> {
    match cell? {
        Value::Decimal(d) => Some(Value::Decimal(*d)),
        Value::Integer(i) => Some(Value::Decimal(Decimal::from(*i))),
        Value::Text(s) => parse_decimal(s).map(Value::Decimal),
        Value::Date(_) | Value::DateTime(_) => None,
    }
}

/// Tolerant integer coercion: non-integral or non-numeric values become missing.
pub fn coerce_integer(cell: Option<&Value>) -> Option<Value> {
    match cell? {
        Value::Integer(i) => Some(Value::Integer(*i)),
        Value::Decimal(d) => integral_decimal(*d).map(Value::Integer),
        Value::Text(s) => parse_integer(s).map(Value::Integer),
        Value::Date(_) | Value::DateTime(_) => None,
    }
}

fn numeric_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(\d{1,4})[/.\-](\d{1,2})[/.\-](\d{1,4})(?:[ T]+(\d{1,2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?)?$",
        )
        .expect("numeric date pattern is valid")
    })
}

const NAMED_MONTH_FORMATS: &[&str] = &[
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%d-%b-%y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Parses a date or timestamp written in any of the supported textual layouts.
///
/// Year-first layouts are taken as `Y-M-D`. Other all-numeric layouts are read
/// day-first, falling back to month-first only when the day-first reading is
/// not a real calendar date.
pub fn parse_day_first(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(caps) = numeric_date_pattern().captures(trimmed) {
        let first = &caps[1];
        let second: u32 = caps[2].parse().ok()?;
        let third = &caps[3];
        let date = if first.len() == 4 {
            if third.len() > 2 {
                return None;
            }
            NaiveDate::from_ymd_opt(first.parse().ok()?, second, third.parse().ok()?)?
        } else {
            if first.len() > 2 || !matches!(third.len(), 2 | 4) {
                return None;
            }
            let year = expand_year(third)?;
            let leading: u32 = first.parse().ok()?;
            NaiveDate::from_ymd_opt(year, second, leading)
                .or_else(|| NaiveDate::from_ymd_opt(year, leading, second))?
        };
        let time = match caps.get(4) {
            Some(hour) => {
                let minute = caps.get(5).map_or("0", |m| m.as_str());
                let second = caps.get(6).map_or("0", |m| m.as_str());
                NaiveTime::from_hms_opt(
                    hour.as_str().parse().ok()?,
                    minute.parse().ok()?,
                    second.parse().ok()?,
                )?
            }
            None => NaiveTime::MIN,
        };
        return Some(date.and_time(time));
    }
    NAMED_MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

// Two-digit years pivot like strptime's %y: 69-99 -> 19xx, 00-68 -> 20xx.
fn expand_year(token: &str) -> Option<i32> {
    let value: i32 = token.parse().ok()?;
    if token.len() == 4 {
        Some(value)
    } else if value >= 69 {
        Some(1900 + value)
    } else {
        Some(2000 + value)
    }
}
