//! Timestamp normalisation.
//!
//! Every timestamp in the target store is an integer number of seconds since
//! the Unix epoch. Legacy sources hand us seconds, milliseconds, `{seconds}`
//! wrapper objects, ISO-8601 strings and `DD/MM/YY[YY][ HH:mm]` strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};

/// Integers above this are milliseconds, not seconds. 1e10 seconds is the
/// year 2286.
pub const MILLIS_THRESHOLD: i64 = 10_000_000_000;

const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M",
];

/// Normalise any supported timestamp shape to integer seconds.
///
/// Returns `None` for values that are not timestamps at all. Fractional
/// seconds are truncated. Strings without an offset are read as UTC.
pub fn normalize_timestamp(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => from_number(n),
    Value::String(s) => from_str(s.trim()),
    Value::Object(map) => map
      .get("seconds")
      .or_else(|| map.get("_seconds"))
      .and_then(Value::as_number)
      .and_then(from_number),
    _ => None,
  }
}

fn from_number(n: &Number) -> Option<i64> {
  let raw = match n.as_i64() {
    Some(i) => i,
    None => n.as_f64().filter(|f| f.is_finite())?.trunc() as i64,
  };
  Some(from_integer(raw))
}

fn from_integer(raw: i64) -> i64 {
  if raw > MILLIS_THRESHOLD { raw / 1000 } else { raw }
}

fn from_str(s: &str) -> Option<i64> {
  if s.is_empty() {
    return None;
  }

  if let Ok(raw) = s.parse::<i64>() {
    return Some(from_integer(raw));
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.timestamp());
  }

  for format in NAIVE_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
      return Some(dt.and_utc().timestamp());
    }
  }

  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp());
  }

  from_day_month_year(s)
}

/// `DD/MM/YY`, `DD/MM/YYYY`, optionally followed by ` HH:mm` or ` HH:mm:ss`.
/// Two-digit years are 20YY.
fn from_day_month_year(s: &str) -> Option<i64> {
  let mut parts = s.split_whitespace();
  let date = parts.next()?;
  let time = parts.next();
  if parts.next().is_some() {
    return None;
  }

  let mut dmy = date.split('/');
  let day: u32 = dmy.next()?.parse().ok()?;
  let month: u32 = dmy.next()?.parse().ok()?;
  let year_str = dmy.next()?;
  if dmy.next().is_some() {
    return None;
  }
  let year: i32 = match year_str.len() {
    2 => 2000 + year_str.parse::<i32>().ok()?,
    4 => year_str.parse().ok()?,
    _ => return None,
  };

  let date = NaiveDate::from_ymd_opt(year, month, day)?;
  let time = match time {
    None => NaiveTime::MIN,
    Some(t) => NaiveTime::parse_from_str(t, "%H:%M")
      .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M:%S"))
      .ok()?,
  };

  Some(date.and_time(time).and_utc().timestamp())
}
