//! Value normalisers: booleans, structured text, coordinates and
//! enumerations.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

// ─── Booleans ────────────────────────────────────────────────────────────────

/// `true`, `false`, `1`, `0`, `"true"`, `"false"`, `"1"`, `"0"` → 1 / 0.
/// Anything else is `None`.
pub fn normalize_bool(value: &Value) -> Option<i64> {
  match value {
    Value::Bool(b) => Some(i64::from(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(0) => Some(0),
      Some(1) => Some(1),
      _ => None,
    },
    Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
      "true" | "1" => Some(1),
      "false" | "0" => Some(0),
      _ => None,
    },
    _ => None,
  }
}

// ─── Structured text ─────────────────────────────────────────────────────────

/// Composite data stored as serialised JSON text.
///
/// Opaque to domain logic: built from a source value, handed to the store as
/// a string. Already-serialised text is passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredText(String);

impl StructuredText {
  pub fn from_value(value: &Value) -> Self {
    match value {
      Value::String(s) => Self(s.clone()),
      other => Self(other.to_string()),
    }
  }

  /// The text as stored in the target column.
  pub fn as_str(&self) -> &str { &self.0 }
}

// ─── Coordinates ─────────────────────────────────────────────────────────────

/// A spatial value copied through from the source without any rounding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate(Number);

impl Coordinate {
  /// Numbers are taken as-is; numeric strings are parsed as JSON numbers.
  pub fn from_value(value: &Value) -> Option<Self> {
    match value {
      Value::Number(n) => Some(Self(n.clone())),
      Value::String(s) => s.trim().parse::<Number>().ok().map(Self),
      _ => None,
    }
  }

  /// The exact integer value, or `None` if the coordinate has a fractional
  /// part (or does not fit an `i64`).
  pub fn as_exact_integer(&self) -> Option<i64> {
    if let Some(i) = self.0.as_i64() {
      return Some(i);
    }
    let f = self.0.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
  }

  pub fn as_f64(&self) -> Option<f64> { self.0.as_f64() }
}

impl std::fmt::Display for Coordinate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
}

// ─── Enumerations ────────────────────────────────────────────────────────────

/// An enumerated field with an explicit allow-list and a fallback default.
#[derive(Debug, Clone, Copy)]
pub struct EnumField {
  pub field:   &'static str,
  pub allowed: &'static [&'static str],
  /// Used for absent values and, with a warning, for unrecognised ones.
  pub default: &'static str,
}

impl EnumField {
  /// Normalise `value`; absent and unrecognised values become the default.
  pub fn normalize(&self, value: Option<&Value>) -> String {
    self
      .normalize_present(value)
      .unwrap_or_else(|| self.default.to_owned())
  }

  /// Like [`EnumField::normalize`] but keeps absent and unrecognised values
  /// as `None`, so merging records only ever compares allowed values.
  pub fn normalize_present(&self, value: Option<&Value>) -> Option<String> {
    let raw = match value? {
      Value::String(s) => s.clone(),
      Value::Number(n) => n.to_string(),
      Value::Bool(b) => b.to_string(),
      _ => String::new(),
    };

    let key = canonical(&raw);
    if key.is_empty() {
      return None;
    }
    if let Some(known) = self.allowed.iter().find(|a| **a == key) {
      return Some((*known).to_owned());
    }

    tracing::warn!(
      field = self.field,
      value = %raw,
      default = self.default,
      "unrecognised enum value"
    );
    None
  }
}

/// `"In Progress"` / `"in-progress"` / `" IN_PROGRESS "` → `"in_progress"`.
fn canonical(raw: &str) -> String {
  raw
    .trim()
    .to_lowercase()
    .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>()
    .join("_")
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn booleans_from_every_accepted_shape() {
    for (value, expected) in [
      (json!(true), 1),
      (json!(false), 0),
      (json!(1), 1),
      (json!(0), 0),
      (json!("true"), 1),
      (json!("FALSE"), 0),
      (json!("1"), 1),
      (json!("0"), 0),
    ] {
      assert_eq!(normalize_bool(&value), Some(expected), "value {value}");
    }
    assert_eq!(normalize_bool(&json!(2)), None);
    assert_eq!(normalize_bool(&json!("yes")), None);
    assert_eq!(normalize_bool(&json!(null)), None);
  }

  #[test]
  fn structured_text_serialises_composites_and_passes_strings_through() {
    let composite = StructuredText::from_value(&json!({ "a": [1, 2] }));
    assert_eq!(composite.as_str(), r#"{"a":[1,2]}"#);

    let already = StructuredText::from_value(&json!(r#"{"b": true}"#));
    assert_eq!(already.as_str(), r#"{"b": true}"#);
  }

  #[test]
  fn coordinates_are_exact() {
    let c = Coordinate::from_value(&json!(250)).unwrap();
    assert_eq!(c.as_exact_integer(), Some(250));

    let whole_float = Coordinate::from_value(&json!(40.0)).unwrap();
    assert_eq!(whole_float.as_exact_integer(), Some(40));

    let fractional = Coordinate::from_value(&json!(12.5)).unwrap();
    assert_eq!(fractional.as_exact_integer(), None);
    assert_eq!(fractional.as_f64(), Some(12.5));

    let from_text = Coordinate::from_value(&json!(" 100 ")).unwrap();
    assert_eq!(from_text.as_exact_integer(), Some(100));

    assert!(Coordinate::from_value(&json!("left")).is_none());
  }

  const STAGE: EnumField = EnumField {
    field:   "stage",
    allowed: &["planning", "in_progress", "complete"],
    default: "planning",
  };

  #[test]
  fn enum_values_are_canonicalised() {
    assert_eq!(STAGE.normalize(Some(&json!("In Progress"))), "in_progress");
    assert_eq!(STAGE.normalize(Some(&json!("in-progress"))), "in_progress");
    assert_eq!(STAGE.normalize(Some(&json!("COMPLETE"))), "complete");
  }

  #[test]
  fn unknown_or_absent_enum_values_fall_back() {
    assert_eq!(STAGE.normalize(Some(&json!("archived??"))), "planning");
    assert_eq!(STAGE.normalize(None), "planning");
    assert_eq!(STAGE.normalize_present(None), None);
    assert_eq!(STAGE.normalize_present(Some(&json!("  "))), None);
    assert_eq!(STAGE.normalize_present(Some(&json!("nope"))), None);
  }
}
