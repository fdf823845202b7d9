//! Typed accessors over a raw document's fields.
//!
//! Legacy systems spelled the same field several ways (`createdAt`,
//! `created_at`, `dateCreated`); every accessor takes the list of spellings
//! and reads the first non-null one.

use serde_json::{Map, Value};

use crate::{
  timestamp::normalize_timestamp,
  value::{Coordinate, EnumField, StructuredText, normalize_bool},
};

/// A borrowed view over one document (or nested child object).
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
  map:     &'a Map<String, Value>,
  /// Locator for log lines, e.g. `legacy-a/reviews/r1`.
  context: &'a str,
}

impl<'a> Fields<'a> {
  pub fn new(map: &'a Map<String, Value>, context: &'a str) -> Self { Self { map, context } }

  pub fn get(&self, names: &[&str]) -> Option<&'a Value> {
    names
      .iter()
      .find_map(|name| self.map.get(*name).filter(|v| !v.is_null()))
  }

  /// Trimmed, non-empty text. Numbers and booleans are rendered as text.
  pub fn text(&self, names: &[&str]) -> Option<String> {
    let rendered = match self.get(names)? {
      Value::String(s) => s.trim().to_owned(),
      Value::Number(n) => n.to_string(),
      Value::Bool(b) => b.to_string(),
      _ => {
        tracing::warn!(context = self.context, field = names[0], "expected text, found composite value");
        return None;
      }
    };
    (!rendered.is_empty()).then_some(rendered)
  }

  /// A reference to another record by native id. Accepts a bare id or a
  /// `{ "id": ... }` object.
  pub fn reference(&self, names: &[&str]) -> Option<String> {
    match self.get(names)? {
      Value::Object(obj) => obj
        .get("id")
        .and_then(|id| match id {
          Value::String(s) => Some(s.trim().to_owned()),
          Value::Number(n) => Some(n.to_string()),
          _ => None,
        })
        .filter(|s| !s.is_empty()),
      _ => self.text(names),
    }
  }

  pub fn timestamp(&self, names: &[&str]) -> Option<i64> {
    let value = self.get(names)?;
    let seconds = normalize_timestamp(value);
    if seconds.is_none() {
      tracing::warn!(context = self.context, field = names[0], %value, "unparseable timestamp, leaving empty");
    }
    seconds
  }

  /// A 0/1 flag; absent or unrecognised values become `default`.
  pub fn flag(&self, names: &[&str], default: i64) -> i64 {
    let Some(value) = self.get(names) else {
      return default;
    };
    normalize_bool(value).unwrap_or_else(|| {
      tracing::warn!(context = self.context, field = names[0], %value, default, "unrecognised boolean, using default");
      default
    })
  }

  /// An integer; whole-number floats and numeric strings are accepted.
  pub fn integer(&self, names: &[&str]) -> Option<i64> {
    match self.get(names)? {
      Value::Number(n) => n
        .as_i64()
        .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }

  pub fn structured(&self, names: &[&str]) -> Option<StructuredText> {
    self.get(names).map(StructuredText::from_value)
  }

  pub fn coordinate(&self, names: &[&str]) -> Option<Coordinate> {
    self.get(names).and_then(Coordinate::from_value)
  }

  pub fn enumerated(&self, names: &[&str], field: &EnumField) -> String {
    field.normalize(self.get(names))
  }

  pub fn enumerated_present(&self, names: &[&str], field: &EnumField) -> Option<String> {
    field.normalize_present(self.get(names))
  }

  /// Nested child objects. Arrays are read in order; objects keyed by child
  /// id are read in key order. Non-object entries are dropped with a warning.
  pub fn children(&self, names: &[&str]) -> Vec<Fields<'a>> {
    let context = self.context;
    let items: Vec<&'a Value> = match self.get(names) {
      Some(Value::Array(items)) => items.iter().collect(),
      Some(Value::Object(by_id)) => by_id.values().collect(),
      _ => return Vec::new(),
    };

    items
      .into_iter()
      .filter_map(|item| match item {
        Value::Object(map) => Some(Fields::new(map, context)),
        other => {
          tracing::warn!(context, field = names[0], %other, "dropping malformed nested item");
          None
        }
      })
      .collect()
  }

  /// A nested object, e.g. a highlight's `position`.
  pub fn object(&self, names: &[&str]) -> Option<Fields<'a>> {
    match self.get(names)? {
      Value::Object(map) => Some(Fields::new(map, self.context)),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn with<T>(doc: Value, f: impl FnOnce(Fields<'_>) -> T) -> T {
    let Value::Object(map) = doc else { panic!("test doc must be an object") };
    f(Fields::new(&map, "test"))
  }

  #[test]
  fn first_non_null_spelling_wins() {
    with(json!({ "createdAt": null, "created_at": 5 }), |f| {
      assert_eq!(f.timestamp(&["createdAt", "created_at"]), Some(5));
    });
  }

  #[test]
  fn text_is_trimmed_and_empty_is_absent() {
    with(json!({ "a": "  hi ", "b": "   ", "c": 7, "d": { "x": 1 } }), |f| {
      assert_eq!(f.text(&["a"]).as_deref(), Some("hi"));
      assert_eq!(f.text(&["b"]), None);
      assert_eq!(f.text(&["c"]).as_deref(), Some("7"));
      assert_eq!(f.text(&["d"]), None);
    });
  }

  #[test]
  fn references_accept_objects_with_ids() {
    with(json!({ "client": { "id": "c9", "name": "Acme" }, "owner": 12 }), |f| {
      assert_eq!(f.reference(&["client"]).as_deref(), Some("c9"));
      assert_eq!(f.reference(&["owner"]).as_deref(), Some("12"));
    });
  }

  #[test]
  fn children_from_arrays_and_keyed_objects() {
    with(
      json!({
        "items": [{ "label": "a" }, "junk", { "label": "b" }],
        "byId": { "k2": { "label": "y" }, "k1": { "label": "x" } }
      }),
      |f| {
        let labels: Vec<_> = f.children(&["items"]).iter().filter_map(|c| c.text(&["label"])).collect();
        assert_eq!(labels, ["a", "b"]);
        let keyed: Vec<_> = f.children(&["byId"]).iter().filter_map(|c| c.text(&["label"])).collect();
        assert_eq!(keyed, ["x", "y"]);
      },
    );
  }

  #[test]
  fn flags_default_when_unrecognised() {
    with(json!({ "done": "maybe", "read": "true" }), |f| {
      assert_eq!(f.flag(&["done"], 0), 0);
      assert_eq!(f.flag(&["read"], 0), 1);
      assert_eq!(f.flag(&["missing"], 1), 1);
    });
  }
}
