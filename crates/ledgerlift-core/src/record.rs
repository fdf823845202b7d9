//! Source records: raw documents exactly as a legacy system returned them.
//!
//! A record is never transformed or mutated after it is fetched. All shaping
//! into target rows happens in `ledgerlift-transform`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Source system ───────────────────────────────────────────────────────────

/// Name of one of the legacy systems being consolidated.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SourceSystem(String);

impl SourceSystem {
  pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SourceSystem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One document fetched from a source collection.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRecord {
  pub source_system: SourceSystem,
  pub collection:    String,
  /// The id assigned by the originating system. `None` when the document
  /// carried no usable id; migrators treat that as a validation failure.
  pub native_id:     Option<String>,
  pub fields:        Map<String, Value>,
}

impl SourceRecord {
  pub fn new(
    source_system: SourceSystem,
    collection: impl Into<String>,
    native_id: Option<String>,
    fields: Map<String, Value>,
  ) -> Self {
    Self { source_system, collection: collection.into(), native_id, fields }
  }

  /// Build a record from a raw document. Returns `None` when the document is
  /// not a JSON object.
  ///
  /// The native id is the document's own `id` field (string or number),
  /// falling back to `key`, the map key the document was stored under, for
  /// exports shaped as `{ "<id>": { ... } }`.
  pub fn from_document(
    source_system: &SourceSystem,
    collection: &str,
    key: Option<&str>,
    document: Value,
  ) -> Option<Self> {
    let Value::Object(fields) = document else {
      return None;
    };

    let native_id = fields
      .get("id")
      .and_then(id_string)
      .or_else(|| key.map(str::to_owned))
      .filter(|id| !id.trim().is_empty());

    Some(Self::new(source_system.clone(), collection, native_id, fields))
  }

  /// Human-readable locator used in log lines.
  pub fn locator(&self) -> String {
    format!(
      "{}/{}/{}",
      self.source_system,
      self.collection,
      self.native_id.as_deref().unwrap_or("<no id>")
    )
  }
}

fn id_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

// ─── Fetch outcome ───────────────────────────────────────────────────────────

/// The result of fetching one collection from one source.
#[derive(Debug, Default)]
pub struct FetchOutcome {
  /// Valid records, in the order the source returned them.
  pub records:   Vec<SourceRecord>,
  /// Items that were not records at all (not JSON objects).
  pub malformed: usize,
}

impl FetchOutcome {
  /// Turn a sequence of `(key, document)` pairs into records, skipping and
  /// counting non-object items and honouring `limit`.
  pub fn from_documents(
    source_system: &SourceSystem,
    collection: &str,
    documents: impl IntoIterator<Item = (Option<String>, Value)>,
    limit: Option<usize>,
  ) -> Self {
    let mut outcome = Self::default();

    for (key, document) in documents.into_iter().take(limit.unwrap_or(usize::MAX)) {
      match SourceRecord::from_document(source_system, collection, key.as_deref(), document) {
        Some(record) => outcome.records.push(record),
        None => {
          tracing::warn!(
            source = %source_system,
            collection,
            key = key.as_deref().unwrap_or("<none>"),
            "skipping malformed source item (not an object)"
          );
          outcome.malformed += 1;
        }
      }
    }

    outcome
  }
}
