//! The `SourceReader` trait and an in-memory implementation.
//!
//! Transport details for each legacy system live behind this trait. The
//! orchestrator only ever sees fully materialised [`FetchOutcome`]s.

use std::collections::HashMap;

use serde_json::Value;

use crate::{
  Error, Result,
  record::{FetchOutcome, SourceSystem},
};

/// Fetches raw records from one legacy system.
///
/// Implementations must preserve the order the system returns documents in
/// and must not transform them. A failure to reach the system at all is an
/// [`Error`]; individual malformed items are reported through
/// [`FetchOutcome::malformed`].
// `async_trait` keeps the trait object-safe; the orchestrator holds readers
// as `Arc<dyn SourceReader>`.
#[async_trait::async_trait]
pub trait SourceReader: Send + Sync {
  /// The system this reader fetches from.
  fn system(&self) -> &SourceSystem;

  /// Fetch up to `limit` documents from `collection`.
  async fn fetch(&self, collection: &str, limit: Option<usize>) -> Result<FetchOutcome>;
}

// ─── In-memory reader ────────────────────────────────────────────────────────

/// A reader over documents held in memory.
#[derive(Debug, Clone)]
pub struct MemoryReader {
  system:      SourceSystem,
  collections: HashMap<String, Vec<Value>>,
  unavailable: bool,
}

impl MemoryReader {
  pub fn new(system: SourceSystem) -> Self {
    Self { system, collections: HashMap::new(), unavailable: false }
  }

  /// A reader whose every fetch fails as if the system were down.
  pub fn unavailable(system: SourceSystem) -> Self {
    Self { unavailable: true, ..Self::new(system) }
  }

  pub fn with_collection(mut self, collection: &str, documents: Vec<Value>) -> Self {
    self.collections.insert(collection.to_owned(), documents);
    self
  }
}

#[async_trait::async_trait]
impl SourceReader for MemoryReader {
  fn system(&self) -> &SourceSystem { &self.system }

  async fn fetch(&self, collection: &str, limit: Option<usize>) -> Result<FetchOutcome> {
    if self.unavailable {
      return Err(Error::SourceUnavailable {
        source_system: self.system.to_string(),
        reason:        "connection refused".into(),
      });
    }

    let documents = self
      .collections
      .get(collection)
      .map(|docs| docs.iter().cloned().map(|d| (None, d)).collect::<Vec<_>>())
      .unwrap_or_default();

    Ok(FetchOutcome::from_documents(&self.system, collection, documents, limit))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn missing_collection_is_empty() {
    let reader = MemoryReader::new(SourceSystem::new("a"));
    let outcome = reader.fetch("users", None).await.unwrap();
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.malformed, 0);
  }

  #[tokio::test]
  async fn unavailable_reader_fails_fetch() {
    let reader = MemoryReader::unavailable(SourceSystem::new("a"))
      .with_collection("users", vec![json!({ "id": "1" })]);
    let err = reader.fetch("users", None).await.unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable { .. }));
  }
}
