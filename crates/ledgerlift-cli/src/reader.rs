//! [`JsonExportReader`] reads one legacy system's export directory.
//!
//! The directory holds one `<collection>.json` file per collection. Each file
//! is either an array of documents or an object keyed by document id.

use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use ledgerlift_core::{
  Error, Result,
  reader::SourceReader,
  record::{FetchOutcome, SourceSystem},
};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct JsonExportReader {
  system: SourceSystem,
  dir:    PathBuf,
}

impl JsonExportReader {
  pub fn new(name: &str, dir: impl Into<PathBuf>) -> Self {
    Self { system: SourceSystem::new(name), dir: dir.into() }
  }

  fn unavailable(&self, reason: String) -> Error {
    Error::SourceUnavailable {
      source_system: self.system.to_string(),
      reason,
    }
  }
}

#[async_trait]
impl SourceReader for JsonExportReader {
  fn system(&self) -> &SourceSystem { &self.system }

  async fn fetch(&self, collection: &str, limit: Option<usize>) -> Result<FetchOutcome> {
    match tokio::fs::metadata(&self.dir).await {
      Ok(meta) if meta.is_dir() => {}
      Ok(_) => return Err(self.unavailable(format!("{} is not a directory", self.dir.display()))),
      Err(e) => return Err(self.unavailable(format!("{}: {e}", self.dir.display()))),
    }

    let path = self.dir.join(format!("{collection}.json"));
    let bytes = match tokio::fs::read(&path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        tracing::debug!(source = %self.system, collection, "no export file, empty collection");
        return Ok(FetchOutcome::default());
      }
      Err(e) => return Err(e.into()),
    };

    let documents: Vec<(Option<String>, Value)> = match serde_json::from_slice(&bytes)? {
      Value::Array(items) => items.into_iter().map(|doc| (None, doc)).collect(),
      // Keyed exports come back in key order.
      Value::Object(by_id) => by_id.into_iter().map(|(id, doc)| (Some(id), doc)).collect(),
      other => {
        tracing::warn!(
          source = %self.system,
          collection,
          kind = json_kind(&other),
          "export file is neither an array nor an object"
        );
        return Ok(FetchOutcome { records: Vec::new(), malformed: 1 });
      }
    };

    Ok(FetchOutcome::from_documents(&self.system, collection, documents, limit))
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}
