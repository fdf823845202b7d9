//! Error types for `ledgerlift-core`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The legacy system could not be reached at all. Fatal to the run.
  #[error("source {source_system} unavailable: {reason}")]
  SourceUnavailable {
    source_system: String,
    reason:        String,
  },

  #[error("fetching {collection:?} from {source_system} timed out after {after:?}")]
  FetchTimeout {
    source_system: String,
    collection:    String,
    after:         Duration,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
