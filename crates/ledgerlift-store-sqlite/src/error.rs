//! Error type for `ledgerlift-store-sqlite`.
//!
//! Only run-level failures are errors. Row-level problems (invalid records,
//! single failed inserts) are counted in
//! [`MigrationStats`](ledgerlift_core::report::MigrationStats) instead.

use std::path::PathBuf;

use ledgerlift_core::entity::EntityKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ledgerlift_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  /// The pre-run backup could not be written. Nothing was mutated.
  #[error("backup to {path:?} failed: {reason}")]
  Backup { path: PathBuf, reason: String },

  /// A table or column name that is not a plain SQL identifier.
  #[error("invalid identifier: {0:?}")]
  InvalidIdentifier(String),

  /// A migrator gave up on its whole collection. Rolls back the run.
  #[error("{kind} migration aborted: {reason}")]
  Migrator { kind: EntityKind, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
