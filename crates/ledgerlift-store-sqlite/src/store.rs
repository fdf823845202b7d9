//! [`TargetStore`], the SQLite database a migration writes into.

use std::path::{Path, PathBuf};

use chrono::Utc;
use ledgerlift_core::{
  report::{ValidationReport, ValidationResult},
  user::IdentityMap,
};

use crate::{
  Error, Result,
  backup::{backup_path, vacuum_into},
  dedup::verify_unique_emails,
  identity::{EntityIdMap, load_identity_map},
  schema::SCHEMA,
  validate::{ValidationConfig, ValidationSuite, is_identifier},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The target store, backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct TargetStore {
  conn:  tokio_rusqlite::Connection,
  /// File stem used to name backups.
  label: String,
}

impl TargetStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let label = path
      .file_stem()
      .map_or_else(|| "target".to_owned(), |s| s.to_string_lossy().into_owned());
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, label };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, label: "memory".to_owned() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// Turn foreign key enforcement on or off for this connection. Has no
  /// effect inside an open transaction.
  pub async fn set_foreign_keys(&self, on: bool) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.pragma_update(None, "foreign_keys", on)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Copy the whole database into a new timestamped file under `dir`.
  pub async fn backup(&self, dir: &Path) -> Result<PathBuf> {
    let path = backup_path(dir, &self.label, Utc::now());
    let fail = |reason: String| Error::Backup { path: path.clone(), reason };

    tokio::fs::create_dir_all(dir)
      .await
      .map_err(|e| fail(e.to_string()))?;

    let target = path.clone();
    self
      .conn
      .call(move |conn| {
        vacuum_into(conn, &target)?;
        Ok(())
      })
      .await
      .map_err(|e| fail(e.to_string()))?;

    tracing::info!(path = %path.display(), "target store backed up");
    Ok(path)
  }

  pub async fn count_rows(&self, table: &str) -> Result<i64> {
    if !is_identifier(table) {
      return Err(Error::InvalidIdentifier(table.to_owned()));
    }
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let n = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await?;
    Ok(n)
  }

  /// The persisted identity map.
  pub async fn identity_map(&self) -> Result<IdentityMap> {
    let map = self
      .conn
      .call(|conn| Ok(load_identity_map(conn)?))
      .await?;
    Ok(map)
  }

  /// The persisted entity id map.
  pub async fn entity_map(&self) -> Result<EntityIdMap> {
    let map = self.conn.call(|conn| Ok(EntityIdMap::load(conn)?)).await?;
    Ok(map)
  }

  /// Check that no normalised email is held by more than one user.
  pub async fn verify_deduplication(&self) -> Result<ValidationResult> {
    let result = self
      .conn
      .call(|conn| Ok(verify_unique_emails(conn)?))
      .await?;
    Ok(result)
  }

  /// Run the standard validation suite.
  pub async fn validate(&self, config: ValidationConfig) -> Result<ValidationReport> {
    let report = self
      .conn
      .call(move |conn| Ok(ValidationSuite::standard(config).run(conn)))
      .await?;
    Ok(report)
  }
}
