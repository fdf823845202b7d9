//! Per-entity migrators.
//!
//! Every entity kind except users (which go through [`crate::dedup`]) has an
//! [`EntityMigrator`]: transform each record, validate it, remap its foreign
//! references and insert it through one prepared statement. Row-level
//! problems are counted in [`MigrationStats`]; only infrastructure failures
//! become an [`Error`](crate::Error) and roll the run back.

mod checklist;
mod engagement;
mod review;
mod rfi;
mod simple;

use ledgerlift_core::{
  entity::EntityKind,
  record::SourceRecord,
  report::MigrationStats,
  user::IdentityMap,
};
use ledgerlift_transform::{AsTargetRow, validate_transformed_data};
use rusqlite::{Connection, types::Value};
use serde::{Deserialize, Serialize};

pub use checklist::ChecklistMigrator;
pub use engagement::{ClientMigrator, EngagementMigrator};
pub use review::ReviewMigrator;
pub use rfi::RfiMigrator;
pub use simple::{
  ActivityLogMigrator, CollaboratorMigrator, FileMigrator, MessageMigrator, PermissionMigrator,
};

use crate::{Result, identity::EntityIdMap};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Migrates every record of one entity kind.
///
/// Called synchronously inside the run's transaction; implementations must
/// not commit, roll back or toggle pragmas.
pub trait EntityMigrator: Send + Sync {
  fn kind(&self) -> EntityKind;

  fn migrate(
    &self,
    cx: &mut MigrationContext<'_>,
    records: &[SourceRecord],
  ) -> Result<MigrationStats>;
}

// ─── Unmapped references ─────────────────────────────────────────────────────

/// What to do with a foreign reference whose native id has no mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedRefPolicy {
  /// Store the native id unchanged and log a warning. The orphan shows up in
  /// referential-integrity validation.
  #[default]
  Permissive,
  /// Skip the record (or child row) holding the reference.
  Strict,
}

/// A reference that could not be remapped under [`UnmappedRefPolicy::Strict`].
#[derive(Debug, Clone)]
pub struct Unmapped {
  pub field:     &'static str,
  pub native_id: String,
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// Everything a migrator needs besides its records.
pub struct MigrationContext<'a> {
  pub conn:     &'a Connection,
  pub identity: &'a IdentityMap,
  pub entities: &'a mut EntityIdMap,
  pub policy:   UnmappedRefPolicy,
}

impl MigrationContext<'_> {
  /// Remap a native user id to its target user id.
  pub fn user_ref(
    &self,
    record: &SourceRecord,
    field: &'static str,
    native: &Option<String>,
  ) -> Result<Value, Unmapped> {
    let Some(native) = native.as_deref() else {
      return Ok(Value::Null);
    };
    match self.identity.target_for(&record.source_system, native) {
      Some(target) => Ok(Value::Text(target.to_owned())),
      None => self.unmapped(record, field, native),
    }
  }

  /// Remap a native id of an earlier-migrated entity to its target row id.
  pub fn entity_ref(
    &self,
    record: &SourceRecord,
    field: &'static str,
    kind: EntityKind,
    native: &Option<String>,
  ) -> Result<Value, Unmapped> {
    let Some(native) = native.as_deref() else {
      return Ok(Value::Null);
    };
    match self.entities.get(kind, &record.source_system, native) {
      Some(id) => Ok(Value::Integer(id)),
      None => self.unmapped(record, field, native),
    }
  }

  fn unmapped(&self, record: &SourceRecord, field: &'static str, native: &str) -> Result<Value, Unmapped> {
    match self.policy {
      UnmappedRefPolicy::Permissive => {
        tracing::warn!(record = %record.locator(), field, native_id = native, "unmapped reference, keeping native id");
        Ok(Value::Text(native.to_owned()))
      }
      UnmappedRefPolicy::Strict => Err(Unmapped { field, native_id: native.to_owned() }),
    }
  }
}

// ─── Row loop ────────────────────────────────────────────────────────────────

/// Outcome of inserting one row.
pub(crate) enum Step {
  Inserted(i64),
  Unmapped(Unmapped),
  Failed(rusqlite::Error),
}

impl Step {
  pub(crate) fn from_insert(result: rusqlite::Result<i64>) -> Self {
    match result {
      Ok(id) => Self::Inserted(id),
      Err(err) => Self::Failed(err),
    }
  }
}

/// Unwrap a reference lookup or bail out of the enclosing insert closure.
macro_rules! resolve {
  ($lookup:expr) => {
    match $lookup {
      Ok(value) => value,
      Err(unmapped) => return $crate::migrate::Step::Unmapped(unmapped),
    }
  };
}
pub(crate) use resolve;

/// The shared per-record loop: skip rows an earlier run already migrated,
/// transform, validate, insert, and remember the new id.
pub(crate) fn migrate_rows<R: AsTargetRow>(
  cx: &mut MigrationContext<'_>,
  kind: EntityKind,
  records: &[SourceRecord],
  transform: fn(&SourceRecord) -> R,
  mut insert: impl FnMut(&MigrationContext<'_>, &SourceRecord, &R, &mut MigrationStats) -> Step,
) -> Result<MigrationStats> {
  let mut stats = MigrationStats::default();

  for record in records {
    stats.processed += 1;

    if let Some(native) = record.native_id.as_deref()
      && cx.entities.contains(kind, &record.source_system, native)
    {
      stats.skipped += 1;
      continue;
    }

    let row = transform(record);
    let problems = validate_transformed_data(row.as_target_row());
    if !problems.is_empty() {
      tracing::warn!(entity = %kind, record = %record.locator(), ?problems, "invalid record, skipping");
      stats.skipped += 1;
      continue;
    }

    match insert(&*cx, record, &row, &mut stats) {
      Step::Inserted(id) => {
        stats.migrated += 1;
        if let Some(native) = row.native_id() {
          let conn = cx.conn;
          cx.entities.record(conn, kind, &record.source_system, native, id)?;
        }
      }
      Step::Unmapped(Unmapped { field, native_id }) => {
        tracing::warn!(entity = %kind, record = %record.locator(), field, %native_id, "unmapped reference, skipping record");
        stats.skipped += 1;
      }
      Step::Failed(err) => {
        tracing::error!(entity = %kind, record = %record.locator(), error = %err, "insert failed");
        stats.errors += 1;
      }
    }
  }

  tracing::info!(
    entity = %kind,
    processed = stats.processed,
    migrated = stats.migrated,
    skipped = stats.skipped,
    errors = stats.errors,
    "migrated collection"
  );
  Ok(stats)
}

/// Validate and insert one nested child row, counting the outcome under the
/// child's table in `stats.nested`. A failed child never affects its parent.
pub(crate) fn migrate_child<R: AsTargetRow>(
  stats: &mut MigrationStats,
  parent: &SourceRecord,
  row: &R,
  insert: impl FnOnce() -> Step,
) -> Option<i64> {
  let table = row.as_target_row().table();
  let problems = validate_transformed_data(row.as_target_row());
  let nested = stats.nested_mut(table);

  if !problems.is_empty() {
    tracing::warn!(table, parent = %parent.locator(), ?problems, "invalid child row, skipping");
    nested.skipped += 1;
    return None;
  }

  match insert() {
    Step::Inserted(id) => {
      nested.migrated += 1;
      Some(id)
    }
    Step::Unmapped(Unmapped { field, native_id }) => {
      tracing::warn!(table, parent = %parent.locator(), field, %native_id, "unmapped reference, skipping child row");
      nested.skipped += 1;
      None
    }
    Step::Failed(err) => {
      tracing::error!(table, parent = %parent.locator(), error = %err, "child insert failed");
      nested.errors += 1;
      None
    }
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// The ordered set of migrators a run executes.
pub struct MigratorRegistry {
  migrators: Vec<Box<dyn EntityMigrator>>,
}

impl MigratorRegistry {
  /// One migrator per non-user kind, in dependency order.
  pub fn standard() -> Self {
    let mut registry = Self::empty();
    registry.register(ClientMigrator);
    registry.register(EngagementMigrator);
    registry.register(RfiMigrator);
    registry.register(ReviewMigrator);
    registry.register(MessageMigrator);
    registry.register(CollaboratorMigrator);
    registry.register(ChecklistMigrator);
    registry.register(FileMigrator);
    registry.register(ActivityLogMigrator);
    registry.register(PermissionMigrator);
    registry
  }

  pub fn empty() -> Self { Self { migrators: Vec::new() } }

  /// Add a migrator. One already registered for the same kind is replaced
  /// in place, keeping its position in the order.
  pub fn register(&mut self, migrator: impl EntityMigrator + 'static) -> &mut Self {
    let kind = migrator.kind();
    match self.migrators.iter_mut().find(|m| m.kind() == kind) {
      Some(slot) => *slot = Box::new(migrator),
      None => self.migrators.push(Box::new(migrator)),
    }
    self
  }

  pub fn iter(&self) -> impl Iterator<Item = &dyn EntityMigrator> {
    self.migrators.iter().map(|m| m.as_ref())
  }

  pub fn len(&self) -> usize { self.migrators.len() }

  pub fn is_empty(&self) -> bool { self.migrators.is_empty() }
}

impl Default for MigratorRegistry {
  fn default() -> Self { Self::standard() }
}
