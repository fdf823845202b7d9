//! Durable id maps.
//!
//! The identity map (users) and the entity id map (everything else) are both
//! loaded at the start of a run and appended to as rows are inserted, inside
//! the same transaction as the rows themselves.

use std::collections::HashMap;

use chrono::Utc;
use ledgerlift_core::{
  entity::EntityKind,
  record::SourceSystem,
  user::{ExistingUser, IdentityMap, IdentityMapping},
};
use rusqlite::Connection;

use crate::encode::{RawMapping, RawUser, encode_bool};

// ─── Identity map ────────────────────────────────────────────────────────────

pub fn load_identity_map(conn: &Connection) -> rusqlite::Result<IdentityMap> {
  let mut stmt = conn.prepare(
    "SELECT source, native_id, target_id, email, dedup_match
     FROM migration_identity_map
     ORDER BY mapped_at, source, native_id",
  )?;
  let raws = stmt
    .query_map([], RawMapping::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut map = IdentityMap::new();
  for raw in raws {
    map.insert(raw.into_mapping());
  }
  Ok(map)
}

/// Append mappings; a `(source, native_id)` already present is left alone.
pub fn persist_mappings(conn: &Connection, mappings: &[IdentityMapping]) -> rusqlite::Result<usize> {
  let now = Utc::now().timestamp();
  let mut stmt = conn.prepare_cached(
    "INSERT OR IGNORE INTO migration_identity_map
       (source, native_id, target_id, email, dedup_match, mapped_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
  )?;

  let mut written = 0;
  for m in mappings {
    written += stmt.execute(rusqlite::params![
      m.source.as_str(),
      m.native_id,
      m.target_id,
      m.email,
      encode_bool(m.dedup_match),
      now,
    ])?;
  }
  Ok(written)
}

/// Every user in the target store, emails normalised.
pub fn load_existing_users(conn: &Connection) -> rusqlite::Result<Vec<ExistingUser>> {
  let mut stmt = conn.prepare("SELECT id, email FROM users ORDER BY rowid")?;
  let users = stmt
    .query_map([], RawUser::from_row)?
    .map(|r| r.map(RawUser::into_existing))
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(users)
}

// ─── Entity id map ───────────────────────────────────────────────────────────

/// Translation table from `(kind, source, native id)` to the integer id the
/// row received in the target store.
#[derive(Debug, Clone, Default)]
pub struct EntityIdMap {
  ids: HashMap<(EntityKind, String, String), i64>,
}

impl EntityIdMap {
  pub fn new() -> Self { Self::default() }

  pub fn load(conn: &Connection) -> rusqlite::Result<Self> {
    let mut stmt = conn.prepare(
      "SELECT entity_kind, source, native_id, target_id FROM migration_entity_map",
    )?;
    let rows = stmt
      .query_map([], |row| {
        Ok((
          row.get::<_, String>(0)?,
          row.get::<_, String>(1)?,
          row.get::<_, String>(2)?,
          row.get::<_, i64>(3)?,
        ))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut map = Self::new();
    for (kind, source, native_id, target_id) in rows {
      match EntityKind::parse(&kind) {
        Some(kind) => {
          map.ids.insert((kind, source, native_id), target_id);
        }
        None => tracing::warn!(kind, native_id, "ignoring entity mapping of unknown kind"),
      }
    }
    Ok(map)
  }

  pub fn get(&self, kind: EntityKind, source: &SourceSystem, native_id: &str) -> Option<i64> {
    self
      .ids
      .get(&(kind, source.as_str().to_owned(), native_id.to_owned()))
      .copied()
  }

  pub fn contains(&self, kind: EntityKind, source: &SourceSystem, native_id: &str) -> bool {
    self.get(kind, source, native_id).is_some()
  }

  /// Remember a freshly inserted row, both in memory and in
  /// `migration_entity_map`.
  pub fn record(
    &mut self,
    conn: &Connection,
    kind: EntityKind,
    source: &SourceSystem,
    native_id: &str,
    target_id: i64,
  ) -> rusqlite::Result<()> {
    conn
      .prepare_cached(
        "INSERT OR REPLACE INTO migration_entity_map
           (entity_kind, source, native_id, target_id, mapped_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
      )?
      .execute(rusqlite::params![
        kind.as_str(),
        source.as_str(),
        native_id,
        target_id,
        Utc::now().timestamp(),
      ])?;
    self
      .ids
      .insert((kind, source.as_str().to_owned(), native_id.to_owned()), target_id);
    Ok(())
  }

  pub fn len(&self) -> usize { self.ids.len() }

  pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}
