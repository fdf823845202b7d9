//! Flat entity kinds: one source record, one target row.

use ledgerlift_core::{entity::EntityKind, record::SourceRecord, report::MigrationStats};
use ledgerlift_transform::{
  ActivityLogRow, CollaboratorRow, FileRow, MessageRow, PermissionRow, transform_activity_log,
  transform_collaborator, transform_file, transform_message, transform_permission,
};

use super::{EntityMigrator, MigrationContext, Step, migrate_rows, resolve};
use crate::{Result, encode::encode_structured};

// ─── Messages ────────────────────────────────────────────────────────────────

pub struct MessageMigrator;

impl EntityMigrator for MessageMigrator {
  fn kind(&self) -> EntityKind { EntityKind::Message }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut stmt = conn.prepare(
      "INSERT INTO messages (engagement_id, sender_id, body, attachments, is_read, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_message, |cx, record, row: &MessageRow, _| {
      let engagement = resolve!(cx.entity_ref(record, "engagement_id", EntityKind::Engagement, &row.engagement_id));
      let sender = resolve!(cx.user_ref(record, "sender_id", &row.sender_id));
      Step::from_insert(stmt.insert(rusqlite::params![
        engagement,
        sender,
        row.body,
        encode_structured(&row.attachments),
        row.is_read,
        row.created_at,
      ]))
    })
  }
}

// ─── Collaborators ───────────────────────────────────────────────────────────

pub struct CollaboratorMigrator;

impl EntityMigrator for CollaboratorMigrator {
  fn kind(&self) -> EntityKind { EntityKind::Collaborator }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut stmt = conn.prepare(
      "INSERT INTO collaborators (engagement_id, user_id, role, created_at)
       VALUES (?1, ?2, ?3, ?4)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_collaborator, |cx, record, row: &CollaboratorRow, _| {
      let engagement = resolve!(cx.entity_ref(record, "engagement_id", EntityKind::Engagement, &row.engagement_id));
      let user = resolve!(cx.user_ref(record, "user_id", &row.user_id));
      Step::from_insert(stmt.insert(rusqlite::params![engagement, user, row.role, row.created_at]))
    })
  }
}

// ─── Files ───────────────────────────────────────────────────────────────────

pub struct FileMigrator;

impl EntityMigrator for FileMigrator {
  fn kind(&self) -> EntityKind { EntityKind::File }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut stmt = conn.prepare(
      "INSERT INTO files (engagement_id, name, storage_ref, mime_type, size_bytes, uploaded_by, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_file, |cx, record, row: &FileRow, _| {
      let engagement = resolve!(cx.entity_ref(record, "engagement_id", EntityKind::Engagement, &row.engagement_id));
      let uploader = resolve!(cx.user_ref(record, "uploaded_by", &row.uploaded_by));
      Step::from_insert(stmt.insert(rusqlite::params![
        engagement,
        row.name,
        row.storage_ref,
        row.mime_type,
        row.size_bytes,
        uploader,
        row.created_at,
      ]))
    })
  }
}

// ─── Activity logs ───────────────────────────────────────────────────────────

pub struct ActivityLogMigrator;

impl EntityMigrator for ActivityLogMigrator {
  fn kind(&self) -> EntityKind { EntityKind::ActivityLog }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut stmt = conn.prepare(
      "INSERT INTO activity_logs (engagement_id, actor_id, action, details, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_activity_log, |cx, record, row: &ActivityLogRow, _| {
      let engagement = resolve!(cx.entity_ref(record, "engagement_id", EntityKind::Engagement, &row.engagement_id));
      let actor = resolve!(cx.user_ref(record, "actor_id", &row.actor_id));
      Step::from_insert(stmt.insert(rusqlite::params![
        engagement,
        actor,
        row.action,
        encode_structured(&row.details),
        row.created_at,
      ]))
    })
  }
}

// ─── Permissions ─────────────────────────────────────────────────────────────

pub struct PermissionMigrator;

impl EntityMigrator for PermissionMigrator {
  fn kind(&self) -> EntityKind { EntityKind::Permission }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut stmt = conn.prepare(
      "INSERT INTO permissions (user_id, resource_type, resource_id, role, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_permission, |cx, record, row: &PermissionRow, _| {
      let user = resolve!(cx.user_ref(record, "user_id", &row.user_id));
      // resource_id is a native id of the resource_type kind.
      let resource = match EntityKind::parse(&row.resource_type) {
        Some(kind) => resolve!(cx.entity_ref(record, "resource_id", kind, &row.resource_id)),
        None => row.resource_id.clone().map_or(rusqlite::types::Value::Null, rusqlite::types::Value::Text),
      };
      Step::from_insert(stmt.insert(rusqlite::params![
        user,
        row.resource_type,
        resource,
        row.role,
        row.created_at,
      ]))
    })
  }
}
