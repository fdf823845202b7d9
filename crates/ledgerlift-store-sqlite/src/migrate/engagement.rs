//! Clients and engagements.

use ledgerlift_core::{entity::EntityKind, record::SourceRecord, report::MigrationStats};
use ledgerlift_transform::{ClientRow, EngagementRow, transform_client, transform_engagement};

use super::{EntityMigrator, MigrationContext, Step, migrate_rows, resolve};
use crate::{Result, encode::encode_structured};

pub struct ClientMigrator;

impl EntityMigrator for ClientMigrator {
  fn kind(&self) -> EntityKind { EntityKind::Client }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut stmt = conn.prepare(
      "INSERT INTO clients (name, industry, contact_email, owner_id, metadata, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_client, |cx, record, row: &ClientRow, _| {
      let owner = resolve!(cx.user_ref(record, "owner_id", &row.owner_id));
      Step::from_insert(stmt.insert(rusqlite::params![
        row.name,
        row.industry,
        row.contact_email,
        owner,
        encode_structured(&row.metadata),
        row.created_at,
        row.updated_at,
      ]))
    })
  }
}

pub struct EngagementMigrator;

impl EntityMigrator for EngagementMigrator {
  fn kind(&self) -> EntityKind { EntityKind::Engagement }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut stmt = conn.prepare(
      "INSERT INTO engagements (
         client_id, name, stage, status, year_end, partner_id, manager_id,
         is_archived, settings, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_engagement, |cx, record, row: &EngagementRow, _| {
      let client = resolve!(cx.entity_ref(record, "client_id", EntityKind::Client, &row.client_id));
      let partner = resolve!(cx.user_ref(record, "partner_id", &row.partner_id));
      let manager = resolve!(cx.user_ref(record, "manager_id", &row.manager_id));
      Step::from_insert(stmt.insert(rusqlite::params![
        client,
        row.name,
        row.stage,
        row.status,
        row.year_end,
        partner,
        manager,
        row.is_archived,
        encode_structured(&row.settings),
        row.created_at,
        row.updated_at,
      ]))
    })
  }
}
