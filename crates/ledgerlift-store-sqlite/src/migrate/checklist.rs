//! Checklists and their items.

use ledgerlift_core::{entity::EntityKind, record::SourceRecord, report::MigrationStats};
use ledgerlift_transform::{ChecklistRow, transform_checklist};

use super::{EntityMigrator, MigrationContext, Step, migrate_child, migrate_rows, resolve};
use crate::Result;

pub struct ChecklistMigrator;

impl EntityMigrator for ChecklistMigrator {
  fn kind(&self) -> EntityKind { EntityKind::Checklist }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut checklist_stmt = conn.prepare(
      "INSERT INTO checklists (engagement_id, title, created_by, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut item_stmt = conn.prepare(
      "INSERT INTO checklist_items (checklist_id, label, is_done, done_by, done_at, position)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_checklist, |cx, record, row: &ChecklistRow, stats| {
      let engagement = resolve!(cx.entity_ref(record, "engagement_id", EntityKind::Engagement, &row.engagement_id));
      let creator = resolve!(cx.user_ref(record, "created_by", &row.created_by));

      let checklist_id = match checklist_stmt.insert(rusqlite::params![
        engagement,
        row.title,
        creator,
        row.created_at,
        row.updated_at,
      ]) {
        Ok(id) => id,
        Err(err) => return Step::Failed(err),
      };

      for item in &row.items {
        migrate_child(stats, record, item, || {
          let done_by = resolve!(cx.user_ref(record, "done_by", &item.done_by));
          Step::from_insert(item_stmt.insert(rusqlite::params![
            checklist_id,
            item.label,
            item.is_done,
            done_by,
            item.done_at,
            item.position,
          ]))
        });
      }

      Step::Inserted(checklist_id)
    })
  }
}
