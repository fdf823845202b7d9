//! Document reviews and their highlight rectangles.

use ledgerlift_core::{entity::EntityKind, record::SourceRecord, report::MigrationStats};
use ledgerlift_transform::{ReviewRow, transform_review};

use super::{EntityMigrator, MigrationContext, Step, migrate_child, migrate_rows, resolve};
use crate::{Result, encode::encode_coordinate};

pub struct ReviewMigrator;

impl EntityMigrator for ReviewMigrator {
  fn kind(&self) -> EntityKind { EntityKind::Review }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut review_stmt = conn.prepare(
      "INSERT INTO reviews (
         engagement_id, title, status, reviewer_id, document_ref, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut highlight_stmt = conn.prepare(
      "INSERT INTO review_highlights (
         review_id, page, x, y, width, height, color, comment, author_id, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_review, |cx, record, row: &ReviewRow, stats| {
      let engagement = resolve!(cx.entity_ref(record, "engagement_id", EntityKind::Engagement, &row.engagement_id));
      let reviewer = resolve!(cx.user_ref(record, "reviewer_id", &row.reviewer_id));

      let review_id = match review_stmt.insert(rusqlite::params![
        engagement,
        row.title,
        row.status,
        reviewer,
        row.document_ref,
        row.created_at,
        row.updated_at,
      ]) {
        Ok(id) => id,
        Err(err) => return Step::Failed(err),
      };

      for highlight in &row.highlights {
        migrate_child(stats, record, highlight, || {
          let author = resolve!(cx.user_ref(record, "author_id", &highlight.author_id));
          Step::from_insert(highlight_stmt.insert(rusqlite::params![
            review_id,
            highlight.page,
            encode_coordinate(&highlight.x),
            encode_coordinate(&highlight.y),
            encode_coordinate(&highlight.width),
            encode_coordinate(&highlight.height),
            highlight.color,
            highlight.comment,
            author,
            highlight.created_at,
          ]))
        });
      }

      Step::Inserted(review_id)
    })
  }
}
