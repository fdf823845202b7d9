//! Requests for information, with their questions and responses.

use ledgerlift_core::{entity::EntityKind, record::SourceRecord, report::MigrationStats};
use ledgerlift_transform::{RfiRow, transform_rfi};

use super::{EntityMigrator, MigrationContext, Step, migrate_child, migrate_rows, resolve};
use crate::{Result, encode::encode_structured};

pub struct RfiMigrator;

impl EntityMigrator for RfiMigrator {
  fn kind(&self) -> EntityKind { EntityKind::Rfi }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let conn = cx.conn;
    let mut rfi_stmt = conn.prepare(
      "INSERT INTO rfis (
         engagement_id, title, description, status, due_date,
         assigned_to, created_by, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    let mut question_stmt = conn.prepare(
      "INSERT INTO rfi_questions (rfi_id, question, position, created_at)
       VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut response_stmt = conn.prepare(
      "INSERT INTO rfi_responses (question_id, body, responder_id, attachments, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    migrate_rows(cx, self.kind(), records, transform_rfi, |cx, record, row: &RfiRow, stats| {
      let engagement = resolve!(cx.entity_ref(record, "engagement_id", EntityKind::Engagement, &row.engagement_id));
      let assigned = resolve!(cx.user_ref(record, "assigned_to", &row.assigned_to));
      let creator = resolve!(cx.user_ref(record, "created_by", &row.created_by));

      let rfi_id = match rfi_stmt.insert(rusqlite::params![
        engagement,
        row.title,
        row.description,
        row.status,
        row.due_date,
        assigned,
        creator,
        row.created_at,
        row.updated_at,
      ]) {
        Ok(id) => id,
        Err(err) => return Step::Failed(err),
      };

      for question in &row.questions {
        let question_id = migrate_child(stats, record, question, || {
          Step::from_insert(question_stmt.insert(rusqlite::params![
            rfi_id,
            question.question,
            question.position,
            question.created_at,
          ]))
        });
        let Some(question_id) = question_id else {
          let skipped = question.responses.len() as u64;
          stats.nested_mut("rfi_responses").skipped += skipped;
          continue;
        };

        for response in &question.responses {
          migrate_child(stats, record, response, || {
            let responder = resolve!(cx.user_ref(record, "responder_id", &response.responder_id));
            Step::from_insert(response_stmt.insert(rusqlite::params![
              question_id,
              response.body,
              responder,
              encode_structured(&response.attachments),
              response.created_at,
            ]))
          });
        }
      }

      Step::Inserted(rfi_id)
    })
  }
}
