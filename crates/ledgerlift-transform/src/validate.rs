//! Row validation after transformation.

use crate::{rows::TargetRow, timestamp::MILLIS_THRESHOLD, value::Coordinate};

/// List everything wrong with a transformed row: missing required fields and
/// values of the wrong shape. An empty list means the row may be inserted.
///
/// Never fails; whether a problem means "skip the row" or "abort the batch"
/// is the caller's call.
pub fn validate_transformed_data(row: TargetRow<'_>) -> Vec<String> {
  let mut v = Checks { table: row.table(), errors: Vec::new() };

  match row {
    TargetRow::User(r) => {
      v.required("native_id", &r.native_id);
      v.required("email", &r.email);
      v.timestamps(&[("created_at", r.created_at), ("updated_at", r.updated_at)]);
    }
    TargetRow::Client(r) => {
      v.required("native_id", &r.native_id);
      v.required("name", &r.name);
      v.timestamps(&[("created_at", r.created_at), ("updated_at", r.updated_at)]);
    }
    TargetRow::Engagement(r) => {
      v.required("native_id", &r.native_id);
      v.required("name", &r.name);
      v.required("client_id", &r.client_id);
      v.timestamps(&[
        ("year_end", r.year_end),
        ("created_at", r.created_at),
        ("updated_at", r.updated_at),
      ]);
    }
    TargetRow::Rfi(r) => {
      v.required("native_id", &r.native_id);
      v.required("engagement_id", &r.engagement_id);
      v.required("title", &r.title);
      v.timestamps(&[
        ("due_date", r.due_date),
        ("created_at", r.created_at),
        ("updated_at", r.updated_at),
      ]);
    }
    TargetRow::RfiQuestion(r) => {
      v.required("question", &r.question);
      v.timestamps(&[("created_at", r.created_at)]);
    }
    TargetRow::RfiResponse(r) => {
      v.required("body", &r.body);
      v.timestamps(&[("created_at", r.created_at)]);
    }
    TargetRow::Review(r) => {
      v.required("native_id", &r.native_id);
      v.required("engagement_id", &r.engagement_id);
      v.required("title", &r.title);
      v.timestamps(&[("created_at", r.created_at), ("updated_at", r.updated_at)]);
    }
    TargetRow::Highlight(r) => {
      v.coordinate("x", &r.x);
      v.coordinate("y", &r.y);
      v.coordinate("width", &r.width);
      v.coordinate("height", &r.height);
      v.timestamps(&[("created_at", r.created_at)]);
    }
    TargetRow::Message(r) => {
      v.required("native_id", &r.native_id);
      v.required("engagement_id", &r.engagement_id);
      v.required("body", &r.body);
      v.timestamps(&[("created_at", r.created_at)]);
    }
    TargetRow::Collaborator(r) => {
      v.required("native_id", &r.native_id);
      v.required("engagement_id", &r.engagement_id);
      v.required("user_id", &r.user_id);
      v.timestamps(&[("created_at", r.created_at)]);
    }
    TargetRow::Checklist(r) => {
      v.required("native_id", &r.native_id);
      v.required("engagement_id", &r.engagement_id);
      v.required("title", &r.title);
      v.timestamps(&[("created_at", r.created_at), ("updated_at", r.updated_at)]);
    }
    TargetRow::ChecklistItem(r) => {
      v.required("label", &r.label);
      v.timestamps(&[("done_at", r.done_at)]);
    }
    TargetRow::File(r) => {
      v.required("native_id", &r.native_id);
      v.required("name", &r.name);
      if r.size_bytes.is_some_and(|s| s < 0) {
        v.errors.push("files.size_bytes: negative size".into());
      }
      v.timestamps(&[("created_at", r.created_at)]);
    }
    TargetRow::ActivityLog(r) => {
      v.required("native_id", &r.native_id);
      v.required("action", &r.action);
      v.timestamps(&[("created_at", r.created_at)]);
    }
    TargetRow::Permission(r) => {
      v.required("native_id", &r.native_id);
      v.required("user_id", &r.user_id);
      v.timestamps(&[("created_at", r.created_at)]);
    }
  }

  v.errors
}

struct Checks {
  table:  &'static str,
  errors: Vec<String>,
}

impl Checks {
  fn required(&mut self, field: &str, value: &Option<String>) {
    if value.as_deref().is_none_or(|s| s.trim().is_empty()) {
      self.errors.push(format!("{}.{field}: required field missing", self.table));
    }
  }

  fn timestamps(&mut self, fields: &[(&str, Option<i64>)]) {
    for (field, value) in fields {
      match value {
        Some(ts) if *ts < 0 => {
          self.errors.push(format!("{}.{field}: negative timestamp {ts}", self.table));
        }
        Some(ts) if *ts >= MILLIS_THRESHOLD => {
          self.errors.push(format!("{}.{field}: {ts} is not in seconds", self.table));
        }
        _ => {}
      }
    }
  }

  fn coordinate(&mut self, field: &str, value: &Option<Coordinate>) {
    match value {
      None => self.errors.push(format!("{}.{field}: required coordinate missing", self.table)),
      Some(c) if c.as_exact_integer().is_none() => self
        .errors
        .push(format!("{}.{field}: {c} is not an exact integer", self.table)),
      Some(_) => {}
    }
  }
}
