//! Value-level validators: coordinates, timestamps, file names and
//! structured text.

use ledgerlift_core::report::ValidationResult;
use ledgerlift_transform::MILLIS_THRESHOLD;
use rusqlite::Connection;

use super::{Validator, count, is_identifier, table_exists};

// ─── Coordinates ─────────────────────────────────────────────────────────────

const HIGHLIGHT_TABLE: &str = "review_highlights";
const COORDINATE_COLUMNS: &[&str] = &["x", "y", "width", "height"];

pub struct CoordinatePrecision;

impl Validator for CoordinatePrecision {
  fn name(&self) -> &'static str { "Coordinate Precision" }

  fn check(&self, conn: &Connection) -> rusqlite::Result<ValidationResult> {
    if !table_exists(conn, HIGHLIGHT_TABLE)? {
      return Ok(ValidationResult::pass(self.name(), vec![format!("no {HIGHLIGHT_TABLE} table")]));
    }

    let mut problems = Vec::new();
    for column in COORDINATE_COLUMNS {
      let inexact = count(
        conn,
        &format!("SELECT COUNT(*) FROM {HIGHLIGHT_TABLE} WHERE typeof({column}) <> 'integer'"),
      )?;
      if inexact > 0 {
        problems.push(format!("{HIGHLIGHT_TABLE}.{column}: {inexact} values are not exact integers"));
      }
    }

    let rows = count(conn, &format!("SELECT COUNT(*) FROM {HIGHLIGHT_TABLE}"))?;
    Ok(ValidationResult::from_problems(
      self.name(),
      problems,
      format!("{rows} highlights, all coordinates exact"),
    ))
  }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Every column holding seconds since the epoch.
pub const TIMESTAMP_COLUMNS: &[(&str, &str)] = &[
  ("users", "created_at"),
  ("users", "updated_at"),
  ("clients", "created_at"),
  ("clients", "updated_at"),
  ("engagements", "year_end"),
  ("engagements", "created_at"),
  ("engagements", "updated_at"),
  ("rfis", "due_date"),
  ("rfis", "created_at"),
  ("rfis", "updated_at"),
  ("rfi_questions", "created_at"),
  ("rfi_responses", "created_at"),
  ("reviews", "created_at"),
  ("reviews", "updated_at"),
  ("review_highlights", "created_at"),
  ("messages", "created_at"),
  ("collaborators", "created_at"),
  ("checklists", "created_at"),
  ("checklists", "updated_at"),
  ("checklist_items", "done_at"),
  ("files", "created_at"),
  ("activity_logs", "created_at"),
  ("permissions", "created_at"),
];

pub struct TimestampNormalization;

impl Validator for TimestampNormalization {
  fn name(&self) -> &'static str { "Timestamp Normalization" }

  fn check(&self, conn: &Connection) -> rusqlite::Result<ValidationResult> {
    let mut problems = Vec::new();
    for (table, column) in TIMESTAMP_COLUMNS {
      let millis = count(
        conn,
        &format!(
          "SELECT COUNT(*) FROM {table}
           WHERE typeof({column}) = 'integer' AND {column} >= {MILLIS_THRESHOLD}"
        ),
      )?;
      if millis > 0 {
        problems.push(format!("{table}.{column}: {millis} values stored as milliseconds"));
      }

      let untyped = count(
        conn,
        &format!(
          "SELECT COUNT(*) FROM {table}
           WHERE {column} IS NOT NULL AND typeof({column}) <> 'integer'"
        ),
      )?;
      if untyped > 0 {
        problems.push(format!("{table}.{column}: {untyped} values are not integer seconds"));
      }
    }

    Ok(ValidationResult::from_problems(
      self.name(),
      problems,
      format!("{} timestamp columns in seconds", TIMESTAMP_COLUMNS.len()),
    ))
  }
}

// ─── File references ─────────────────────────────────────────────────────────

pub struct ReferenceValidity;

impl Validator for ReferenceValidity {
  fn name(&self) -> &'static str { "Reference Validity" }

  fn check(&self, conn: &Connection) -> rusqlite::Result<ValidationResult> {
    let unnamed = count(
      conn,
      "SELECT COUNT(*) FROM files WHERE name IS NULL OR trim(name) = ''",
    )?;
    let problems = if unnamed > 0 {
      vec![format!("files: {unnamed} rows without a name")]
    } else {
      Vec::new()
    };
    let files = count(conn, "SELECT COUNT(*) FROM files")?;
    Ok(ValidationResult::from_problems(self.name(), problems, format!("{files} files, all named")))
  }
}

// ─── Structured text ─────────────────────────────────────────────────────────

pub struct StructuredFieldValidity {
  /// `table.column` names.
  pub columns: Vec<String>,
}

impl Validator for StructuredFieldValidity {
  fn name(&self) -> &'static str { "Structured-Field Validity" }

  fn check(&self, conn: &Connection) -> rusqlite::Result<ValidationResult> {
    if self.columns.is_empty() {
      return Ok(ValidationResult::pass(
        self.name(),
        vec!["no structured columns declared".to_owned()],
      ));
    }

    let mut problems = Vec::new();
    for declared in &self.columns {
      let Some((table, column)) = declared
        .split_once('.')
        .filter(|(t, c)| is_identifier(t) && is_identifier(c))
      else {
        problems.push(format!("{declared}: not a table.column name"));
        continue;
      };
      if !table_exists(conn, table)? {
        problems.push(format!("{declared}: no such table"));
        continue;
      }

      let invalid = count(
        conn,
        &format!("SELECT COUNT(*) FROM {table} WHERE {column} IS NOT NULL AND NOT json_valid({column})"),
      )?;
      if invalid > 0 {
        problems.push(format!("{declared}: {invalid} values are not valid JSON"));
      }
    }

    Ok(ValidationResult::from_problems(
      self.name(),
      problems,
      format!("{} structured columns valid", self.columns.len()),
    ))
  }
}
