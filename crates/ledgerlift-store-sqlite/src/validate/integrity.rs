//! Structural validators: row counts, foreign keys, declared column types
//! and SQLite's own consistency checks.

use std::collections::BTreeMap;

use ledgerlift_core::report::ValidationResult;
use rusqlite::{Connection, OptionalExtension as _};

use super::{Validator, count, is_identifier, table_exists};
use crate::schema::TARGET_TABLES;

// ─── Row count ───────────────────────────────────────────────────────────────

pub struct RowCount {
  pub expected: BTreeMap<String, i64>,
}

impl Validator for RowCount {
  fn name(&self) -> &'static str { "Row Count" }

  fn check(&self, conn: &Connection) -> rusqlite::Result<ValidationResult> {
    let mut counts = Vec::with_capacity(TARGET_TABLES.len());
    for table in TARGET_TABLES {
      let n = count(conn, &format!("SELECT COUNT(*) FROM {table}"))?;
      counts.push(format!("{table}: {n}"));
    }

    let mut problems = Vec::new();
    for (table, expected) in &self.expected {
      if !is_identifier(table) || !table_exists(conn, table)? {
        problems.push(format!("{table}: no such table"));
        continue;
      }
      let actual = count(conn, &format!("SELECT COUNT(*) FROM {table}"))?;
      if actual != *expected {
        problems.push(format!("{table}: expected {expected} rows, found {actual}"));
      }
    }

    Ok(if problems.is_empty() {
      ValidationResult::pass(self.name(), counts)
    } else {
      ValidationResult::fail(self.name(), problems)
    })
  }
}

// ─── Referential integrity ───────────────────────────────────────────────────

/// `(table, foreign key column, referenced table)`; every reference targets
/// the referenced table's `id`.
pub const FOREIGN_KEYS: &[(&str, &str, &str)] = &[
  ("clients", "owner_id", "users"),
  ("engagements", "client_id", "clients"),
  ("engagements", "partner_id", "users"),
  ("engagements", "manager_id", "users"),
  ("rfis", "engagement_id", "engagements"),
  ("rfis", "assigned_to", "users"),
  ("rfis", "created_by", "users"),
  ("rfi_questions", "rfi_id", "rfis"),
  ("rfi_responses", "question_id", "rfi_questions"),
  ("rfi_responses", "responder_id", "users"),
  ("reviews", "engagement_id", "engagements"),
  ("reviews", "reviewer_id", "users"),
  ("review_highlights", "review_id", "reviews"),
  ("review_highlights", "author_id", "users"),
  ("messages", "engagement_id", "engagements"),
  ("messages", "sender_id", "users"),
  ("collaborators", "engagement_id", "engagements"),
  ("collaborators", "user_id", "users"),
  ("checklists", "engagement_id", "engagements"),
  ("checklists", "created_by", "users"),
  ("checklist_items", "checklist_id", "checklists"),
  ("checklist_items", "done_by", "users"),
  ("files", "engagement_id", "engagements"),
  ("files", "uploaded_by", "users"),
  ("activity_logs", "engagement_id", "engagements"),
  ("activity_logs", "actor_id", "users"),
  ("permissions", "user_id", "users"),
];

pub struct ReferentialIntegrity;

impl Validator for ReferentialIntegrity {
  fn name(&self) -> &'static str { "Referential Integrity" }

  fn check(&self, conn: &Connection) -> rusqlite::Result<ValidationResult> {
    let mut problems = Vec::new();
    for (table, fk, referenced) in FOREIGN_KEYS {
      let orphans = count(
        conn,
        &format!(
          "SELECT COUNT(*) FROM {table}
           WHERE {fk} IS NOT NULL AND {fk} NOT IN (SELECT id FROM {referenced})"
        ),
      )?;
      if orphans > 0 {
        problems.push(format!("{table}.{fk} -> {referenced}: {orphans} orphaned rows"));
      }
    }
    Ok(ValidationResult::from_problems(
      self.name(),
      problems,
      format!("{} foreign keys checked, no orphans", FOREIGN_KEYS.len()),
    ))
  }
}

// ─── Data types ──────────────────────────────────────────────────────────────

/// `(table, column, declared type)` for every column whose storage type the
/// migration depends on.
const EXPECTED_TYPES: &[(&str, &str, &str)] = &[
  ("users", "id", "TEXT"),
  ("users", "created_at", "INTEGER"),
  ("users", "updated_at", "INTEGER"),
  ("clients", "metadata", "TEXT"),
  ("clients", "created_at", "INTEGER"),
  ("engagements", "client_id", "INTEGER"),
  ("engagements", "year_end", "INTEGER"),
  ("engagements", "is_archived", "INTEGER"),
  ("engagements", "settings", "TEXT"),
  ("rfis", "due_date", "INTEGER"),
  ("rfi_questions", "position", "INTEGER"),
  ("rfi_responses", "attachments", "TEXT"),
  ("review_highlights", "x", "INTEGER"),
  ("review_highlights", "y", "INTEGER"),
  ("review_highlights", "width", "INTEGER"),
  ("review_highlights", "height", "INTEGER"),
  ("messages", "is_read", "INTEGER"),
  ("messages", "attachments", "TEXT"),
  ("checklist_items", "is_done", "INTEGER"),
  ("checklist_items", "done_at", "INTEGER"),
  ("files", "size_bytes", "INTEGER"),
  ("activity_logs", "details", "TEXT"),
  ("activity_logs", "created_at", "INTEGER"),
  ("permissions", "resource_id", "TEXT"),
];

pub struct DataTypeAccuracy;

impl Validator for DataTypeAccuracy {
  fn name(&self) -> &'static str { "Data Type Accuracy" }

  fn check(&self, conn: &Connection) -> rusqlite::Result<ValidationResult> {
    let mut stmt = conn.prepare("SELECT upper(type) FROM pragma_table_info(?1) WHERE name = ?2")?;
    let mut problems = Vec::new();

    for (table, column, expected) in EXPECTED_TYPES {
      let declared: Option<String> = stmt
        .query_row([table, column], |row| row.get(0))
        .optional()?;
      match declared {
        None => problems.push(format!("{table}.{column}: column missing")),
        Some(declared) if declared != *expected => {
          problems.push(format!("{table}.{column}: declared {declared}, expected {expected}"));
        }
        Some(_) => {}
      }
    }

    Ok(ValidationResult::from_problems(
      self.name(),
      problems,
      format!("{} column types match", EXPECTED_TYPES.len()),
    ))
  }
}

// ─── Constraint enforcement ──────────────────────────────────────────────────

pub struct ConstraintEnforcement;

impl Validator for ConstraintEnforcement {
  fn name(&self) -> &'static str { "Constraint Enforcement" }

  fn check(&self, conn: &Connection) -> rusqlite::Result<ValidationResult> {
    let mut problems = Vec::new();

    let enforced: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    if enforced != 1 {
      problems.push("foreign key enforcement is off".to_owned());
    }

    let mut fk_check = conn.prepare("PRAGMA foreign_key_check")?;
    let violations = fk_check
      .query_map([], |row| {
        let table: String = row.get(0)?;
        let rowid: Option<i64> = row.get(1)?;
        let parent: String = row.get(2)?;
        Ok(format!(
          "{table} row {} violates a foreign key to {parent}",
          rowid.map_or_else(|| "?".to_owned(), |r| r.to_string())
        ))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    problems.extend(violations);

    let mut integrity = conn.prepare("PRAGMA integrity_check")?;
    let report = integrity
      .query_map([], |row| row.get::<_, String>(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    if report != ["ok"] {
      problems.extend(report.into_iter().map(|line| format!("integrity_check: {line}")));
    }

    Ok(ValidationResult::from_problems(
      self.name(),
      problems,
      "foreign keys enforced, store consistent".to_owned(),
    ))
  }
}
