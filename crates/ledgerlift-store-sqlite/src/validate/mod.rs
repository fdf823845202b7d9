//! Post-commit validation suite.
//!
//! Eight read-only checks run against the committed target store, always
//! all of them and always in the same order. A FAIL here never undoes the
//! migration; it downgrades the run to PARTIAL.

mod integrity;
mod values;

use std::{collections::BTreeMap, time::Instant};

use ledgerlift_core::report::{ValidationReport, ValidationResult};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub use integrity::{
  ConstraintEnforcement, DataTypeAccuracy, FOREIGN_KEYS, ReferentialIntegrity, RowCount,
};
pub use values::{
  CoordinatePrecision, ReferenceValidity, StructuredFieldValidity, TIMESTAMP_COLUMNS,
  TimestampNormalization,
};

/// One read-only check.
pub trait Validator: Send + Sync {
  fn name(&self) -> &'static str;

  /// An `Err` means the check's own query failed; the suite reports that as
  /// a FAIL carrying the error text.
  fn check(&self, conn: &Connection) -> rusqlite::Result<ValidationResult>;
}

/// Per-run inputs for the validators that take any.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
  /// Expected row count per target table. Tables without an entry pass.
  #[serde(default)]
  pub expected_counts:    BTreeMap<String, i64>,
  /// `table.column` names holding serialised JSON.
  #[serde(default)]
  pub structured_columns: Vec<String>,
}

// ─── Suite ───────────────────────────────────────────────────────────────────

pub struct ValidationSuite {
  validators: Vec<Box<dyn Validator>>,
}

impl ValidationSuite {
  /// The eight standard validators in their fixed order.
  pub fn standard(config: ValidationConfig) -> Self {
    Self {
      validators: vec![
        Box::new(RowCount { expected: config.expected_counts }),
        Box::new(ReferentialIntegrity),
        Box::new(DataTypeAccuracy),
        Box::new(CoordinatePrecision),
        Box::new(TimestampNormalization),
        Box::new(ReferenceValidity),
        Box::new(StructuredFieldValidity { columns: config.structured_columns }),
        Box::new(ConstraintEnforcement),
      ],
    }
  }

  /// Run every validator without short-circuiting.
  pub fn run(&self, conn: &Connection) -> ValidationReport {
    let started = Instant::now();

    let results: Vec<ValidationResult> = self
      .validators
      .iter()
      .map(|v| {
        let result = v.check(conn).unwrap_or_else(|err| {
          ValidationResult::fail(v.name(), vec![format!("validator query failed: {err}")])
        });
        if result.passed() {
          tracing::info!(validator = v.name(), "validator passed");
        } else {
          tracing::warn!(validator = v.name(), details = ?result.details, "validator failed");
        }
        result
      })
      .collect();

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    ValidationReport::new(results, duration_ms)
  }

  pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.validators.iter().map(|v| v.name())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Table and column names from configuration end up in SQL text; only plain
/// identifiers are accepted.
pub(crate) fn is_identifier(s: &str) -> bool {
  !s.is_empty()
    && !s.starts_with(|c: char| c.is_ascii_digit())
    && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
  conn.query_row(
    "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
    [table],
    |row| row.get(0),
  )
}

pub(crate) fn count(conn: &Connection, sql: &str) -> rusqlite::Result<i64> {
  conn.query_row(sql, [], |row| row.get(0))
}
