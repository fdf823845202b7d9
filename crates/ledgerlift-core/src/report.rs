//! Migration statistics, validation results and the final run report.

use std::{collections::BTreeMap, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;

// ─── Migration stats ─────────────────────────────────────────────────────────

/// Counts for nested child rows of a composite entity (e.g. review
/// highlights).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedStats {
  pub migrated: u64,
  pub skipped:  u64,
  pub errors:   u64,
}

/// Per-migrator counters.
///
/// `processed == migrated + skipped + errors` always holds for the top-level
/// counts. `migrated` only ever counts rows actually inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStats {
  pub processed: u64,
  pub migrated:  u64,
  pub skipped:   u64,
  pub errors:    u64,
  /// Child-row counts keyed by child table name.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub nested:    BTreeMap<String, NestedStats>,
}

impl MigrationStats {
  pub fn nested_mut(&mut self, child: &str) -> &mut NestedStats {
    self.nested.entry(child.to_owned()).or_default()
  }
}

/// Stats for one entity kind, as listed in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
  pub entity: EntityKind,
  #[serde(flatten)]
  pub stats:  MigrationStats,
}

/// How user deduplication resolved each candidate record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupSummary {
  /// New target users minted by this run.
  pub created:          u64,
  /// Records folded into a user created earlier in the same run.
  pub merged:           u64,
  /// Records resolved to a user that already existed in the target store.
  pub matched_existing: u64,
  /// Records whose native id was already mapped by an earlier run.
  pub already_mapped:   u64,
  /// Records missing an id or an email.
  pub invalid:          u64,
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
  Pass,
  Fail,
}

/// The outcome of one read-only check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
  pub validator: String,
  pub status:    ValidationStatus,
  pub details:   Vec<String>,
}

impl ValidationResult {
  pub fn pass(validator: &str, details: Vec<String>) -> Self {
    Self { validator: validator.to_owned(), status: ValidationStatus::Pass, details }
  }

  pub fn fail(validator: &str, details: Vec<String>) -> Self {
    Self { validator: validator.to_owned(), status: ValidationStatus::Fail, details }
  }

  /// PASS when `problems` is empty, FAIL listing them otherwise.
  pub fn from_problems(validator: &str, problems: Vec<String>, ok_detail: String) -> Self {
    if problems.is_empty() {
      Self::pass(validator, vec![ok_detail])
    } else {
      Self::fail(validator, problems)
    }
  }

  pub fn passed(&self) -> bool { self.status == ValidationStatus::Pass }
}

/// Results of the full validator suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
  pub overall_status: ValidationStatus,
  pub results:        Vec<ValidationResult>,
  pub duration_ms:    u64,
}

impl ValidationReport {
  pub fn new(results: Vec<ValidationResult>, duration_ms: u64) -> Self {
    let overall_status = if results.iter().all(ValidationResult::passed) {
      ValidationStatus::Pass
    } else {
      ValidationStatus::Fail
    };
    Self { overall_status, results, duration_ms }
  }

  pub fn passed(&self) -> bool { self.overall_status == ValidationStatus::Pass }
}

// ─── Run report ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
  /// Committed, and every check passed.
  Success,
  /// Committed, but at least one check failed. Data stays for manual review.
  Partial,
  /// Everything ran inside the transaction, which was then rolled back.
  DryRun,
}

/// Everything an operator needs to judge a run without re-running it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
  pub status:          RunStatus,
  pub started_at:      DateTime<Utc>,
  pub finished_at:     DateTime<Utc>,
  pub backup_path:     Option<PathBuf>,
  /// Malformed source items skipped during fetch, keyed by
  /// `source/collection`.
  pub malformed:       BTreeMap<String, usize>,
  pub dedup_summary:   DedupSummary,
  /// Post-insert uniqueness check on normalised emails.
  pub dedup_check:     Option<ValidationResult>,
  pub migration_stats: Vec<EntityStats>,
  /// `None` for dry runs, which never reach the validators.
  pub validation:      Option<ValidationReport>,
}

impl MigrationReport {
  pub fn stats_for(&self, entity: EntityKind) -> Option<&MigrationStats> {
    self
      .migration_stats
      .iter()
      .find(|s| s.entity == entity)
      .map(|s| &s.stats)
  }
}
