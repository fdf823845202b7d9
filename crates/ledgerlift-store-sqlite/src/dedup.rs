//! User deduplication across source systems.
//!
//! [`deduplicate`] is pure: it decides, for every candidate user record,
//! which target user it resolves to. [`apply`] then writes the new users and
//! mappings inside the caller's transaction. [`verify_unique_emails`] is the
//! post-insert check that no normalised email ended up on two users.

use std::collections::{BTreeMap, HashMap, HashSet};

use ledgerlift_core::{
  record::SourceRecord,
  report::{DedupSummary, MigrationStats, ValidationResult},
  user::{ExistingUser, IdentityMap, IdentityMapping, NormalizedUser},
};
use ledgerlift_transform::{
  AsTargetRow, USER_ROLE, USER_STATUS, UserRow, transform_user, validate_transformed_data,
};
use rusqlite::Connection;
use uuid::Uuid;

use crate::identity::{load_existing_users, persist_mappings};

pub const DEDUP_VALIDATOR: &str = "Deduplication";

/// A user minted by this run, with the locator of the record that created
/// it for log lines.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub user:    NormalizedUser,
  pub locator: String,
}

/// Everything [`deduplicate`] decided.
#[derive(Debug, Default)]
pub struct DedupOutcome {
  pub new_users:    Vec<NewUser>,
  /// Mappings not yet in the persisted identity map.
  pub new_mappings: Vec<IdentityMapping>,
  pub summary:      DedupSummary,
  /// `migrated` is left at zero here; [`apply`] counts actual inserts.
  pub stats:        MigrationStats,
}

// ─── Deduplicate ─────────────────────────────────────────────────────────────

struct Pending {
  id:      String,
  row:     UserRow,
  locator: String,
}

/// Resolve every user record to a target user id.
///
/// `records` must already be in source order (first reader first, source
/// order within a reader). For each valid candidate, in order:
///
/// 0. a native id already in `persisted` keeps its mapping;
/// 1. an email matching a user already in the target store maps to it;
/// 2. an email seen earlier in this run maps to that user and backfills its
///    empty fields;
/// 3. otherwise a new user is minted.
pub fn deduplicate(
  records: &[SourceRecord],
  existing: &[ExistingUser],
  persisted: &IdentityMap,
  now: i64,
) -> DedupOutcome {
  let mut out = DedupOutcome::default();

  let mut existing_by_email: HashMap<&str, &str> = HashMap::new();
  for user in existing {
    existing_by_email.entry(user.email.as_str()).or_insert(user.id.as_str());
  }

  let mut pending: Vec<Pending> = Vec::new();
  let mut pending_by_email: HashMap<String, usize> = HashMap::new();
  let mut this_run = IdentityMap::new();

  for record in records {
    out.stats.processed += 1;
    let row = transform_user(record);

    let problems = validate_transformed_data(row.as_target_row());
    let (true, Some(native_id), Some(email)) =
      (problems.is_empty(), row.native_id.clone(), row.email.clone())
    else {
      tracing::warn!(record = %record.locator(), ?problems, "invalid user record, skipping");
      out.summary.invalid += 1;
      out.stats.errors += 1;
      continue;
    };

    let source = &record.source_system;

    // 0. Mapped by an earlier run, or repeated within this one.
    if persisted.get(source, &native_id).is_some() {
      out.summary.already_mapped += 1;
      out.stats.skipped += 1;
      continue;
    }
    if this_run.get(source, &native_id).is_some() {
      tracing::warn!(record = %record.locator(), "duplicate native user id in source, skipping");
      out.stats.skipped += 1;
      continue;
    }

    // 1. Pre-existing target user.
    if let Some(target_id) = existing_by_email.get(email.as_str()) {
      tracing::debug!(record = %record.locator(), target_id, "matched existing user by email");
      let mapping = IdentityMapping {
        source: source.clone(),
        native_id,
        target_id: (*target_id).to_owned(),
        email,
        dedup_match: true,
      };
      this_run.insert(mapping.clone());
      out.new_mappings.push(mapping);
      out.summary.matched_existing += 1;
      out.stats.skipped += 1;
      continue;
    }

    // 2. Seen earlier in this run.
    if let Some(&index) = pending_by_email.get(&email) {
      let target = &mut pending[index];
      let backfill = target.row.backfill(&row);
      for field in &backfill.conflicts {
        tracing::debug!(
          kept = %target.locator,
          discarded = %record.locator(),
          field,
          "conflicting user field, keeping first value"
        );
      }
      if !backfill.filled.is_empty() {
        tracing::debug!(record = %record.locator(), filled = ?backfill.filled, "backfilled merged user");
      }
      let mapping = IdentityMapping {
        source: source.clone(),
        native_id,
        target_id: target.id.clone(),
        email,
        dedup_match: false,
      };
      this_run.insert(mapping.clone());
      out.new_mappings.push(mapping);
      out.summary.merged += 1;
      out.stats.skipped += 1;
      continue;
    }

    // 3. New user.
    let id = Uuid::new_v4().hyphenated().to_string();
    let mapping = IdentityMapping {
      source: source.clone(),
      native_id,
      target_id: id.clone(),
      email: email.clone(),
      dedup_match: false,
    };
    this_run.insert(mapping.clone());
    out.new_mappings.push(mapping);
    pending_by_email.insert(email, pending.len());
    pending.push(Pending { id, row, locator: record.locator() });
    out.summary.created += 1;
  }

  out.new_users = pending
    .into_iter()
    .map(|p| NewUser { user: finish_user(p.id, p.row, now), locator: p.locator })
    .collect();
  out
}

fn finish_user(id: String, row: UserRow, now: i64) -> NormalizedUser {
  let created_at = row.created_at.or(row.updated_at).unwrap_or(now);
  NormalizedUser {
    id,
    email: row.email.unwrap_or_default(),
    name: row.name,
    photo_url: row.photo_url,
    role: row.role.unwrap_or_else(|| USER_ROLE.default.to_owned()),
    status: row.status.unwrap_or_else(|| USER_STATUS.default.to_owned()),
    created_at,
    updated_at: row.updated_at.unwrap_or(created_at),
  }
}

// ─── Apply ───────────────────────────────────────────────────────────────────

/// Insert the new users and persist the new mappings, updating `identity`
/// in place. Mappings that point at a user whose insert failed are dropped
/// so nothing can later reference a missing row.
pub fn apply(
  conn: &Connection,
  outcome: &DedupOutcome,
  identity: &mut IdentityMap,
) -> rusqlite::Result<MigrationStats> {
  let mut stats = outcome.stats.clone();
  let mut failed: HashSet<&str> = HashSet::new();

  let mut stmt = conn.prepare(
    "INSERT INTO users (id, email, name, photo_url, role, status, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
  )?;
  for NewUser { user, locator } in &outcome.new_users {
    let result = stmt.execute(rusqlite::params![
      user.id,
      user.email,
      user.name,
      user.photo_url,
      user.role,
      user.status,
      user.created_at,
      user.updated_at,
    ]);
    match result {
      Ok(_) => stats.migrated += 1,
      Err(err) => {
        tracing::error!(record = %locator, entity = "user", error = %err, "user insert failed");
        stats.errors += 1;
        failed.insert(user.id.as_str());
      }
    }
  }

  let mappings: Vec<IdentityMapping> = outcome
    .new_mappings
    .iter()
    .filter(|m| !failed.contains(m.target_id.as_str()))
    .cloned()
    .collect();
  persist_mappings(conn, &mappings)?;
  for mapping in mappings {
    identity.insert(mapping);
  }

  Ok(stats)
}

// ─── Verification ────────────────────────────────────────────────────────────

/// FAIL if any normalised email is held by more than one distinct user.
///
/// Emails are normalised with the same rule deduplication uses, not with
/// SQLite's ASCII-only `lower`.
pub fn verify_unique_emails(conn: &Connection) -> rusqlite::Result<ValidationResult> {
  let users = load_existing_users(conn)?;

  let mut by_email: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
  for user in &users {
    by_email.entry(user.email.as_str()).or_default().insert(user.id.as_str());
  }
  let problems = by_email
    .iter()
    .filter(|(_, ids)| ids.len() > 1)
    .map(|(email, ids)| format!("{email} is held by {} users", ids.len()))
    .collect();

  Ok(ValidationResult::from_problems(
    DEDUP_VALIDATOR,
    problems,
    format!("{} users, every email unique", users.len()),
  ))
}
