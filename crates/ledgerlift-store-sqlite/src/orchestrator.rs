//! Runs one migration end to end.
//!
//! ```text
//! fetch → INIT → BACKED_UP → IN_TRANSACTION → COMMITTED → VALIDATED → DONE
//!                                           ↘ ROLLED_BACK
//! ```
//!
//! Source fetches are the only concurrent phase. Everything between BEGIN
//! and COMMIT runs inside a single call on the store's connection thread, so
//! nothing in the transaction ever waits on the network.

use std::{
  collections::{BTreeMap, HashMap},
  fmt,
  path::PathBuf,
  sync::Arc,
  time::Duration,
};

use chrono::Utc;
use futures::future::try_join_all;
use ledgerlift_core::{
  entity::EntityKind,
  reader::SourceReader,
  record::{FetchOutcome, SourceRecord, SourceSystem},
  report::{DedupSummary, EntityStats, MigrationReport, RunStatus, ValidationResult},
};
use rusqlite::{Connection, TransactionBehavior};

use crate::{
  Result,
  dedup,
  identity::{EntityIdMap, load_existing_users, load_identity_map},
  migrate::{MigrationContext, MigratorRegistry, UnmappedRefPolicy},
  store::TargetStore,
  validate::ValidationConfig,
};

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MigrationOptions {
  /// Directory the pre-run backup is written into.
  pub backup_dir:    PathBuf,
  /// Upper bound on each single collection fetch.
  pub fetch_timeout: Duration,
  /// Maximum documents fetched per collection.
  pub fetch_limit:   Option<usize>,
  pub unmapped_refs: UnmappedRefPolicy,
  pub validation:    ValidationConfig,
  /// Run everything, then roll back instead of committing.
  pub dry_run:       bool,
}

impl MigrationOptions {
  pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
    Self {
      backup_dir:    backup_dir.into(),
      fetch_timeout: Duration::from_secs(30),
      fetch_limit:   None,
      unmapped_refs: UnmappedRefPolicy::default(),
      validation:    ValidationConfig::default(),
      dry_run:       false,
    }
  }
}

// ─── Run state ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
  Init,
  BackedUp,
  InTransaction,
  Committed,
  RolledBack,
  Validated,
  Done,
}

impl fmt::Display for RunState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Init => "INIT",
      Self::BackedUp => "BACKED_UP",
      Self::InTransaction => "IN_TRANSACTION",
      Self::Committed => "COMMITTED",
      Self::RolledBack => "ROLLED_BACK",
      Self::Validated => "VALIDATED",
      Self::Done => "DONE",
    })
  }
}

// ─── Fetched data ────────────────────────────────────────────────────────────

/// Every record of every source, grouped by kind in reader order.
#[derive(Debug, Default)]
struct Fetched {
  batches:   HashMap<EntityKind, Vec<SourceRecord>>,
  malformed: BTreeMap<String, usize>,
}

/// What the transactional phase hands back.
struct Applied {
  summary:     DedupSummary,
  dedup_check: ValidationResult,
  stats:       Vec<EntityStats>,
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

pub struct Orchestrator {
  store:    TargetStore,
  readers:  Vec<Arc<dyn SourceReader>>,
  registry: Arc<MigratorRegistry>,
  options:  MigrationOptions,
}

impl Orchestrator {
  /// `readers` are consulted in order: on conflicting user fields the
  /// earlier reader's value wins.
  pub fn new(
    store: TargetStore,
    readers: Vec<Arc<dyn SourceReader>>,
    options: MigrationOptions,
  ) -> Self {
    Self {
      store,
      readers,
      registry: Arc::new(MigratorRegistry::standard()),
      options,
    }
  }

  pub fn with_registry(mut self, registry: MigratorRegistry) -> Self {
    self.registry = Arc::new(registry);
    self
  }

  /// Run the migration. An `Err` means nothing was committed.
  pub async fn run(&self) -> Result<MigrationReport> {
    let started_at = Utc::now();
    tracing::info!(
      sources = self.readers.len(),
      dry_run = self.options.dry_run,
      "starting migration"
    );

    let fetched = self.fetch_all().await?;

    tracing::info!(state = %RunState::Init, "disabling foreign key enforcement");
    self.store.set_foreign_keys(false).await?;

    let backup_path = match self.store.backup(&self.options.backup_dir).await {
      Ok(path) => path,
      Err(err) => {
        tracing::error!(error = %err, "backup failed, aborting before any change");
        self.restore_foreign_keys().await;
        return Err(err);
      }
    };
    tracing::info!(state = %RunState::BackedUp, path = %backup_path.display());

    let applied = match self.transact(fetched.batches).await {
      Ok(applied) => applied,
      Err(err) => {
        self.restore_foreign_keys().await;
        return Err(err);
      }
    };
    self.store.set_foreign_keys(true).await?;

    let validation = if self.options.dry_run {
      None
    } else {
      let report = self.store.validate(self.options.validation.clone()).await?;
      tracing::info!(
        state = %RunState::Validated,
        overall = ?report.overall_status,
        duration_ms = report.duration_ms
      );
      Some(report)
    };

    let status = match &validation {
      None => RunStatus::DryRun,
      Some(v) if v.passed() && applied.dedup_check.passed() => RunStatus::Success,
      Some(_) => RunStatus::Partial,
    };
    tracing::info!(state = %RunState::Done, ?status, "migration finished");

    Ok(MigrationReport {
      status,
      started_at,
      finished_at: Utc::now(),
      backup_path: Some(backup_path),
      malformed: fetched.malformed,
      dedup_summary: applied.summary,
      dedup_check: Some(applied.dedup_check),
      migration_stats: applied.stats,
      validation,
    })
  }

  /// Re-enable foreign keys on a failure path. A failure here is logged so
  /// the error that aborted the run is the one returned.
  async fn restore_foreign_keys(&self) {
    if let Err(err) = self.store.set_foreign_keys(true).await {
      tracing::error!(error = %err, "re-enabling foreign key enforcement failed");
    }
  }

  // ── Fetch ─────────────────────────────────────────────────────────────────

  async fn fetch_all(&self) -> Result<Fetched> {
    let timeout = self.options.fetch_timeout;
    let limit = self.options.fetch_limit;

    let fetches = self.readers.iter().flat_map(|reader| {
      EntityKind::MIGRATION_ORDER
        .into_iter()
        .map(move |kind| fetch_collection(Arc::clone(reader), kind, timeout, limit))
    });
    // try_join_all keeps input order, so reader order survives.
    let results = try_join_all(fetches).await?;

    let mut fetched = Fetched::default();
    for (system, kind, outcome) in results {
      if outcome.malformed > 0 {
        fetched
          .malformed
          .insert(format!("{system}/{}", kind.collection()), outcome.malformed);
      }
      fetched.batches.entry(kind).or_default().extend(outcome.records);
    }

    let total: usize = fetched.batches.values().map(Vec::len).sum();
    tracing::info!(records = total, "fetched all sources");
    Ok(fetched)
  }

  // ── Transaction ───────────────────────────────────────────────────────────

  async fn transact(&self, batches: HashMap<EntityKind, Vec<SourceRecord>>) -> Result<Applied> {
    let registry = Arc::clone(&self.registry);
    let policy = self.options.unmapped_refs;
    let dry_run = self.options.dry_run;

    self
      .store
      .connection()
      .call(move |conn| Ok(run_transaction(conn, &registry, &batches, policy, dry_run)))
      .await?
  }
}

async fn fetch_collection(
  reader: Arc<dyn SourceReader>,
  kind: EntityKind,
  timeout: Duration,
  limit: Option<usize>,
) -> Result<(SourceSystem, EntityKind, FetchOutcome)> {
  let system = reader.system().clone();
  let collection = kind.collection();

  let outcome = match tokio::time::timeout(timeout, reader.fetch(collection, limit)).await {
    Ok(outcome) => outcome?,
    Err(_) => {
      return Err(
        ledgerlift_core::Error::FetchTimeout {
          source_system: system.to_string(),
          collection:    collection.to_owned(),
          after:         timeout,
        }
        .into(),
      );
    }
  };

  tracing::debug!(source = %system, collection, records = outcome.records.len(), "fetched collection");
  Ok((system, kind, outcome))
}

fn run_transaction(
  conn: &mut Connection,
  registry: &MigratorRegistry,
  batches: &HashMap<EntityKind, Vec<SourceRecord>>,
  policy: UnmappedRefPolicy,
  dry_run: bool,
) -> Result<Applied> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
  tracing::info!(state = %RunState::InTransaction);

  match migrate_all(&tx, registry, batches, policy) {
    Ok(applied) if !dry_run => {
      tx.commit()?;
      tracing::info!(state = %RunState::Committed);
      Ok(applied)
    }
    Ok(applied) => {
      if let Err(err) = tx.rollback() {
        tracing::error!(error = %err, "rollback after dry run failed");
      }
      tracing::info!(state = %RunState::RolledBack, "dry run, nothing committed");
      Ok(applied)
    }
    Err(err) => {
      tracing::error!(error = %err, "migration failed, rolling back");
      if let Err(rollback) = tx.rollback() {
        tracing::error!(error = %rollback, "rollback failed");
      }
      tracing::info!(state = %RunState::RolledBack);
      Err(err)
    }
  }
}

fn migrate_all(
  conn: &Connection,
  registry: &MigratorRegistry,
  batches: &HashMap<EntityKind, Vec<SourceRecord>>,
  policy: UnmappedRefPolicy,
) -> Result<Applied> {
  let records = |kind: EntityKind| batches.get(&kind).map_or(&[][..], Vec::as_slice);

  let mut identity = load_identity_map(conn)?;
  let existing = load_existing_users(conn)?;
  let mut entities = EntityIdMap::load(conn)?;

  let outcome = dedup::deduplicate(
    records(EntityKind::User),
    &existing,
    &identity,
    Utc::now().timestamp(),
  );
  let user_stats = dedup::apply(conn, &outcome, &mut identity)?;
  let dedup_check = dedup::verify_unique_emails(conn)?;
  tracing::info!(
    created = outcome.summary.created,
    merged = outcome.summary.merged,
    matched_existing = outcome.summary.matched_existing,
    already_mapped = outcome.summary.already_mapped,
    invalid = outcome.summary.invalid,
    "users deduplicated"
  );

  let mut stats = vec![EntityStats { entity: EntityKind::User, stats: user_stats }];
  let mut cx = MigrationContext {
    conn,
    identity: &identity,
    entities: &mut entities,
    policy,
  };
  for migrator in registry.iter() {
    let kind = migrator.kind();
    let migrated = migrator.migrate(&mut cx, records(kind))?;
    stats.push(EntityStats { entity: kind, stats: migrated });
  }

  Ok(Applied { summary: outcome.summary, dedup_check, stats })
}
