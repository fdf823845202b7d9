//! Integration tests for the orchestrator against in-memory and temp-dir
//! SQLite stores.

use std::{
  sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
  },
  time::Duration,
};

use ledgerlift_core::{
  entity::EntityKind,
  reader::{MemoryReader, SourceReader},
  record::{FetchOutcome, SourceRecord, SourceSystem},
  report::{MigrationReport, MigrationStats, RunStatus, ValidationStatus},
};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{
  EntityMigrator, Error, MigrationContext, MigrationOptions, MigratorRegistry, Orchestrator,
  Result, TARGET_TABLES, TargetStore, UnmappedRefPolicy, migrate::ChecklistMigrator,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn store() -> TargetStore {
  TargetStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn options(dir: &TempDir) -> MigrationOptions { MigrationOptions::new(dir.path().join("backups")) }

fn reader(name: &str, collections: Vec<(&str, Vec<Value>)>) -> Arc<dyn SourceReader> {
  let reader = collections
    .into_iter()
    .fold(MemoryReader::new(SourceSystem::new(name)), |r, (collection, docs)| {
      r.with_collection(collection, docs)
    });
  Arc::new(reader)
}

async fn exec(s: &TargetStore, sql: &'static str) {
  s.connection()
    .call(move |conn| {
      conn.execute_batch(sql)?;
      Ok(())
    })
    .await
    .unwrap();
}

async fn query_i64(s: &TargetStore, sql: &'static str) -> i64 {
  s.connection()
    .call(move |conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
    .await
    .unwrap()
}

async fn query_text(s: &TargetStore, sql: &'static str) -> Option<String> {
  s.connection()
    .call(move |conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
    .await
    .unwrap()
}

async fn run(
  s: &TargetStore,
  readers: Vec<Arc<dyn SourceReader>>,
  options: MigrationOptions,
) -> MigrationReport {
  Orchestrator::new(s.clone(), readers, options)
    .run()
    .await
    .expect("migration run")
}

fn validator<'a>(report: &'a MigrationReport, name: &str) -> &'a ledgerlift_core::report::ValidationResult {
  report
    .validation
    .as_ref()
    .expect("validation ran")
    .results
    .iter()
    .find(|r| r.validator == name)
    .expect("validator present")
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn legacy_a() -> Arc<dyn SourceReader> {
  reader("legacy-a", vec![
    ("users", vec![
      json!({ "id": "a1", "email": "X@Y.com", "name": "Foo", "role": "Admin", "createdAt": 1_700_000_000_000i64 }),
      json!({ "id": "a2", "email": "other@y.com", "name": "Other" }),
    ]),
    ("clients", vec![json!({
      "id": "c1",
      "name": "Acme",
      "ownerId": "a1",
      "metadata": { "tier": "gold" },
      "createdAt": { "_seconds": 1_690_000_000 }
    })]),
    ("engagements", vec![json!({
      "id": "e1",
      "clientId": "c1",
      "name": "FY24 audit",
      "stage": "Fieldwork",
      "partnerId": "a1",
      "managerId": "a2",
      "yearEnd": "31/12/24"
    })]),
    ("rfis", vec![json!({
      "id": "q1",
      "engagementId": "e1",
      "title": "Bank letters",
      "assignedTo": "a2",
      "questions": [{
        "question": "Send bank confirmations",
        "responses": [{ "response": "Attached", "respondedBy": "a2" }]
      }]
    })]),
    ("reviews", vec![json!({
      "id": "r1",
      "engagementId": "e1",
      "title": "TB review",
      "reviewerId": "a1",
      "highlights": [{
        "position": { "x": 10, "y": 20, "width": 300, "height": 40 },
        "authorId": "a2",
        "comment": "check"
      }]
    })]),
    ("messages", vec![json!({
      "id": "m1",
      "engagementId": "e1",
      "senderId": "a1",
      "body": "Hello",
      "isRead": "true",
      "sentAt": "2024-01-02T03:04:05Z"
    })]),
    ("collaborators", vec![json!({ "id": "k1", "engagementId": "e1", "userId": "a2", "role": "Editor" })]),
    ("checklists", vec![json!({
      "id": "cl1",
      "engagementId": "e1",
      "title": "Planning",
      "items": [{ "label": "Kickoff", "done": true, "doneBy": "a1" }, { "label": "Budget" }]
    })]),
    ("files", vec![json!({ "id": "f1", "engagementId": "e1", "name": "tb.xlsx", "uploadedBy": "a2", "size": 1024 })]),
    ("activity_logs", vec![json!({
      "id": "l1",
      "engagementId": "e1",
      "userId": "a1",
      "action": "login",
      "details": { "ip": "10.0.0.1" }
    })]),
    ("permissions", vec![json!({
      "id": "p1",
      "userId": "a2",
      "resourceType": "engagement",
      "resourceId": "e1",
      "role": "write"
    })]),
  ])
}

fn legacy_b() -> Arc<dyn SourceReader> {
  reader("legacy-b", vec![
    ("users", vec![json!({ "id": "b1", "email": " x@y.com", "name": "Bar", "photoUrl": "p.png" })]),
    ("activity_logs", vec![json!({ "id": "l1", "userId": "b1", "action": "export" })]),
  ])
}

/// One engagement with `checklists` checklists of two items each.
fn with_checklists(checklists: Vec<Value>) -> Arc<dyn SourceReader> {
  reader("legacy-a", vec![
    ("users", vec![json!({ "id": "a1", "email": "a@y.com" })]),
    ("clients", vec![json!({ "id": "c1", "name": "Acme" })]),
    ("engagements", vec![json!({ "id": "e1", "clientId": "c1", "name": "FY24" })]),
    ("checklists", checklists),
  ])
}

fn checklist(id: usize) -> Value {
  json!({
    "id": format!("cl{id}"),
    "engagementId": "e1",
    "title": format!("List {id}"),
    "items": [{ "label": "one" }, { "label": "two", "done": 1 }]
  })
}

// ─── Full run ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_run_succeeds_and_merges_users() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let mut opts = options(&dir);
  opts.validation.structured_columns = vec!["clients.metadata".into(), "activity_logs.details".into()];

  let report = run(&s, vec![legacy_a(), legacy_b()], opts).await;

  assert_eq!(report.status, RunStatus::Success, "{report:#?}");
  assert_eq!(report.dedup_summary.created, 2);
  assert_eq!(report.dedup_summary.merged, 1);
  assert!(report.dedup_check.as_ref().is_some_and(|c| c.passed()));

  assert_eq!(s.count_rows("users").await.unwrap(), 2);
  assert_eq!(s.identity_map().await.unwrap().len(), 3);
  for (table, expected) in [
    ("clients", 1),
    ("engagements", 1),
    ("rfis", 1),
    ("rfi_questions", 1),
    ("rfi_responses", 1),
    ("reviews", 1),
    ("review_highlights", 1),
    ("messages", 1),
    ("collaborators", 1),
    ("checklists", 1),
    ("checklist_items", 2),
    ("files", 1),
    ("activity_logs", 2),
    ("permissions", 1),
  ] {
    assert_eq!(s.count_rows(table).await.unwrap(), expected, "{table}");
  }

  // First source wins on conflicts; gaps are backfilled from the second.
  assert_eq!(query_text(&s, "SELECT name FROM users WHERE email = 'x@y.com'").await.as_deref(), Some("Foo"));
  assert_eq!(query_text(&s, "SELECT photo_url FROM users WHERE email = 'x@y.com'").await.as_deref(), Some("p.png"));
  assert_eq!(query_text(&s, "SELECT role FROM users WHERE email = 'x@y.com'").await.as_deref(), Some("admin"));

  // Both sources' activity logs point at the one merged user.
  assert_eq!(query_i64(&s, "SELECT COUNT(DISTINCT actor_id) FROM activity_logs").await, 1);

  assert_eq!(query_i64(&s, "SELECT created_at FROM users WHERE email = 'x@y.com'").await, 1_700_000_000);
  assert_eq!(query_i64(&s, "SELECT created_at FROM clients").await, 1_690_000_000);
  assert_eq!(query_i64(&s, "SELECT created_at FROM messages").await, 1_704_164_645);
  assert_eq!(query_i64(&s, "SELECT is_read FROM messages").await, 1);
  assert_eq!(query_text(&s, "SELECT stage FROM engagements").await.as_deref(), Some("fieldwork"));
  assert_eq!(query_text(&s, "SELECT role FROM collaborators").await.as_deref(), Some("editor"));
  assert_eq!(
    query_text(&s, "SELECT resource_id FROM permissions").await,
    query_text(&s, "SELECT CAST(id AS TEXT) FROM engagements").await,
  );

  let stats = report.stats_for(EntityKind::Checklist).unwrap();
  assert_eq!((stats.processed, stats.migrated), (1, 1));
  assert_eq!(stats.nested["checklist_items"].migrated, 2);

  let validation = report.validation.as_ref().unwrap();
  assert_eq!(validation.results.len(), 8);
  assert_eq!(validation.overall_status, ValidationStatus::Pass);
}

#[tokio::test]
async fn second_run_is_idempotent() {
  let dir = TempDir::new().unwrap();
  let s = store().await;

  run(&s, vec![legacy_a(), legacy_b()], options(&dir)).await;
  let before: Vec<i64> = {
    let mut counts = Vec::new();
    for table in TARGET_TABLES {
      counts.push(s.count_rows(table).await.unwrap());
    }
    counts
  };

  let report = run(&s, vec![legacy_a(), legacy_b()], options(&dir)).await;
  for (table, expected) in TARGET_TABLES.iter().zip(before) {
    assert_eq!(s.count_rows(table).await.unwrap(), expected, "{table}");
  }
  assert_eq!(s.identity_map().await.unwrap().len(), 3);

  assert_eq!(report.status, RunStatus::Success);
  assert_eq!(report.dedup_summary.already_mapped, 3);
  assert_eq!(report.dedup_summary.created, 0);
  let clients = report.stats_for(EntityKind::Client).unwrap();
  assert_eq!((clients.processed, clients.migrated, clients.skipped), (1, 0, 1));
}

#[tokio::test]
async fn pre_existing_user_is_matched_by_email() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  exec(
    &s,
    "INSERT INTO users (id, email, role, status, created_at, updated_at)
     VALUES ('u-existing', 'X@y.com', 'partner', 'active', 1, 1)",
  )
  .await;

  let report = run(&s, vec![legacy_a(), legacy_b()], options(&dir)).await;

  assert_eq!(report.status, RunStatus::Success, "{report:#?}");
  assert_eq!(report.dedup_summary.matched_existing, 2);
  assert_eq!(s.count_rows("users").await.unwrap(), 2);

  let identity = s.identity_map().await.unwrap();
  let a1 = identity.get(&SourceSystem::new("legacy-a"), "a1").unwrap();
  assert_eq!(a1.target_id, "u-existing");
  assert!(a1.dedup_match);
  assert_eq!(
    identity.target_for(&SourceSystem::new("legacy-b"), "b1"),
    Some("u-existing")
  );
}

#[tokio::test]
async fn duplicate_emails_fail_the_dedup_check() {
  let s = store().await;
  exec(
    &s,
    "INSERT INTO users (id, email, created_at, updated_at) VALUES ('u1', 'dup@y.com', 1, 1);
     INSERT INTO users (id, email, created_at, updated_at) VALUES ('u2', ' DUP@y.com', 1, 1);",
  )
  .await;

  let check = s.verify_deduplication().await.unwrap();
  assert_eq!(check.status, ValidationStatus::Fail);
  assert_eq!(check.details, ["dup@y.com is held by 2 users"]);
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

/// Migrates checklists one record at a time and fails on record `fail_at`,
/// noting how many checklist rows the open transaction held at that point.
struct FaultyChecklists {
  fail_at:       usize,
  rows_at_fault: Arc<AtomicI64>,
}

impl EntityMigrator for FaultyChecklists {
  fn kind(&self) -> EntityKind { EntityKind::Checklist }

  fn migrate(&self, cx: &mut MigrationContext<'_>, records: &[SourceRecord]) -> Result<MigrationStats> {
    let mut stats = MigrationStats::default();
    for (i, record) in records.iter().enumerate() {
      if i == self.fail_at {
        let rows: i64 = cx.conn.query_row("SELECT COUNT(*) FROM checklists", [], |r| r.get(0))?;
        self.rows_at_fault.store(rows, Ordering::SeqCst);
        return Err(Error::Migrator { kind: self.kind(), reason: "injected fault".into() });
      }
      let one = ChecklistMigrator.migrate(cx, std::slice::from_ref(record))?;
      stats.processed += one.processed;
      stats.migrated += one.migrated;
    }
    Ok(stats)
  }
}

#[tokio::test]
async fn injected_fault_rolls_back_everything() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let rows_at_fault = Arc::new(AtomicI64::new(-1));
  let mut registry = MigratorRegistry::standard();
  registry.register(FaultyChecklists { fail_at: 4, rows_at_fault: Arc::clone(&rows_at_fault) });

  let checklists = (0..10).map(checklist).collect();
  let result = Orchestrator::new(s.clone(), vec![with_checklists(checklists)], options(&dir))
    .with_registry(registry)
    .run()
    .await;

  assert!(matches!(result, Err(Error::Migrator { kind: EntityKind::Checklist, .. })));
  // Four checklists were written before the fifth failed.
  assert_eq!(rows_at_fault.load(Ordering::SeqCst), 4);
  for table in TARGET_TABLES {
    assert_eq!(s.count_rows(table).await.unwrap(), 0, "{table}");
  }
  assert!(s.identity_map().await.unwrap().is_empty());
  assert!(s.entity_map().await.unwrap().is_empty());
  assert_eq!(query_i64(&s, "PRAGMA foreign_keys").await, 1);
}

#[tokio::test]
async fn failed_backup_aborts_before_any_change() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let not_a_dir = dir.path().join("backups");
  std::fs::write(&not_a_dir, "occupied").unwrap();

  let result = Orchestrator::new(s.clone(), vec![legacy_a()], MigrationOptions::new(&not_a_dir))
    .run()
    .await;

  assert!(matches!(result, Err(Error::Backup { .. })));
  for table in TARGET_TABLES {
    assert_eq!(s.count_rows(table).await.unwrap(), 0, "{table}");
  }
  assert_eq!(query_i64(&s, "PRAGMA foreign_keys").await, 1);
}

/// A source that never answers in time.
struct StalledReader {
  system: SourceSystem,
}

#[async_trait::async_trait]
impl SourceReader for StalledReader {
  fn system(&self) -> &SourceSystem { &self.system }

  async fn fetch(&self, _collection: &str, _limit: Option<usize>) -> ledgerlift_core::Result<FetchOutcome> {
    tokio::time::sleep(Duration::from_secs(30)).await;
    Ok(FetchOutcome::default())
  }
}

#[tokio::test]
async fn slow_source_times_out_before_backup() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let stalled: Arc<dyn SourceReader> = Arc::new(StalledReader { system: SourceSystem::new("legacy-b") });
  let mut opts = options(&dir);
  opts.fetch_timeout = Duration::from_millis(50);

  let result = Orchestrator::new(s.clone(), vec![legacy_a(), stalled], opts).run().await;

  match result {
    Err(Error::Core(ledgerlift_core::Error::FetchTimeout { source_system, after, .. })) => {
      assert_eq!(source_system, "legacy-b");
      assert_eq!(after, Duration::from_millis(50));
    }
    other => panic!("expected a fetch timeout, got {other:?}"),
  }
  assert!(!dir.path().join("backups").exists());
  assert_eq!(s.count_rows("users").await.unwrap(), 0);
}

#[tokio::test]
async fn unreachable_source_aborts_before_backup() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let down: Arc<dyn SourceReader> = Arc::new(MemoryReader::unavailable(SourceSystem::new("legacy-b")));

  let result = Orchestrator::new(s.clone(), vec![legacy_a(), down], options(&dir))
    .run()
    .await;

  assert!(matches!(result, Err(Error::Core(ledgerlift_core::Error::SourceUnavailable { .. }))));
  assert!(!dir.path().join("backups").exists());
  assert_eq!(s.count_rows("users").await.unwrap(), 0);
}

// ─── Row-level isolation ─────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_record_is_skipped_without_affecting_others() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let mut checklists: Vec<Value> = (0..10).map(checklist).collect();
  checklists[3].as_object_mut().unwrap().remove("title");

  let report = run(&s, vec![with_checklists(checklists)], options(&dir)).await;

  let stats = report.stats_for(EntityKind::Checklist).unwrap();
  assert_eq!(
    (stats.processed, stats.migrated, stats.skipped, stats.errors),
    (10, 9, 1, 0)
  );
  assert_eq!(s.count_rows("checklists").await.unwrap(), 9);
  assert_eq!(s.count_rows("checklist_items").await.unwrap(), 18);
}

#[tokio::test]
async fn failed_inserts_are_counted_and_the_run_commits() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  exec(
    &s,
    "CREATE TRIGGER reject_list_4 BEFORE INSERT ON checklists WHEN NEW.title = 'List 4'
     BEGIN SELECT RAISE(ABORT, 'rejected'); END;
     CREATE TRIGGER reject_bad_item BEFORE INSERT ON checklist_items WHEN NEW.label = 'bad'
     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
  )
  .await;
  let mut checklists: Vec<Value> = (0..10).map(checklist).collect();
  checklists[6]["items"].as_array_mut().unwrap().push(json!({ "label": "bad" }));

  let report = run(&s, vec![with_checklists(checklists)], options(&dir)).await;

  assert_eq!(report.status, RunStatus::Success, "{report:#?}");
  let stats = report.stats_for(EntityKind::Checklist).unwrap();
  assert_eq!(
    (stats.processed, stats.migrated, stats.skipped, stats.errors),
    (10, 9, 0, 1)
  );
  let items = &stats.nested["checklist_items"];
  assert_eq!((items.migrated, items.skipped, items.errors), (18, 0, 1));

  assert_eq!(s.count_rows("checklists").await.unwrap(), 9);
  assert_eq!(s.count_rows("checklist_items").await.unwrap(), 18);
  assert_eq!(
    query_text(&s, "SELECT title FROM checklists WHERE title = 'List 6'").await.as_deref(),
    Some("List 6")
  );
}

#[tokio::test]
async fn invalid_child_rows_are_counted_not_fatal() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let source = reader("legacy-a", vec![
    ("clients", vec![json!({ "id": "c1", "name": "Acme" })]),
    ("engagements", vec![json!({ "id": "e1", "clientId": "c1", "name": "FY24" })]),
    ("reviews", vec![json!({
      "id": "r1",
      "engagementId": "e1",
      "title": "TB",
      "highlights": [
        { "x": 9_007_199_254_740_993i64, "y": 0, "width": 1, "height": 1 },
        { "x": 2.5, "y": 0, "width": 1, "height": 1 },
        { "x": 1, "y": 1 }
      ]
    })]),
  ]);

  let report = run(&s, vec![source], options(&dir)).await;

  let stats = report.stats_for(EntityKind::Review).unwrap();
  assert_eq!(stats.migrated, 1);
  let highlights = &stats.nested["review_highlights"];
  assert_eq!((highlights.migrated, highlights.skipped), (1, 2));

  // Coordinates survive bit-for-bit.
  assert_eq!(query_i64(&s, "SELECT x FROM review_highlights").await, 9_007_199_254_740_993);
  assert_eq!(validator(&report, "Coordinate Precision").status, ValidationStatus::Pass);
}

// ─── Unmapped references ─────────────────────────────────────────────────────

fn orphaned_message() -> Arc<dyn SourceReader> {
  reader("legacy-a", vec![
    ("users", vec![json!({ "id": "a1", "email": "a@y.com" })]),
    ("messages", vec![json!({ "id": "m1", "engagementId": "gone", "senderId": "a1", "body": "hi" })]),
  ])
}

#[tokio::test]
async fn permissive_policy_keeps_orphans_and_flags_them() {
  let dir = TempDir::new().unwrap();
  let s = store().await;

  let report = run(&s, vec![orphaned_message()], options(&dir)).await;

  assert_eq!(report.status, RunStatus::Partial);
  assert_eq!(s.count_rows("messages").await.unwrap(), 1);
  let integrity = validator(&report, "Referential Integrity");
  assert_eq!(integrity.status, ValidationStatus::Fail);
  assert!(integrity.details.iter().any(|d| d.starts_with("messages.engagement_id")));
  assert_eq!(validator(&report, "Constraint Enforcement").status, ValidationStatus::Fail);
}

#[tokio::test]
async fn engagement_without_its_client_is_an_orphan() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let source = reader("legacy-a", vec![
    ("engagements", vec![json!({ "id": "e1", "clientId": "nope", "name": "FY24" })]),
  ]);

  let report = run(&s, vec![source], options(&dir)).await;

  assert_eq!(report.status, RunStatus::Partial);
  let integrity = validator(&report, "Referential Integrity");
  assert_eq!(integrity.status, ValidationStatus::Fail);
  assert_eq!(integrity.details, ["engagements.client_id -> clients: 1 orphaned rows"]);
}

#[tokio::test]
async fn strict_policy_skips_records_with_unmapped_refs() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let mut opts = options(&dir);
  opts.unmapped_refs = UnmappedRefPolicy::Strict;

  let report = run(&s, vec![orphaned_message()], opts).await;

  assert_eq!(report.status, RunStatus::Success, "{report:#?}");
  let stats = report.stats_for(EntityKind::Message).unwrap();
  assert_eq!((stats.processed, stats.migrated, stats.skipped), (1, 0, 1));
  assert_eq!(s.count_rows("messages").await.unwrap(), 0);
}

// ─── Backups & dry runs ──────────────────────────────────────────────────────

#[tokio::test]
async fn backup_is_written_before_migrating() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("target.sqlite");
  let s = TargetStore::open(&path).await.unwrap();

  let report = run(&s, vec![legacy_a()], options(&dir)).await;

  let backup = report.backup_path.expect("backup path");
  assert!(backup.starts_with(dir.path().join("backups")));
  assert!(backup.file_name().unwrap().to_string_lossy().starts_with("target-"));

  // The backup holds the pre-run state: schema, no users.
  let copy = TargetStore::open(&backup).await.unwrap();
  assert_eq!(copy.count_rows("users").await.unwrap(), 0);
  assert_eq!(s.count_rows("users").await.unwrap(), 2);
}

#[tokio::test]
async fn dry_run_rolls_back_and_skips_validation() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let mut opts = options(&dir);
  opts.dry_run = true;

  let report = run(&s, vec![legacy_a(), legacy_b()], opts).await;

  assert_eq!(report.status, RunStatus::DryRun);
  assert!(report.validation.is_none());
  assert_eq!(report.stats_for(EntityKind::Client).unwrap().migrated, 1);
  for table in TARGET_TABLES {
    assert_eq!(s.count_rows(table).await.unwrap(), 0, "{table}");
  }
  assert!(s.identity_map().await.unwrap().is_empty());
}

#[tokio::test]
async fn row_count_expectations_are_checked() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let mut opts = options(&dir);
  opts.validation.expected_counts.insert("users".into(), 2);
  opts.validation.expected_counts.insert("clients".into(), 5);

  let report = run(&s, vec![legacy_a(), legacy_b()], opts).await;

  assert_eq!(report.status, RunStatus::Partial);
  let rows = validator(&report, "Row Count");
  assert_eq!(rows.details, ["clients: expected 5 rows, found 1"]);
}

#[tokio::test]
async fn malformed_items_are_reported() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let source = reader("legacy-a", vec![
    ("users", vec![json!({ "id": "a1", "email": "a@y.com" }), json!("not a document"), json!(42)]),
  ]);

  let report = run(&s, vec![source], options(&dir)).await;

  assert_eq!(report.malformed.get("legacy-a/users"), Some(&2));
  assert_eq!(s.count_rows("users").await.unwrap(), 1);
}
