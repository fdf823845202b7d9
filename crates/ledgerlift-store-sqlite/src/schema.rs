//! SQL schema for the ledgerlift target store.
//!
//! Executed once at connection startup. Every statement is idempotent, so
//! opening a store that already holds data (including users created outside
//! the migration) leaves it untouched.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY,        -- UUID for migrated users
    email       TEXT NOT NULL,           -- normalised: trimmed, lowercase
    name        TEXT,
    photo_url   TEXT,
    role        TEXT NOT NULL DEFAULT 'staff',
    status      TEXT NOT NULL DEFAULT 'active',
    created_at  INTEGER NOT NULL,        -- seconds since epoch
    updated_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS clients (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    industry      TEXT,
    contact_email TEXT,
    owner_id      TEXT REFERENCES users(id),
    metadata      TEXT,                  -- JSON
    created_at    INTEGER,
    updated_at    INTEGER
);

CREATE TABLE IF NOT EXISTS engagements (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id   INTEGER NOT NULL REFERENCES clients(id),
    name        TEXT NOT NULL,
    stage       TEXT NOT NULL,
    status      TEXT NOT NULL,
    year_end    INTEGER,
    partner_id  TEXT REFERENCES users(id),
    manager_id  TEXT REFERENCES users(id),
    is_archived INTEGER NOT NULL DEFAULT 0,
    settings    TEXT,                    -- JSON
    created_at  INTEGER,
    updated_at  INTEGER
);

CREATE TABLE IF NOT EXISTS rfis (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    engagement_id INTEGER NOT NULL REFERENCES engagements(id),
    title         TEXT NOT NULL,
    description   TEXT,
    status        TEXT NOT NULL,
    due_date      INTEGER,
    assigned_to   TEXT REFERENCES users(id),
    created_by    TEXT REFERENCES users(id),
    created_at    INTEGER,
    updated_at    INTEGER
);

CREATE TABLE IF NOT EXISTS rfi_questions (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    rfi_id     INTEGER NOT NULL REFERENCES rfis(id),
    question   TEXT NOT NULL,
    position   INTEGER NOT NULL,
    created_at INTEGER
);

CREATE TABLE IF NOT EXISTS rfi_responses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id  INTEGER NOT NULL REFERENCES rfi_questions(id),
    body         TEXT NOT NULL,
    responder_id TEXT REFERENCES users(id),
    attachments  TEXT,                   -- JSON
    created_at   INTEGER
);

CREATE TABLE IF NOT EXISTS reviews (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    engagement_id INTEGER NOT NULL REFERENCES engagements(id),
    title         TEXT NOT NULL,
    status        TEXT NOT NULL,
    reviewer_id   TEXT REFERENCES users(id),
    document_ref  TEXT,
    created_at    INTEGER,
    updated_at    INTEGER
);

-- Coordinates are exact integers; nothing is ever rounded on the way in.
CREATE TABLE IF NOT EXISTS review_highlights (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    review_id  INTEGER NOT NULL REFERENCES reviews(id),
    page       INTEGER,
    x          INTEGER NOT NULL,
    y          INTEGER NOT NULL,
    width      INTEGER NOT NULL,
    height     INTEGER NOT NULL,
    color      TEXT,
    comment    TEXT,
    author_id  TEXT REFERENCES users(id),
    created_at INTEGER
);

CREATE TABLE IF NOT EXISTS messages (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    engagement_id INTEGER NOT NULL REFERENCES engagements(id),
    sender_id     TEXT REFERENCES users(id),
    body          TEXT NOT NULL,
    attachments   TEXT,                  -- JSON
    is_read       INTEGER NOT NULL DEFAULT 0,
    created_at    INTEGER
);

CREATE TABLE IF NOT EXISTS collaborators (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    engagement_id INTEGER NOT NULL REFERENCES engagements(id),
    user_id       TEXT NOT NULL REFERENCES users(id),
    role          TEXT NOT NULL,
    created_at    INTEGER
);

CREATE TABLE IF NOT EXISTS checklists (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    engagement_id INTEGER NOT NULL REFERENCES engagements(id),
    title         TEXT NOT NULL,
    created_by    TEXT REFERENCES users(id),
    created_at    INTEGER,
    updated_at    INTEGER
);

CREATE TABLE IF NOT EXISTS checklist_items (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    checklist_id INTEGER NOT NULL REFERENCES checklists(id),
    label        TEXT NOT NULL,
    is_done      INTEGER NOT NULL DEFAULT 0,
    done_by      TEXT REFERENCES users(id),
    done_at      INTEGER,
    position     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    engagement_id INTEGER REFERENCES engagements(id),
    name          TEXT NOT NULL,
    storage_ref   TEXT,
    mime_type     TEXT,
    size_bytes    INTEGER,
    uploaded_by   TEXT REFERENCES users(id),
    created_at    INTEGER
);

CREATE TABLE IF NOT EXISTS activity_logs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    engagement_id INTEGER REFERENCES engagements(id),
    actor_id      TEXT REFERENCES users(id),
    action        TEXT NOT NULL,
    details       TEXT,                  -- JSON
    created_at    INTEGER
);

CREATE TABLE IF NOT EXISTS permissions (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       TEXT NOT NULL REFERENCES users(id),
    resource_type TEXT NOT NULL,
    resource_id   TEXT,
    role          TEXT NOT NULL,
    created_at    INTEGER
);

-- Durable identity map: every native user id and the target user it was
-- deduplicated into. Many native ids may share one target id.
CREATE TABLE IF NOT EXISTS migration_identity_map (
    source      TEXT NOT NULL,
    native_id   TEXT NOT NULL,
    target_id   TEXT NOT NULL,
    email       TEXT NOT NULL,
    dedup_match INTEGER NOT NULL DEFAULT 0,
    mapped_at   INTEGER NOT NULL,
    PRIMARY KEY (source, native_id)
);

-- Same idea for every other entity kind; keeps repeated runs from inserting
-- the same source record twice.
CREATE TABLE IF NOT EXISTS migration_entity_map (
    entity_kind TEXT NOT NULL,
    source      TEXT NOT NULL,
    native_id   TEXT NOT NULL,
    target_id   INTEGER NOT NULL,
    mapped_at   INTEGER NOT NULL,
    PRIMARY KEY (entity_kind, source, native_id)
);

CREATE INDEX IF NOT EXISTS users_email_idx            ON users(email);
CREATE INDEX IF NOT EXISTS identity_map_target_idx    ON migration_identity_map(target_id);
CREATE INDEX IF NOT EXISTS engagements_client_idx     ON engagements(client_id);
";

/// Every table the migration writes domain rows into, parents before
/// children.
pub const TARGET_TABLES: &[&str] = &[
  "users",
  "clients",
  "engagements",
  "rfis",
  "rfi_questions",
  "rfi_responses",
  "reviews",
  "review_highlights",
  "messages",
  "collaborators",
  "checklists",
  "checklist_items",
  "files",
  "activity_logs",
  "permissions",
];
