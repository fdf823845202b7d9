//! Encoding helpers between transformed rows and SQLite column values, plus
//! the raw row shapes read back out of the mapping tables.
//!
//! Timestamps are already integer seconds by the time they get here.
//! Structured fields are stored as the serialised JSON text they carry.
//! Coordinates are stored as exact integers when they are integral and as
//! REAL otherwise (the precision validator flags the latter).

use ledgerlift_core::{
  record::SourceSystem,
  user::{ExistingUser, IdentityMapping},
};
use ledgerlift_transform::{Coordinate, StructuredText};
use rusqlite::types::Value;

// ─── StructuredText ──────────────────────────────────────────────────────────

pub fn encode_structured(text: &Option<StructuredText>) -> Option<&str> {
  text.as_ref().map(StructuredText::as_str)
}

// ─── Coordinate ──────────────────────────────────────────────────────────────

pub fn encode_coordinate(c: &Option<Coordinate>) -> Value {
  match c {
    None => Value::Null,
    Some(c) => match c.as_exact_integer() {
      Some(i) => Value::Integer(i),
      None => c.as_f64().map_or(Value::Null, Value::Real),
    },
  }
}

// ─── Booleans ────────────────────────────────────────────────────────────────

pub fn encode_bool(b: bool) -> i64 { i64::from(b) }

pub fn decode_bool(i: i64) -> bool { i != 0 }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `migration_identity_map` row.
pub struct RawMapping {
  pub source:      String,
  pub native_id:   String,
  pub target_id:   String,
  pub email:       String,
  pub dedup_match: i64,
}

impl RawMapping {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source:      row.get(0)?,
      native_id:   row.get(1)?,
      target_id:   row.get(2)?,
      email:       row.get(3)?,
      dedup_match: row.get(4)?,
    })
  }

  pub fn into_mapping(self) -> IdentityMapping {
    IdentityMapping {
      source:      SourceSystem::new(self.source),
      native_id:   self.native_id,
      target_id:   self.target_id,
      email:       self.email,
      dedup_match: decode_bool(self.dedup_match),
    }
  }
}

/// Raw values read from a `users` row that predates the run.
pub struct RawUser {
  pub id:    String,
  pub email: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, email: row.get(1)? })
  }

  pub fn into_existing(self) -> ExistingUser {
    ExistingUser {
      id:    self.id,
      email: ledgerlift_core::user::normalize_email(&self.email),
    }
  }
}
