//! Users and the identity map.
//!
//! A [`NormalizedUser`] is created once during deduplication and never
//! touched again. The [`IdentityMap`] records which target user every native
//! user id was folded into; many native ids may point at one target id, but a
//! native id never points at more than one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::SourceSystem;

/// Trim and lowercase an email address. This is the deduplication key.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

// ─── NormalizedUser ──────────────────────────────────────────────────────────

/// A target user row produced by deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedUser {
  /// Generated UUID, hyphenated lowercase.
  pub id:         String,
  /// Always already normalised with [`normalize_email`].
  pub email:      String,
  pub name:       Option<String>,
  pub photo_url:  Option<String>,
  pub role:       String,
  pub status:     String,
  /// Seconds since the Unix epoch.
  pub created_at: i64,
  pub updated_at: i64,
}

/// A user already present in the target store before the run.
#[derive(Debug, Clone)]
pub struct ExistingUser {
  pub id:    String,
  pub email: String,
}

// ─── Identity map ────────────────────────────────────────────────────────────

/// One native user id resolved to a target user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMapping {
  pub source:      SourceSystem,
  pub native_id:   String,
  pub target_id:   String,
  pub email:       String,
  /// `true` when the native id resolved to a user that existed in the target
  /// store before the run, rather than one created by it.
  pub dedup_match: bool,
}

/// Translation table from `(source, native id)` to target user id.
///
/// Passed explicitly to everything that needs it; tests build fakes with
/// [`IdentityMap::insert`].
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
  by_source: HashMap<String, HashMap<String, IdentityMapping>>,
  len:       usize,
}

impl IdentityMap {
  pub fn new() -> Self { Self::default() }

  /// Add a mapping. An existing mapping for the same native id is kept and
  /// `false` is returned: a native id is never re-pointed.
  pub fn insert(&mut self, mapping: IdentityMapping) -> bool {
    let ids = self
      .by_source
      .entry(mapping.source.as_str().to_owned())
      .or_default();
    if ids.contains_key(&mapping.native_id) {
      return false;
    }
    ids.insert(mapping.native_id.clone(), mapping);
    self.len += 1;
    true
  }

  pub fn get(&self, source: &SourceSystem, native_id: &str) -> Option<&IdentityMapping> {
    self.by_source.get(source.as_str())?.get(native_id)
  }

  /// The target user id for a native id, if it has been mapped.
  pub fn target_for(&self, source: &SourceSystem, native_id: &str) -> Option<&str> {
    self.get(source, native_id).map(|m| m.target_id.as_str())
  }

  pub fn len(&self) -> usize { self.len }

  pub fn is_empty(&self) -> bool { self.len == 0 }

  pub fn iter(&self) -> impl Iterator<Item = &IdentityMapping> {
    self.by_source.values().flat_map(HashMap::values)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mapping(source: &str, native: &str, target: &str) -> IdentityMapping {
    IdentityMapping {
      source:      SourceSystem::new(source),
      native_id:   native.into(),
      target_id:   target.into(),
      email:       "x@y.com".into(),
      dedup_match: false,
    }
  }

  #[test]
  fn normalize_trims_and_lowercases() {
    assert_eq!(normalize_email("  X@Y.Com \n"), "x@y.com");
  }

  #[test]
  fn many_native_ids_may_share_a_target() {
    let mut map = IdentityMap::new();
    assert!(map.insert(mapping("a", "a1", "t1")));
    assert!(map.insert(mapping("b", "b1", "t1")));
    assert_eq!(map.target_for(&SourceSystem::new("a"), "a1"), Some("t1"));
    assert_eq!(map.target_for(&SourceSystem::new("b"), "b1"), Some("t1"));
    assert_eq!(map.len(), 2);
  }

  #[test]
  fn native_id_is_never_repointed() {
    let mut map = IdentityMap::new();
    map.insert(mapping("a", "a1", "t1"));
    assert!(!map.insert(mapping("a", "a1", "t2")));
    assert_eq!(map.target_for(&SourceSystem::new("a"), "a1"), Some("t1"));
    assert_eq!(map.len(), 1);
  }

  #[test]
  fn same_native_id_in_different_sources_is_distinct() {
    let mut map = IdentityMap::new();
    map.insert(mapping("a", "1", "t1"));
    map.insert(mapping("b", "1", "t2"));
    assert_eq!(map.target_for(&SourceSystem::new("b"), "1"), Some("t2"));
    assert!(map.target_for(&SourceSystem::new("c"), "1").is_none());
  }
}
