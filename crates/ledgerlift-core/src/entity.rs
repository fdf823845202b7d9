//! Entity kinds handled by the migration engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One kind of top-level target entity. Nested children (RFI questions,
/// review highlights, checklist items, ...) belong to their parent's kind.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  User,
  Client,
  Engagement,
  Rfi,
  Review,
  Message,
  Collaborator,
  Checklist,
  File,
  ActivityLog,
  Permission,
}

impl EntityKind {
  /// Every kind, in the order the orchestrator migrates them. Later kinds may
  /// only reference earlier ones.
  pub const MIGRATION_ORDER: [EntityKind; 11] = [
    Self::User,
    Self::Client,
    Self::Engagement,
    Self::Rfi,
    Self::Review,
    Self::Message,
    Self::Collaborator,
    Self::Checklist,
    Self::File,
    Self::ActivityLog,
    Self::Permission,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Client => "client",
      Self::Engagement => "engagement",
      Self::Rfi => "rfi",
      Self::Review => "review",
      Self::Message => "message",
      Self::Collaborator => "collaborator",
      Self::Checklist => "checklist",
      Self::File => "file",
      Self::ActivityLog => "activity_log",
      Self::Permission => "permission",
    }
  }

  /// The source collection key holding records of this kind.
  pub fn collection(self) -> &'static str {
    match self {
      Self::User => "users",
      Self::Client => "clients",
      Self::Engagement => "engagements",
      Self::Rfi => "rfis",
      Self::Review => "reviews",
      Self::Message => "messages",
      Self::Collaborator => "collaborators",
      Self::Checklist => "checklists",
      Self::File => "files",
      Self::ActivityLog => "activity_logs",
      Self::Permission => "permissions",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::MIGRATION_ORDER.into_iter().find(|k| k.as_str() == s)
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_roundtrips_every_kind() {
    for kind in EntityKind::MIGRATION_ORDER {
      assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(EntityKind::parse("nope"), None);
  }

  #[test]
  fn users_come_first_and_engagements_follow_clients() {
    let order = EntityKind::MIGRATION_ORDER;
    let pos = |k| order.iter().position(|o| *o == k).unwrap();
    assert_eq!(pos(EntityKind::User), 0);
    assert!(pos(EntityKind::Client) < pos(EntityKind::Engagement));
    assert!(pos(EntityKind::Engagement) < pos(EntityKind::Rfi));
    assert!(pos(EntityKind::Checklist) < pos(EntityKind::File));
  }
}
