//! Target row shapes, one per entity kind.
//!
//! Foreign references are still *native* ids here; the store remaps them
//! through the identity map and entity id map at insert time. Timestamps are
//! integer seconds. Required fields are `Option` so that a record missing
//! them can still be transformed and then rejected by
//! [`validate_transformed_data`](crate::validate_transformed_data).

use crate::value::{Coordinate, StructuredText};

// ─── Users ───────────────────────────────────────────────────────────────────

/// A user candidate before deduplication. Enumerations are only present when
/// the source supplied them, so merging can backfill rather than default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRow {
  pub native_id:  Option<String>,
  /// Normalised (trimmed, lowercased).
  pub email:      Option<String>,
  pub name:       Option<String>,
  pub photo_url:  Option<String>,
  pub role:       Option<String>,
  pub status:     Option<String>,
  pub created_at: Option<i64>,
  pub updated_at: Option<i64>,
}

/// What [`UserRow::backfill`] changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Backfill {
  /// Fields that were empty and have been filled from the other row.
  pub filled:    Vec<&'static str>,
  /// Fields where both rows had differing values; the existing value won.
  pub conflicts: Vec<&'static str>,
}

impl UserRow {
  /// Fill every empty field from `other`, never overwriting a populated one.
  pub fn backfill(&mut self, other: &UserRow) -> Backfill {
    let mut out = Backfill::default();
    merge_field("name", &mut self.name, &other.name, &mut out);
    merge_field("photo_url", &mut self.photo_url, &other.photo_url, &mut out);
    merge_field("role", &mut self.role, &other.role, &mut out);
    merge_field("status", &mut self.status, &other.status, &mut out);
    merge_field("created_at", &mut self.created_at, &other.created_at, &mut out);
    merge_field("updated_at", &mut self.updated_at, &other.updated_at, &mut out);
    out
  }
}

fn merge_field<T: Clone + PartialEq>(
  name: &'static str,
  mine: &mut Option<T>,
  theirs: &Option<T>,
  out: &mut Backfill,
) {
  match (mine.as_ref(), theirs) {
    (None, Some(v)) => {
      *mine = Some(v.clone());
      out.filled.push(name);
    }
    (Some(a), Some(b)) if a != b => out.conflicts.push(name),
    _ => {}
  }
}

// ─── Clients & engagements ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ClientRow {
  pub native_id:     Option<String>,
  pub name:          Option<String>,
  pub industry:      Option<String>,
  pub contact_email: Option<String>,
  /// Native user id.
  pub owner_id:      Option<String>,
  pub metadata:      Option<StructuredText>,
  pub created_at:    Option<i64>,
  pub updated_at:    Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct EngagementRow {
  pub native_id:   Option<String>,
  /// Native client id.
  pub client_id:   Option<String>,
  pub name:        Option<String>,
  pub stage:       String,
  pub status:      String,
  pub year_end:    Option<i64>,
  pub partner_id:  Option<String>,
  pub manager_id:  Option<String>,
  pub is_archived: i64,
  pub settings:    Option<StructuredText>,
  pub created_at:  Option<i64>,
  pub updated_at:  Option<i64>,
}

// ─── Requests for information ────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RfiRow {
  pub native_id:     Option<String>,
  pub engagement_id: Option<String>,
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub status:        String,
  pub due_date:      Option<i64>,
  pub assigned_to:   Option<String>,
  pub created_by:    Option<String>,
  pub created_at:    Option<i64>,
  pub updated_at:    Option<i64>,
  pub questions:     Vec<RfiQuestionRow>,
}

#[derive(Debug, Clone, Default)]
pub struct RfiQuestionRow {
  pub question:   Option<String>,
  pub position:   i64,
  pub created_at: Option<i64>,
  pub responses:  Vec<RfiResponseRow>,
}

#[derive(Debug, Clone, Default)]
pub struct RfiResponseRow {
  pub body:         Option<String>,
  pub responder_id: Option<String>,
  pub attachments:  Option<StructuredText>,
  pub created_at:   Option<i64>,
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ReviewRow {
  pub native_id:     Option<String>,
  pub engagement_id: Option<String>,
  pub title:         Option<String>,
  pub status:        String,
  pub reviewer_id:   Option<String>,
  pub document_ref:  Option<String>,
  pub created_at:    Option<i64>,
  pub updated_at:    Option<i64>,
  pub highlights:    Vec<HighlightRow>,
}

/// A rectangle drawn on a reviewed document. Coordinates are copied through
/// exactly; nothing here rounds.
#[derive(Debug, Clone, Default)]
pub struct HighlightRow {
  pub page:       Option<i64>,
  pub x:          Option<Coordinate>,
  pub y:          Option<Coordinate>,
  pub width:      Option<Coordinate>,
  pub height:     Option<Coordinate>,
  pub color:      Option<String>,
  pub comment:    Option<String>,
  pub author_id:  Option<String>,
  pub created_at: Option<i64>,
}

// ─── Messages & collaborators ────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MessageRow {
  pub native_id:     Option<String>,
  pub engagement_id: Option<String>,
  pub sender_id:     Option<String>,
  pub body:          Option<String>,
  pub attachments:   Option<StructuredText>,
  pub is_read:       i64,
  pub created_at:    Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct CollaboratorRow {
  pub native_id:     Option<String>,
  pub engagement_id: Option<String>,
  pub user_id:       Option<String>,
  pub role:          String,
  pub created_at:    Option<i64>,
}

// ─── Checklists ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ChecklistRow {
  pub native_id:     Option<String>,
  pub engagement_id: Option<String>,
  pub title:         Option<String>,
  pub created_by:    Option<String>,
  pub created_at:    Option<i64>,
  pub updated_at:    Option<i64>,
  pub items:         Vec<ChecklistItemRow>,
}

#[derive(Debug, Clone, Default)]
pub struct ChecklistItemRow {
  pub label:    Option<String>,
  pub is_done:  i64,
  pub done_by:  Option<String>,
  pub done_at:  Option<i64>,
  pub position: i64,
}

// ─── Files, activity, permissions ────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FileRow {
  pub native_id:     Option<String>,
  pub engagement_id: Option<String>,
  pub name:          Option<String>,
  pub storage_ref:   Option<String>,
  pub mime_type:     Option<String>,
  pub size_bytes:    Option<i64>,
  pub uploaded_by:   Option<String>,
  pub created_at:    Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityLogRow {
  pub native_id:     Option<String>,
  pub engagement_id: Option<String>,
  pub actor_id:      Option<String>,
  pub action:        Option<String>,
  pub details:       Option<StructuredText>,
  pub created_at:    Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct PermissionRow {
  pub native_id:     Option<String>,
  pub user_id:       Option<String>,
  pub resource_type: String,
  /// Native id of the resource, interpreted according to `resource_type`.
  pub resource_id:   Option<String>,
  pub role:          String,
  pub created_at:    Option<i64>,
}

// ─── TargetRow ───────────────────────────────────────────────────────────────

/// A borrowed view of any transformed row, parent or nested child.
#[derive(Debug, Clone, Copy)]
pub enum TargetRow<'a> {
  User(&'a UserRow),
  Client(&'a ClientRow),
  Engagement(&'a EngagementRow),
  Rfi(&'a RfiRow),
  RfiQuestion(&'a RfiQuestionRow),
  RfiResponse(&'a RfiResponseRow),
  Review(&'a ReviewRow),
  Highlight(&'a HighlightRow),
  Message(&'a MessageRow),
  Collaborator(&'a CollaboratorRow),
  Checklist(&'a ChecklistRow),
  ChecklistItem(&'a ChecklistItemRow),
  File(&'a FileRow),
  ActivityLog(&'a ActivityLogRow),
  Permission(&'a PermissionRow),
}

impl TargetRow<'_> {
  /// The target table this row lands in.
  pub fn table(&self) -> &'static str {
    match self {
      Self::User(_) => "users",
      Self::Client(_) => "clients",
      Self::Engagement(_) => "engagements",
      Self::Rfi(_) => "rfis",
      Self::RfiQuestion(_) => "rfi_questions",
      Self::RfiResponse(_) => "rfi_responses",
      Self::Review(_) => "reviews",
      Self::Highlight(_) => "review_highlights",
      Self::Message(_) => "messages",
      Self::Collaborator(_) => "collaborators",
      Self::Checklist(_) => "checklists",
      Self::ChecklistItem(_) => "checklist_items",
      Self::File(_) => "files",
      Self::ActivityLog(_) => "activity_logs",
      Self::Permission(_) => "permissions",
    }
  }
}

/// Rows that can be validated through [`TargetRow`].
pub trait AsTargetRow {
  fn as_target_row(&self) -> TargetRow<'_>;

  /// The native id of a top-level row; children have none.
  fn native_id(&self) -> Option<&str> { None }
}

macro_rules! target_row {
  ($ty:ty, $variant:ident) => {
    impl AsTargetRow for $ty {
      fn as_target_row(&self) -> TargetRow<'_> { TargetRow::$variant(self) }
    }
  };
  ($ty:ty, $variant:ident, native) => {
    impl AsTargetRow for $ty {
      fn as_target_row(&self) -> TargetRow<'_> { TargetRow::$variant(self) }

      fn native_id(&self) -> Option<&str> { self.native_id.as_deref() }
    }
  };
}

target_row!(UserRow, User, native);
target_row!(ClientRow, Client, native);
target_row!(EngagementRow, Engagement, native);
target_row!(RfiRow, Rfi, native);
target_row!(RfiQuestionRow, RfiQuestion);
target_row!(RfiResponseRow, RfiResponse);
target_row!(ReviewRow, Review, native);
target_row!(HighlightRow, Highlight);
target_row!(MessageRow, Message, native);
target_row!(CollaboratorRow, Collaborator, native);
target_row!(ChecklistRow, Checklist, native);
target_row!(ChecklistItemRow, ChecklistItem);
target_row!(FileRow, File, native);
target_row!(ActivityLogRow, ActivityLog, native);
target_row!(PermissionRow, Permission, native);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn backfill_fills_gaps_and_keeps_first_values() {
    let mut first = UserRow {
      native_id: Some("a1".into()),
      email: Some("x@y.com".into()),
      name: Some("Foo".into()),
      role: Some("admin".into()),
      ..Default::default()
    };
    let second = UserRow {
      native_id: Some("b1".into()),
      email: Some("x@y.com".into()),
      name: Some("Bar".into()),
      photo_url: Some("p.png".into()),
      role: Some("admin".into()),
      ..Default::default()
    };

    let backfill = first.backfill(&second);
    assert_eq!(first.name.as_deref(), Some("Foo"));
    assert_eq!(first.photo_url.as_deref(), Some("p.png"));
    assert_eq!(backfill.filled, ["photo_url"]);
    assert_eq!(backfill.conflicts, ["name"]);
    // Identity fields are never touched by a merge.
    assert_eq!(first.native_id.as_deref(), Some("a1"));
  }
}
