//! Per-entity-kind transforms: raw source record → target row.
//!
//! Each function is pure. Field spellings cover both legacy systems
//! (camelCase document fields and snake_case export columns).

use ledgerlift_core::{record::SourceRecord, user::normalize_email};

use crate::{fields::Fields, rows::*, value::EnumField};

// ─── Enumerations ────────────────────────────────────────────────────────────

pub const USER_ROLE: EnumField = EnumField {
  field:   "role",
  allowed: &["admin", "partner", "manager", "staff", "client"],
  default: "staff",
};

pub const USER_STATUS: EnumField = EnumField {
  field:   "status",
  allowed: &["active", "inactive", "invited", "disabled"],
  default: "active",
};

pub const ENGAGEMENT_STAGE: EnumField = EnumField {
  field:   "stage",
  allowed: &["planning", "fieldwork", "review", "reporting", "complete"],
  default: "planning",
};

pub const ENGAGEMENT_STATUS: EnumField = EnumField {
  field:   "status",
  allowed: &["active", "on_hold", "closed", "archived"],
  default: "active",
};

pub const RFI_STATUS: EnumField = EnumField {
  field:   "status",
  allowed: &["open", "in_progress", "answered", "closed"],
  default: "open",
};

pub const REVIEW_STATUS: EnumField = EnumField {
  field:   "status",
  allowed: &["draft", "in_review", "changes_requested", "approved"],
  default: "draft",
};

pub const COLLABORATOR_ROLE: EnumField = EnumField {
  field:   "role",
  allowed: &["owner", "editor", "commenter", "viewer"],
  default: "viewer",
};

pub const PERMISSION_ROLE: EnumField = EnumField {
  field:   "role",
  allowed: &["admin", "write", "read"],
  default: "read",
};

pub const PERMISSION_RESOURCE: EnumField = EnumField {
  field:   "resource_type",
  allowed: &["client", "engagement", "rfi", "review", "checklist", "file"],
  default: "engagement",
};

// ─── Shared spellings ────────────────────────────────────────────────────────

const CREATED_AT: &[&str] = &["createdAt", "created_at", "dateCreated", "created"];
const UPDATED_AT: &[&str] = &["updatedAt", "updated_at", "dateModified", "modified"];
const ENGAGEMENT_ID: &[&str] = &["engagementId", "engagement_id", "engagement"];

fn with_fields<T>(record: &SourceRecord, f: impl FnOnce(Fields<'_>) -> T) -> T {
  let locator = record.locator();
  f(Fields::new(&record.fields, &locator))
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn transform_user(record: &SourceRecord) -> UserRow {
  with_fields(record, |f| UserRow {
    native_id:  record.native_id.clone(),
    email:      f
      .text(&["email", "emailAddress", "email_address"])
      .map(|e| normalize_email(&e))
      .filter(|e| !e.is_empty()),
    name:       f.text(&["name", "displayName", "display_name", "fullName"]),
    photo_url:  f.text(&["photoUrl", "photoURL", "photo_url", "photo", "avatar"]),
    role:       f.enumerated_present(&["role", "userRole"], &USER_ROLE),
    status:     f.enumerated_present(&["status", "state"], &USER_STATUS),
    created_at: f.timestamp(CREATED_AT),
    updated_at: f.timestamp(UPDATED_AT),
  })
}

// ─── Clients & engagements ───────────────────────────────────────────────────

pub fn transform_client(record: &SourceRecord) -> ClientRow {
  with_fields(record, |f| ClientRow {
    native_id:     record.native_id.clone(),
    name:          f.text(&["name", "clientName", "client_name"]),
    industry:      f.text(&["industry", "sector"]),
    contact_email: f
      .text(&["contactEmail", "contact_email", "email"])
      .map(|e| normalize_email(&e)),
    owner_id:      f.reference(&["ownerId", "owner_id", "owner", "createdBy"]),
    metadata:      f.structured(&["metadata", "meta", "details"]),
    created_at:    f.timestamp(CREATED_AT),
    updated_at:    f.timestamp(UPDATED_AT),
  })
}

pub fn transform_engagement(record: &SourceRecord) -> EngagementRow {
  with_fields(record, |f| EngagementRow {
    native_id:   record.native_id.clone(),
    client_id:   f.reference(&["clientId", "client_id", "client"]),
    name:        f.text(&["name", "title", "engagementName"]),
    stage:       f.enumerated(&["stage", "phase"], &ENGAGEMENT_STAGE),
    status:      f.enumerated(&["status"], &ENGAGEMENT_STATUS),
    year_end:    f.timestamp(&["yearEnd", "year_end", "periodEnd"]),
    partner_id:  f.reference(&["partnerId", "partner_id", "partner"]),
    manager_id:  f.reference(&["managerId", "manager_id", "manager"]),
    is_archived: f.flag(&["isArchived", "is_archived", "archived"], 0),
    settings:    f.structured(&["settings", "config"]),
    created_at:  f.timestamp(CREATED_AT),
    updated_at:  f.timestamp(UPDATED_AT),
  })
}

// ─── Requests for information ────────────────────────────────────────────────

pub fn transform_rfi(record: &SourceRecord) -> RfiRow {
  with_fields(record, |f| RfiRow {
    native_id:     record.native_id.clone(),
    engagement_id: f.reference(ENGAGEMENT_ID),
    title:         f.text(&["title", "name", "subject"]),
    description:   f.text(&["description", "body"]),
    status:        f.enumerated(&["status"], &RFI_STATUS),
    due_date:      f.timestamp(&["dueDate", "due_date", "deadline"]),
    assigned_to:   f.reference(&["assignedTo", "assigned_to", "assignee"]),
    created_by:    f.reference(&["createdBy", "created_by", "author"]),
    created_at:    f.timestamp(CREATED_AT),
    updated_at:    f.timestamp(UPDATED_AT),
    questions:     f
      .children(&["questions"])
      .into_iter()
      .enumerate()
      .map(|(i, q)| transform_rfi_question(q, i))
      .collect(),
  })
}

fn transform_rfi_question(f: Fields<'_>, index: usize) -> RfiQuestionRow {
  RfiQuestionRow {
    question:   f.text(&["question", "text", "body"]),
    position:   f.integer(&["order", "position", "index"]).unwrap_or(index as i64),
    created_at: f.timestamp(CREATED_AT),
    responses:  f
      .children(&["responses", "answers"])
      .into_iter()
      .map(|r| RfiResponseRow {
        body:         r.text(&["response", "text", "body", "answer"]),
        responder_id: r.reference(&["respondedBy", "responded_by", "userId", "author"]),
        attachments:  r.structured(&["attachments", "files"]),
        created_at:   r.timestamp(CREATED_AT),
      })
      .collect(),
  }
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

pub fn transform_review(record: &SourceRecord) -> ReviewRow {
  with_fields(record, |f| ReviewRow {
    native_id:     record.native_id.clone(),
    engagement_id: f.reference(ENGAGEMENT_ID),
    title:         f.text(&["title", "name", "documentName"]),
    status:        f.enumerated(&["status"], &REVIEW_STATUS),
    reviewer_id:   f.reference(&["reviewerId", "reviewer_id", "reviewer"]),
    document_ref:  f.text(&["documentRef", "document_ref", "documentUrl", "fileId"]),
    created_at:    f.timestamp(CREATED_AT),
    updated_at:    f.timestamp(UPDATED_AT),
    highlights:    f
      .children(&["highlights", "annotations"])
      .into_iter()
      .map(transform_highlight)
      .collect(),
  })
}

/// Coordinates may sit on the highlight itself or inside a `position` /
/// `rect` object.
fn transform_highlight(f: Fields<'_>) -> HighlightRow {
  let rect = f.object(&["position", "rect", "bounds"]).unwrap_or(f);
  HighlightRow {
    page:       f.integer(&["page", "pageNumber", "page_number"]),
    x:          rect.coordinate(&["x", "left"]),
    y:          rect.coordinate(&["y", "top"]),
    width:      rect.coordinate(&["width", "w"]),
    height:     rect.coordinate(&["height", "h"]),
    color:      f.text(&["color", "colour"]),
    comment:    f.text(&["comment", "note", "text"]),
    author_id:  f.reference(&["authorId", "author_id", "createdBy", "author"]),
    created_at: f.timestamp(CREATED_AT),
  }
}

// ─── Messages & collaborators ────────────────────────────────────────────────

pub fn transform_message(record: &SourceRecord) -> MessageRow {
  with_fields(record, |f| MessageRow {
    native_id:     record.native_id.clone(),
    engagement_id: f.reference(ENGAGEMENT_ID),
    sender_id:     f.reference(&["senderId", "sender_id", "from", "userId"]),
    body:          f.text(&["body", "text", "message", "content"]),
    attachments:   f.structured(&["attachments", "files"]),
    is_read:       f.flag(&["isRead", "is_read", "read"], 0),
    created_at:    f.timestamp(&["sentAt", "sent_at", "createdAt", "created_at"]),
  })
}

pub fn transform_collaborator(record: &SourceRecord) -> CollaboratorRow {
  with_fields(record, |f| CollaboratorRow {
    native_id:     record.native_id.clone(),
    engagement_id: f.reference(ENGAGEMENT_ID),
    user_id:       f.reference(&["userId", "user_id", "user"]),
    role:          f.enumerated(&["role", "access"], &COLLABORATOR_ROLE),
    created_at:    f.timestamp(&["addedAt", "added_at", "createdAt", "created_at"]),
  })
}

// ─── Checklists ──────────────────────────────────────────────────────────────

pub fn transform_checklist(record: &SourceRecord) -> ChecklistRow {
  with_fields(record, |f| ChecklistRow {
    native_id:     record.native_id.clone(),
    engagement_id: f.reference(ENGAGEMENT_ID),
    title:         f.text(&["title", "name"]),
    created_by:    f.reference(&["createdBy", "created_by", "owner"]),
    created_at:    f.timestamp(CREATED_AT),
    updated_at:    f.timestamp(UPDATED_AT),
    items:         f
      .children(&["items", "tasks"])
      .into_iter()
      .enumerate()
      .map(|(i, item)| ChecklistItemRow {
        label:    item.text(&["label", "text", "title", "name"]),
        is_done:  item.flag(&["done", "isDone", "is_done", "completed", "checked"], 0),
        done_by:  item.reference(&["doneBy", "done_by", "completedBy"]),
        done_at:  item.timestamp(&["doneAt", "done_at", "completedAt"]),
        position: item.integer(&["order", "position", "index"]).unwrap_or(i as i64),
      })
      .collect(),
  })
}

// ─── Files, activity, permissions ────────────────────────────────────────────

pub fn transform_file(record: &SourceRecord) -> FileRow {
  with_fields(record, |f| FileRow {
    native_id:     record.native_id.clone(),
    engagement_id: f.reference(ENGAGEMENT_ID),
    name:          f.text(&["name", "fileName", "file_name", "filename"]),
    storage_ref:   f.text(&["storagePath", "storage_path", "url", "downloadUrl", "path"]),
    mime_type:     f.text(&["mimeType", "mime_type", "contentType", "type"]),
    size_bytes:    f.integer(&["size", "sizeBytes", "size_bytes"]),
    uploaded_by:   f.reference(&["uploadedBy", "uploaded_by", "owner", "createdBy"]),
    created_at:    f.timestamp(&["uploadedAt", "uploaded_at", "createdAt", "created_at"]),
  })
}

pub fn transform_activity_log(record: &SourceRecord) -> ActivityLogRow {
  with_fields(record, |f| ActivityLogRow {
    native_id:     record.native_id.clone(),
    engagement_id: f.reference(ENGAGEMENT_ID),
    actor_id:      f.reference(&["userId", "user_id", "actorId", "actor"]),
    action:        f.text(&["action", "type", "event"]),
    details:       f.structured(&["details", "metadata", "payload"]),
    created_at:    f.timestamp(&["timestamp", "createdAt", "created_at"]),
  })
}

pub fn transform_permission(record: &SourceRecord) -> PermissionRow {
  with_fields(record, |f| PermissionRow {
    native_id:     record.native_id.clone(),
    user_id:       f.reference(&["userId", "user_id", "user"]),
    resource_type: f.enumerated(&["resourceType", "resource_type", "scope"], &PERMISSION_RESOURCE),
    resource_id:   f.reference(&["resourceId", "resource_id", "resource"]),
    role:          f.enumerated(&["role", "level", "access"], &PERMISSION_ROLE),
    created_at:    f.timestamp(CREATED_AT),
  })
}

#[cfg(test)]
mod tests {
  use ledgerlift_core::record::SourceSystem;
  use serde_json::{Value, json};

  use super::*;

  fn record(collection: &str, doc: Value) -> SourceRecord {
    SourceRecord::from_document(&SourceSystem::new("legacy-a"), collection, None, doc).unwrap()
  }

  #[test]
  fn user_email_is_normalised_and_missing_enums_stay_absent() {
    let row = transform_user(&record(
      "users",
      json!({ "id": "a1", "email": "  X@Y.com ", "name": "Foo", "photo": null }),
    ));
    assert_eq!(row.email.as_deref(), Some("x@y.com"));
    assert_eq!(row.name.as_deref(), Some("Foo"));
    assert_eq!(row.photo_url, None);
    assert_eq!(row.role, None);
  }

  #[test]
  fn unrecognised_user_role_stays_absent() {
    let row = transform_user(&record(
      "users",
      json!({ "id": "a1", "email": "x@y.com", "role": "nope", "status": "Inactive" }),
    ));
    assert_eq!(row.role, None);
    assert_eq!(row.status.as_deref(), Some("inactive"));
  }

  #[test]
  fn engagement_normalises_stage_and_flags() {
    let row = transform_engagement(&record(
      "engagements",
      json!({
        "id": "e1",
        "clientId": "c1",
        "name": "FY23 audit",
        "stage": "Field Work",
        "isArchived": "true",
        "settings": { "sampling": 25 },
        "createdAt": { "seconds": 1_690_000_000 }
      }),
    ));
    // "Field Work" canonicalises to "field_work", which is not allowed.
    assert_eq!(row.stage, "planning");
    assert_eq!(row.status, "active");
    assert_eq!(row.is_archived, 1);
    assert_eq!(row.client_id.as_deref(), Some("c1"));
    assert_eq!(row.settings.unwrap().as_str(), r#"{"sampling":25}"#);
    assert_eq!(row.created_at, Some(1_690_000_000));
  }

  #[test]
  fn rfi_nests_questions_and_responses_in_order() {
    let row = transform_rfi(&record(
      "rfis",
      json!({
        "id": "r1",
        "engagementId": "e1",
        "title": "Bank statements",
        "questions": [
          { "question": "Provide Q1", "responses": [{ "text": "attached", "respondedBy": "u1" }] },
          { "question": "Provide Q2", "order": 7 }
        ]
      }),
    ));
    assert_eq!(row.questions.len(), 2);
    assert_eq!(row.questions[0].position, 0);
    assert_eq!(row.questions[1].position, 7);
    assert_eq!(row.questions[0].responses[0].body.as_deref(), Some("attached"));
    assert_eq!(row.questions[0].responses[0].responder_id.as_deref(), Some("u1"));
  }

  #[test]
  fn highlight_coordinates_are_copied_exactly() {
    let row = transform_review(&record(
      "reviews",
      json!({
        "id": "rv1",
        "engagementId": "e1",
        "title": "Draft FS",
        "highlights": [
          { "page": 2, "x": 100, "y": 250, "width": 40, "height": 12 },
          { "position": { "x": 7, "y": 8, "width": 9, "height": 10 } }
        ]
      }),
    ));
    let h = &row.highlights[0];
    let exact = |c: &Option<crate::Coordinate>| c.as_ref().and_then(|c| c.as_exact_integer());
    assert_eq!(
      [exact(&h.x), exact(&h.y), exact(&h.width), exact(&h.height)],
      [Some(100), Some(250), Some(40), Some(12)]
    );
    assert_eq!(h.page, Some(2));
    assert_eq!(row.highlights[1].x.as_ref().unwrap().as_exact_integer(), Some(7));
  }

  #[test]
  fn checklist_items_default_positions_and_flags() {
    let row = transform_checklist(&record(
      "checklists",
      json!({
        "id": "k1",
        "engagementId": "e1",
        "title": "Close",
        "items": [{ "label": "Cash", "done": 1 }, { "label": "AR", "completed": "false" }]
      }),
    ));
    assert_eq!(row.items.len(), 2);
    assert_eq!((row.items[0].is_done, row.items[0].position), (1, 0));
    assert_eq!((row.items[1].is_done, row.items[1].position), (0, 1));
  }

  #[test]
  fn permission_defaults_resource_type() {
    let row = transform_permission(&record(
      "permissions",
      json!({ "id": "p1", "userId": "u1", "resourceId": "e1", "role": "WRITE" }),
    ));
    assert_eq!(row.resource_type, "engagement");
    assert_eq!(row.role, "write");
  }
}
