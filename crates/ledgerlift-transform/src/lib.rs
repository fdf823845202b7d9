//! Transformer library for ledgerlift.
//!
//! Converts raw [`SourceRecord`](ledgerlift_core::record::SourceRecord)
//! shapes into typed target rows. Pure and synchronous; no database
//! dependencies. Nothing here ever fails: unparseable values become absent
//! or fall back to a documented default, and [`validate_transformed_data`]
//! reports what is missing so callers can decide between skip and abort.
//!
//! # Quick start
//!
//! ```no_run
//! use ledgerlift_core::record::{SourceRecord, SourceSystem};
//! use ledgerlift_transform::{transform_client, validate_transformed_data, AsTargetRow};
//!
//! let doc = serde_json::json!({ "id": "c1", "name": "Acme", "createdAt": 1700000000000i64 });
//! let record = SourceRecord::from_document(&SourceSystem::new("a"), "clients", None, doc).unwrap();
//! let row = transform_client(&record);
//! assert!(validate_transformed_data(row.as_target_row()).is_empty());
//! assert_eq!(row.created_at, Some(1_700_000_000));
//! ```

mod entities;
mod fields;
mod rows;
mod timestamp;
mod validate;
mod value;

pub use entities::{
  COLLABORATOR_ROLE, ENGAGEMENT_STAGE, ENGAGEMENT_STATUS, PERMISSION_RESOURCE,
  PERMISSION_ROLE, REVIEW_STATUS, RFI_STATUS, USER_ROLE, USER_STATUS,
  transform_activity_log, transform_checklist, transform_client,
  transform_collaborator, transform_engagement, transform_file, transform_message,
  transform_permission, transform_review, transform_rfi, transform_user,
};
pub use fields::Fields;
pub use rows::*;
pub use timestamp::{MILLIS_THRESHOLD, normalize_timestamp};
pub use validate::validate_transformed_data;
pub use value::{Coordinate, EnumField, StructuredText, normalize_bool};
