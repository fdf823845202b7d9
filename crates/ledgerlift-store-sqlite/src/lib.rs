//! SQLite target store for ledgerlift.
//!
//! Owns everything that touches the target database: schema, the durable
//! identity and entity id maps, user deduplication, the per-entity migrators,
//! backups, the post-commit validator suite and the orchestrator that
//! sequences them inside one transaction.
//!
//! Wraps [`tokio_rusqlite`] so the whole transactional phase runs on the
//! store's dedicated thread without ever yielding to the async runtime.

mod backup;
mod encode;
mod identity;
mod schema;
mod store;

pub mod dedup;
pub mod error;
pub mod migrate;
pub mod orchestrator;
pub mod validate;

pub use error::{Error, Result};
pub use identity::EntityIdMap;
pub use migrate::{EntityMigrator, MigrationContext, MigratorRegistry, UnmappedRefPolicy};
pub use orchestrator::{MigrationOptions, Orchestrator};
pub use schema::TARGET_TABLES;
pub use store::TargetStore;
pub use validate::{ValidationConfig, ValidationSuite};

#[cfg(test)]
mod tests;
