//! Core types and trait definitions for the ledgerlift migration engine.
//!
//! This crate is deliberately free of database dependencies. The transformer
//! library, the SQLite target store and the binary all build on it.

pub mod entity;
pub mod error;
pub mod reader;
pub mod record;
pub mod report;
pub mod user;

pub use error::{Error, Result};
