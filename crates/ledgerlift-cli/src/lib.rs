//! Runtime pieces of the `ledgerlift` binary: the run configuration and the
//! reader for on-disk JSON exports of the legacy systems.

pub mod config;
pub mod reader;

pub use config::{RunConfig, SourceConfig, expand_tilde};
pub use reader::JsonExportReader;
