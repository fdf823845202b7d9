//! [`RunConfig`], deserialised from `ledgerlift.toml` and `LEDGERLIFT_*`
//! environment variables.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use ledgerlift_core::reader::SourceReader;
use ledgerlift_store_sqlite::{MigrationOptions, UnmappedRefPolicy, ValidationConfig};
use serde::Deserialize;

use crate::reader::JsonExportReader;

// ─── Configuration ───────────────────────────────────────────────────────────

/// One legacy system and the directory its export lives in.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
  pub name:       String,
  pub export_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
  pub target_path:        PathBuf,
  pub backup_dir:         PathBuf,
  /// Earlier sources win on conflicting user fields.
  #[serde(default)]
  pub sources:            Vec<SourceConfig>,
  #[serde(default = "default_fetch_timeout")]
  pub fetch_timeout_secs: u64,
  #[serde(default)]
  pub fetch_limit:        Option<usize>,
  #[serde(default)]
  pub unmapped_refs:      UnmappedRefPolicy,
  #[serde(default)]
  pub expected_counts:    BTreeMap<String, i64>,
  #[serde(default)]
  pub structured_columns: Vec<String>,
  #[serde(default)]
  pub dry_run:            bool,
}

fn default_fetch_timeout() -> u64 { 30 }

impl RunConfig {
  /// Layer `path` (optional) under `LEDGERLIFT_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LEDGERLIFT"))
      .build()?
      .try_deserialize()
  }

  pub fn options(&self) -> MigrationOptions {
    MigrationOptions {
      backup_dir:    expand_tilde(&self.backup_dir),
      fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
      fetch_limit:   self.fetch_limit,
      unmapped_refs: self.unmapped_refs,
      validation:    ValidationConfig {
        expected_counts:    self.expected_counts.clone(),
        structured_columns: self.structured_columns.clone(),
      },
      dry_run:       self.dry_run,
    }
  }

  /// One reader per configured source, in configuration order.
  pub fn readers(&self) -> Vec<Arc<dyn SourceReader>> {
    self
      .sources
      .iter()
      .map(|source| {
        Arc::new(JsonExportReader::new(&source.name, expand_tilde(&source.export_dir)))
          as Arc<dyn SourceReader>
      })
      .collect()
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
