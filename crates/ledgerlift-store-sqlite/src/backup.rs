//! Point-in-time backups of the target store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

/// `<dir>/<stem>-<UTC timestamp>.sqlite`. A numeric suffix is added if that
/// file already exists.
pub fn backup_path(dir: &Path, stem: &str, at: DateTime<Utc>) -> PathBuf {
  let stamp = at.format("%Y%m%dT%H%M%S%.3fZ");
  let mut path = dir.join(format!("{stem}-{stamp}.sqlite"));
  let mut n = 1;
  while path.exists() {
    path = dir.join(format!("{stem}-{stamp}-{n}.sqlite"));
    n += 1;
  }
  path
}

/// Write a consistent copy of the whole database to `path`, which must not
/// exist yet.
pub fn vacuum_into(conn: &Connection, path: &Path) -> rusqlite::Result<()> {
  let target = path.to_string_lossy();
  conn.execute("VACUUM INTO ?1", [&*target])?;
  Ok(())
}
