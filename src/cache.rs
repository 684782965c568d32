//! File-based caching for release histories.
//!
//! Resolving release histories takes one metadata query per distribution.
//! Repeated runs on the same day can reuse earlier answers from this cache
//! instead. Values are stored as JSON files; each entry expires after the
//! configured TTL.
//!
//! # Cache Location
//!
//! - Linux: `~/.cache/cpansa-db/`
//! - macOS: `~/Library/Caches/cpansa-db/`
//! - Windows: `%LOCALAPPDATA%\cpansa-db\`
//!
//! # Example
//!
//! ```no_run
//! use cpansa_db::Cache;
//!
//! let cache = Cache::with_ttl_hours(12);
//! cache.set("releases_Foo-Bar", &vec!["1.0".to_string()]).unwrap();
//!
//! let value: Option<Vec<String>> = cache.get("releases_Foo-Bar");
//! assert_eq!(value, Some(vec!["1.0".to_string()]));
//! ```

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

const CACHE_TTL_HOURS: u64 = 24;
const ENTRY_EXTENSION: &str = "json";

/// Returns the platform cache directory for cpansa-db.
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("cpansa-db")
}

/// Release histories keyed by distribution, one JSON file per key.
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
}

impl Cache {
    pub fn new() -> Self {
        Self::with_ttl_hours(CACHE_TTL_HOURS)
    }

    pub fn with_ttl_hours(hours: u64) -> Self {
        Self::in_dir(cache_dir(), Duration::from_secs(hours * 3600))
    }

    pub fn in_dir(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `releases_Foo::Bar` is stored as `releases_Foo__Bar.json`.
    fn entry_path(&self, key: &str) -> PathBuf {
        let file_stem = key.replace(
            |c: char| !(c.is_alphanumeric() || c == '-' || c == '_'),
            "_",
        );
        self.dir.join(file_stem).with_extension(ENTRY_EXTENSION)
    }

    fn is_stale(&self, path: &Path) -> bool {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|written| written.elapsed().ok())
            .is_some_and(|age| age > self.ttl)
    }

    /// Looks up `key`. Missing, stale and undecodable entries all read as
    /// a miss; stale ones are deleted on the way.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.entry_path(key);
        if self.is_stale(&path) {
            fs::remove_file(&path).ok();
            return None;
        }
        let bytes = fs::read(&path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Stores `value` under `key`. The entry is staged next to its final
    /// name so a concurrent reader never sees a half-written file.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut staged, value)?;
        staged.flush()?;
        staged.persist(self.entry_path(key))?;
        Ok(())
    }

    /// Drops every entry. Files that are not cache entries are left alone.
    pub fn clear(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION))
            .for_each(|path| {
                fs::remove_file(path).ok();
            });
        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}
