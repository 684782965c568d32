//! Database version stamps.
//!
//! Every generated database carries a `YYYYMMDD.NNN` version. The serial
//! counts runs within one day: it continues from the previous artifact's
//! stamp when the date is unchanged and restarts at 1 otherwise.

use chrono::{Local, NaiveDate};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

static STAMP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{8})\.(\d{3,})").expect("stamp pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStamp {
    /// Calendar date as `YYYYMMDD`.
    pub date: String,
    pub serial: u32,
}

impl VersionStamp {
    pub fn new(date: impl Into<String>, serial: u32) -> Self {
        Self {
            date: date.into(),
            serial,
        }
    }

    /// The stamp that follows `previous` on `today`.
    pub fn next(today: NaiveDate, previous: Option<&VersionStamp>) -> Self {
        let date = today.format("%Y%m%d").to_string();
        let serial = match previous {
            Some(prev) if prev.date == date => prev.serial + 1,
            _ => 1,
        };
        Self { date, serial }
    }

    /// Finds the first `YYYYMMDD.NNN` in `text`.
    pub fn scan(text: &str) -> Option<Self> {
        let captures = STAMP_PATTERN.captures(text)?;
        let serial = captures[2].parse().ok()?;
        Some(Self::new(&captures[1], serial))
    }
}

impl fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.date, self.serial)
    }
}

/// Recovers the stamp of the previous run.
pub trait StampSource {
    fn previous_stamp(&self) -> Option<VersionStamp>;
}

/// Reads the stamp back out of a previously written output artifact.
///
/// Only the stamp pattern is looked at; the rest of the artifact is ignored.
pub struct ArtifactStamp {
    path: PathBuf,
}

impl ArtifactStamp {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StampSource for ArtifactStamp {
    fn previous_stamp(&self) -> Option<VersionStamp> {
        let bytes = fs::read(&self.path).ok()?;
        VersionStamp::scan(&String::from_utf8_lossy(&bytes))
    }
}

/// Allocates the stamp for a run happening on `today`.
pub fn allocate(source: &dyn StampSource, today: NaiveDate) -> VersionStamp {
    VersionStamp::next(today, source.previous_stamp().as_ref())
}

/// Allocates the stamp for a run happening now, by the local calendar.
pub fn allocate_today(source: &dyn StampSource) -> VersionStamp {
    allocate(source, Local::now().date_naive())
}
