use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Advisory;

/// Module name to owning distribution name.
pub type ModuleIndex = BTreeMap<String, String>;

/// One release from a distribution's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseVersion {
    pub date: String,
    pub version: String,
}

impl ReleaseVersion {
    pub fn new(date: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            version: version.into(),
        }
    }
}

/// Everything the database knows about one distribution.
///
/// `versions` and `main_module` stay `None` when the release history could
/// not be resolved; they are omitted from serialized output in that case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub advisories: Vec<Advisory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<ReleaseVersion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_module: Option<String>,
}

/// The assembled advisory database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub dists: BTreeMap<String, DistributionEntry>,
    pub module2dist: ModuleIndex,
}

impl Database {
    pub fn advisory_count(&self) -> usize {
        self.dists.values().map(|d| d.advisories.len()).sum()
    }

    /// Number of distributions that ended up with a release history.
    pub fn resolved_count(&self) -> usize {
        self.dists.values().filter(|d| d.versions.is_some()).count()
    }

    /// Finds the entry for a distribution, or for the distribution owning a module.
    pub fn lookup(&self, name: &str) -> Option<&DistributionEntry> {
        self.dists.get(name).or_else(|| {
            self.module2dist
                .get(name)
                .and_then(|dist| self.dists.get(dist))
        })
    }
}
