//! Folds loaded sources into the per-distribution map.

use std::collections::BTreeMap;

use crate::loader::LoadedSource;
use crate::model::DistributionEntry;
use crate::report::Reporter;

/// Accumulates advisories keyed by distribution name.
///
/// Merging is additive: a second source for the same distribution is
/// reported but its advisories are appended after the earlier ones. No
/// deduplication by advisory id happens here.
#[derive(Debug, Default)]
pub struct Merger {
    dists: BTreeMap<String, DistributionEntry>,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source: LoadedSource, reporter: &dyn Reporter) {
        if self.dists.contains_key(&source.distribution) {
            reporter.warn(&format!(
                "already have advisories for {}",
                source.distribution
            ));
        }
        self.dists
            .entry(source.distribution)
            .or_default()
            .advisories
            .extend(source.advisories);
    }

    pub fn len(&self) -> usize {
        self.dists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dists.is_empty()
    }

    pub fn into_dists(self) -> BTreeMap<String, DistributionEntry> {
        self.dists
    }
}

/// Merges sources in the order given.
pub fn merge_sources(
    sources: impl IntoIterator<Item = LoadedSource>,
    reporter: &dyn Reporter,
) -> BTreeMap<String, DistributionEntry> {
    let mut merger = Merger::new();
    for source in sources {
        merger.add(source, reporter);
    }
    merger.into_dists()
}
