//! Database assembly.
//!
//! A run loads and merges every advisory source first. Only then is the
//! set of distributions known, and both the package index and the release
//! histories are resolved against that set.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::cache::Cache;
use crate::config::Config;
use crate::error::{GenerateError, Result};
use crate::index::{resolve_module_index, PackageIndexSource};
use crate::loader::load_source;
use crate::merger::Merger;
use crate::model::{Database, DistributionEntry};
use crate::releases::{ReleaseHistoryResolver, ReleaseSource};
use crate::report::Reporter;
use crate::stamp::{allocate, StampSource, VersionStamp};

/// Output of one run: the database and its version stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub database: Database,
    pub stamp: VersionStamp,
}

pub struct Generator<'a> {
    config: &'a Config,
    reporter: &'a dyn Reporter,
    releases: &'a dyn ReleaseSource,
    index: &'a dyn PackageIndexSource,
    cache: Option<&'a Cache>,
}

impl<'a> Generator<'a> {
    pub fn new(
        config: &'a Config,
        reporter: &'a dyn Reporter,
        releases: &'a dyn ReleaseSource,
        index: &'a dyn PackageIndexSource,
    ) -> Self {
        Self {
            config,
            reporter,
            releases,
            index,
            cache: None,
        }
    }

    /// Caches release histories between runs.
    pub fn with_cache(mut self, cache: &'a Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Loads and merges the advisory sources, in the order given.
    pub fn load(&self, sources: &[PathBuf]) -> Result<BTreeMap<String, DistributionEntry>> {
        if sources.is_empty() {
            return Err(GenerateError::NoSources);
        }

        let mut merger = Merger::new();
        for path in sources {
            let loaded = load_source(path, self.reporter)?;
            merger.add(loaded, self.reporter);
        }

        self.reporter.info(&format!(
            "Merged advisories for {} distributions",
            merger.len()
        ));
        Ok(merger.into_dists())
    }

    /// Resolves module ownership and release histories for merged
    /// distributions.
    pub async fn assemble(&self, mut dists: BTreeMap<String, DistributionEntry>) -> Result<Database> {
        let module2dist =
            resolve_module_index(self.index, |dist| dists.contains_key(dist), self.reporter)
                .await?;

        let mut resolver = ReleaseHistoryResolver::new(self.releases, self.reporter)
            .with_retry(self.config.max_attempts, self.config.retry_unit());
        if let Some(cache) = self.cache {
            resolver = resolver.with_cache(cache);
        }

        let total = dists.len();
        for (done, (name, entry)) in dists.iter_mut().enumerate() {
            if let Some(history) = resolver.resolve(name).await {
                entry.versions = Some(history.versions);
                entry.main_module = history.main_module;
            }
            self.reporter.progress(done + 1, total);
        }

        // the metadata service reports a misleading main module for the core
        if let Some(core) = dists.get_mut(&self.config.core_distribution) {
            core.main_module = Some(self.config.core_main_module.clone());
        }

        Ok(Database { dists, module2dist })
    }

    /// Builds the database from the given sources.
    pub async fn build(&self, sources: &[PathBuf]) -> Result<Database> {
        let dists = self.load(sources)?;
        self.assemble(dists).await
    }

    /// Builds the database and allocates its version stamp for `today`.
    pub async fn run(
        &self,
        sources: &[PathBuf],
        stamps: &dyn StampSource,
        today: NaiveDate,
    ) -> Result<Generation> {
        let database = self.build(sources).await?;
        let stamp = allocate(stamps, today);
        self.reporter.info(&format!(
            "Built database {} with {} advisories across {} distributions",
            stamp,
            database.advisory_count(),
            database.dists.len()
        ));
        Ok(Generation { database, stamp })
    }
}
