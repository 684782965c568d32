//! Release history resolution.
//!
//! For every distribution with advisories we ask the release metadata
//! service for all known releases, oldest first. The answer gives the
//! distribution's version history and its main module.

mod metacpan;

pub use metacpan::MetaCpanClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::cache::Cache;
use crate::model::ReleaseVersion;
use crate::report::Reporter;
use crate::retry::{attempt, linear_backoff};

/// One release as reported by the metadata service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub main_module: Option<String>,
}

/// Some old releases carry numeric versions.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Source of release metadata for a distribution.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// All releases of `distribution`, sorted by date ascending.
    async fn releases(&self, distribution: &str) -> Result<Vec<Release>>;
}

/// A distribution's resolved history.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseHistory {
    pub versions: Vec<ReleaseVersion>,
    pub main_module: Option<String>,
}

impl ReleaseHistory {
    /// Builds the history from date-ascending releases. `None` when empty.
    pub fn from_releases(releases: &[Release]) -> Option<Self> {
        if releases.is_empty() {
            return None;
        }

        let versions = releases
            .iter()
            .map(|r| {
                ReleaseVersion::new(
                    r.date.clone().unwrap_or_default(),
                    r.version.clone().unwrap_or_default(),
                )
            })
            .collect();

        Some(Self {
            versions,
            main_module: select_main_module(releases),
        })
    }
}

/// The main module of the release marked `latest`, or of the last release
/// when none is.
pub fn select_main_module(releases: &[Release]) -> Option<String> {
    releases
        .iter()
        .find(|r| r.status.as_deref() == Some("latest"))
        .and_then(|r| r.main_module.clone())
        .or_else(|| releases.last().and_then(|r| r.main_module.clone()))
}

/// Resolves release histories with bounded retries and optional caching.
pub struct ReleaseHistoryResolver<'a> {
    source: &'a dyn ReleaseSource,
    reporter: &'a dyn Reporter,
    max_attempts: u32,
    backoff_unit: Duration,
    cache: Option<&'a Cache>,
}

impl<'a> ReleaseHistoryResolver<'a> {
    pub fn new(source: &'a dyn ReleaseSource, reporter: &'a dyn Reporter) -> Self {
        Self {
            source,
            reporter,
            max_attempts: 4,
            backoff_unit: Duration::from_secs(10),
            cache: None,
        }
    }

    pub fn with_retry(mut self, max_attempts: u32, backoff_unit: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.backoff_unit = backoff_unit;
        self
    }

    pub fn with_cache(mut self, cache: &'a Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Fetches the releases of `distribution`. Query failures are retried;
    /// when every attempt fails the result is an empty list.
    pub async fn fetch(&self, distribution: &str) -> Vec<Release> {
        let cache_key = format!("releases_{}", distribution);
        if let Some(cached) = self
            .cache
            .as_ref()
            .and_then(|c| c.get::<Vec<Release>>(&cache_key))
        {
            self.reporter
                .debug(&format!("Using cached releases for {}", distribution));
            return cached;
        }

        let result = attempt(
            |n| {
                self.reporter.debug(&format!(
                    "Querying {} for {} (attempt {}/{})",
                    self.source.name(),
                    distribution,
                    n,
                    self.max_attempts
                ));
                self.source.releases(distribution)
            },
            self.max_attempts,
            linear_backoff(self.backoff_unit),
        )
        .await;

        match result {
            Ok(releases) => {
                if !releases.is_empty() {
                    if let Some(cache) = self.cache {
                        let _ = cache.set(&cache_key, &releases);
                    }
                }
                releases
            }
            Err(exhausted) => {
                self.reporter.debug(&format!(
                    "Release query for {} failed: {:#}",
                    distribution, exhausted.last_error
                ));
                Vec::new()
            }
        }
    }

    /// Resolves the history of `distribution`, warning when nothing is found.
    pub async fn resolve(&self, distribution: &str) -> Option<ReleaseHistory> {
        let releases = self.fetch(distribution).await;
        let history = ReleaseHistory::from_releases(&releases);
        if history.is_none() {
            self.reporter.warn(&format!(
                "no releases found on CPAN for '{}'",
                distribution
            ));
        }
        history
    }
}
