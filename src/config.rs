//! Configuration file handling.
//!
//! This module provides loading and saving of cpansa-db configuration
//! from a TOML file. A [`Config`] is built once per run and passed by
//! reference to every component that needs it.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/cpansa-db/config.toml`
//! - macOS: `~/Library/Application Support/cpansa-db/config.toml`
//! - Windows: `%APPDATA%\cpansa-db\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! advisory_dir = "cpansa"
//! output = "lib/CPANSA/DB.pm"
//! format = "perl"
//! max_attempts = 4
//! retry_delay_secs = 10
//! cache_ttl_hours = 12
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use cpansa_db::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Advisories from: {}", config.advisory_dir.display());
/// println!("Retries: {}", config.max_attempts);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory searched for advisory sources when none are given.
    ///
    /// Default: `cpansa`
    pub advisory_dir: PathBuf,

    /// File name prefix of discoverable advisory sources.
    ///
    /// Default: `CPANSA-`
    pub advisory_prefix: String,

    /// Location of the gzip-compressed package index.
    pub index_url: String,

    /// Local package index (gzip or plain text). Skips the download when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,

    /// Release search endpoint of the metadata service.
    pub release_search_url: String,

    /// Maximum releases requested per distribution.
    ///
    /// Default: 5000
    pub release_page_size: usize,

    /// Total attempts for one release-history query.
    ///
    /// Default: 4
    pub max_attempts: u32,

    /// Backoff unit; attempt N waits `(N - 1) * retry_delay_secs`.
    ///
    /// Default: 10
    pub retry_delay_secs: u64,

    /// Timeout applied to every HTTP request, in seconds.
    pub http_timeout_secs: u64,

    /// Pseudo-distribution for the language runtime itself.
    pub core_distribution: String,

    /// Main module forced onto [`core_distribution`](Self::core_distribution).
    pub core_main_module: String,

    /// Output artifact. Also read back to recover the previous version stamp.
    pub output: PathBuf,

    /// Output format: "perl" or "json".
    pub format: String,

    /// Package name used by the Perl output format.
    pub perl_package: String,

    /// How long to cache release histories, in hours. 0 disables the cache.
    pub cache_ttl_hours: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            advisory_dir: PathBuf::from("cpansa"),
            advisory_prefix: "CPANSA-".to_string(),
            index_url: "https://www.cpan.org/modules/02packages.details.txt.gz".to_string(),
            index_path: None,
            release_search_url: "https://fastapi.metacpan.org/v1/release/_search".to_string(),
            release_page_size: 5000,
            max_attempts: 4,
            retry_delay_secs: 10,
            http_timeout_secs: 120,
            core_distribution: "perl".to_string(),
            core_main_module: "perl".to_string(),
            output: PathBuf::from("lib/CPANSA/DB.pm"),
            format: "perl".to_string(),
            perl_package: "CPANSA::DB".to_string(),
            cache_ttl_hours: 0,
        }
    }
}

impl Config {
    /// Loads configuration from the default config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path, falling back to defaults
    /// when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cpansa-db")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    pub fn retry_unit(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
