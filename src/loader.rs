//! Advisory source loading.
//!
//! Each source is one YAML document per distribution:
//!
//! ```yaml
//! ---
//! distribution: Foo-Bar
//! url: https://example.com/advisories
//! darkpan: true
//! advisories:
//!   - id: CPANSA-Foo-Bar-2020-01
//!     affected_versions: "<1.23"
//!     description: ...
//! ```
//!
//! The loader stamps every advisory with its distribution (and the
//! dark-pan flag and source url when present) and strips the third-party
//! cross reference before the record is handed to the merger.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{GenerateError, Result};
use crate::model::{Advisory, CROSS_REFERENCE_FIELD};
use crate::report::Reporter;

/// The advisories contributed by one source document.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSource {
    pub distribution: String,
    pub advisories: Vec<Advisory>,
}

#[derive(Deserialize, Default)]
struct SourceDocument {
    #[serde(default)]
    distribution: Option<String>,
    #[serde(default)]
    advisories: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    darkpan: Option<Value>,
    #[serde(default)]
    url: Option<String>,
}

/// Reads and parses one advisory source file.
pub fn load_source(path: &Path, reporter: &dyn Reporter) -> Result<LoadedSource> {
    let text = fs::read_to_string(path).map_err(|source| GenerateError::ReadSource {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&text, path, reporter)
}

/// Parses the text of one advisory source. `origin` only labels diagnostics.
pub fn parse_source(text: &str, origin: &Path, reporter: &dyn Reporter) -> Result<LoadedSource> {
    let document: SourceDocument =
        serde_yaml::from_str::<Option<SourceDocument>>(text)
            .map_err(|source| GenerateError::ParseSource {
                path: origin.to_path_buf(),
                source,
            })?
            .unwrap_or_default();

    let distribution = match document.distribution {
        Some(name) if !name.is_empty() => name,
        Some(_) => {
            reporter.warn(&format!("empty distribution in {}", origin.display()));
            String::new()
        }
        None => {
            reporter.warn(&format!("no distribution in {}", origin.display()));
            String::new()
        }
    };

    let darkpan = document.darkpan.as_ref().is_some_and(is_truthy);

    let raw = match document.advisories {
        Some(raw) => raw,
        None => {
            reporter.warn(&format!("no advisories list in {}", origin.display()));
            Vec::new()
        }
    };

    let advisories: Vec<Advisory> = raw
        .into_iter()
        .map(|fields| {
            let mut advisory = Advisory::from_fields(fields);
            advisory.set("distribution", distribution.clone());
            if darkpan {
                advisory.set("darkpan", true);
            }
            if let Some(url) = &document.url {
                advisory.set("url", url.clone());
            }
            advisory.remove(CROSS_REFERENCE_FIELD);
            advisory
        })
        .collect();

    reporter.info(&format!(
        "Found {} advisories for {} in {}",
        advisories.len(),
        distribution,
        origin.display()
    ));

    Ok(LoadedSource {
        distribution,
        advisories,
    })
}

/// Values a source may use to declare itself dark-pan.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Finds the default advisory sources: `<prefix>*.yml` / `<prefix>*.yaml`
/// directly under `dir`, sorted by path.
pub fn discover_sources(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.starts_with(prefix) && (name.ends_with(".yml") || name.ends_with(".yaml"))
        })
        .map(|entry| entry.into_path())
        .collect();

    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;

    const SOURCE: &str = r#"
---
distribution: Foo-Bar
url: https://example.com/foo-bar
advisories:
  - id: CPANSA-Foo-Bar-2020-01
    affected_versions: "<1.5"
    github_security_advisory: GHSA-xxxx-yyyy-zzzz
  - id: CPANSA-Foo-Bar-2021-01
    affected_versions: "<2.0"
"#;

    #[test]
    fn test_parse_stamps_fields() {
        let reporter = MemoryReporter::new();
        let loaded = parse_source(SOURCE, Path::new("CPANSA-Foo-Bar.yml"), &reporter).unwrap();

        assert_eq!(loaded.distribution, "Foo-Bar");
        assert_eq!(loaded.advisories.len(), 2);
        for advisory in &loaded.advisories {
            assert_eq!(advisory.distribution(), Some("Foo-Bar"));
            assert_eq!(
                advisory.get("url").and_then(Value::as_str),
                Some("https://example.com/foo-bar")
            );
            assert!(!advisory.contains("darkpan"));
            assert!(!advisory.contains(CROSS_REFERENCE_FIELD));
        }
        assert_eq!(loaded.advisories[0].id(), Some("CPANSA-Foo-Bar-2020-01"));
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_parse_darkpan_source() {
        let reporter = MemoryReporter::new();
        let text = "distribution: Internal\ndarkpan: 'true'\nadvisories:\n  - id: X-1\n";
        let loaded = parse_source(text, Path::new("x.yml"), &reporter).unwrap();

        assert!(loaded.advisories[0].is_darkpan());
        assert!(!loaded.advisories[0].contains("url"));
    }

    #[test]
    fn test_parse_darkpan_false_is_not_stamped() {
        let reporter = MemoryReporter::new();
        let text = "distribution: Public\ndarkpan: false\nadvisories:\n  - id: X-1\n";
        let loaded = parse_source(text, Path::new("x.yml"), &reporter).unwrap();

        assert!(!loaded.advisories[0].contains("darkpan"));
    }

    #[test]
    fn test_missing_distribution_warns_and_continues() {
        let reporter = MemoryReporter::new();
        let text = "advisories:\n  - id: X-1\n";
        let loaded = parse_source(text, Path::new("broken.yml"), &reporter).unwrap();

        assert_eq!(loaded.distribution, "");
        assert_eq!(loaded.advisories[0].distribution(), Some(""));
        assert_eq!(reporter.warnings().len(), 1);
        assert!(reporter.warnings()[0].contains("broken.yml"));
    }

    #[test]
    fn test_empty_distribution_warns() {
        let reporter = MemoryReporter::new();
        let text = "distribution: ''\nadvisories: []\n";
        let loaded = parse_source(text, Path::new("empty.yml"), &reporter).unwrap();

        assert_eq!(loaded.distribution, "");
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let reporter = MemoryReporter::new();
        let result = parse_source("distribution: [unclosed", Path::new("bad.yml"), &reporter);
        assert!(matches!(result, Err(GenerateError::ParseSource { .. })));
    }

    #[test]
    fn test_progress_message_reports_count() {
        let reporter = MemoryReporter::new();
        parse_source(SOURCE, Path::new("CPANSA-Foo-Bar.yml"), &reporter).unwrap();

        let infos: Vec<String> = reporter
            .entries()
            .into_iter()
            .filter(|(level, _)| *level == crate::report::Level::Info)
            .map(|(_, m)| m)
            .collect();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].contains("Found 2 advisories for Foo-Bar"));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let reporter = MemoryReporter::new();
        let result = load_source(Path::new("/nonexistent/CPANSA-x.yml"), &reporter);
        assert!(matches!(result, Err(GenerateError::ReadSource { .. })));
    }

    #[test]
    fn test_discover_sources_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["CPANSA-b.yml", "CPANSA-a.yaml", "README.md", "other.yml"] {
            fs::write(dir.path().join(name), "advisories: []\n").unwrap();
        }

        let found = discover_sources(dir.path(), "CPANSA-");
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["CPANSA-a.yaml", "CPANSA-b.yml"]);
    }
}
