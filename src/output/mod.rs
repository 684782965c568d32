mod json;
mod perl;

pub use json::render_json;
pub use perl::render_perl;

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{GenerateError, Result};
use crate::model::Database;
use crate::stamp::VersionStamp;

/// Serialization format of the database artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Perl module exposing `db()`
    Perl,
    /// JSON document
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "perl" | "pm" => Ok(OutputFormat::Perl),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'perl' or 'json'", s)),
        }
    }
}

/// Where the rendered artifact goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    File(PathBuf),
    Stdout,
    Discard,
}

pub fn render(
    database: &Database,
    stamp: &VersionStamp,
    format: OutputFormat,
    perl_package: &str,
) -> Result<String> {
    match format {
        OutputFormat::Perl => render_perl(database, stamp, perl_package),
        OutputFormat::Json => render_json(database, stamp),
    }
}

/// Writes `text` to `destination`. Files are replaced atomically.
pub fn write_output(text: &str, destination: &Destination) -> Result<()> {
    match destination {
        Destination::File(path) => write_file(path, text).map_err(|source| GenerateError::Output {
            path: path.clone(),
            source,
        }),
        Destination::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|source| GenerateError::Output {
                    path: PathBuf::from("-"),
                    source,
                })
        }
        Destination::Discard => Ok(()),
    }
}

fn write_file(path: &Path, text: &str) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut staging = NamedTempFile::new_in(parent)?;
    staging.write_all(text.as_bytes())?;
    staging.flush()?;
    staging.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("perl").unwrap(), OutputFormat::Perl);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("yaml").is_err());
    }

    #[test]
    fn test_write_file_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib").join("CPANSA").join("DB.pm");
        let destination = Destination::File(path.clone());

        write_output("first", &destination).unwrap();
        write_output("second", &destination).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let destination = Destination::File(blocker.join("DB.pm"));
        let result = write_output("text", &destination);
        assert!(matches!(result, Err(GenerateError::Output { .. })));
    }

    #[test]
    fn test_discard_writes_nothing() {
        write_output("ignored", &Destination::Discard).unwrap();
    }
}
