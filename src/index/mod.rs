//! Package index resolution.
//!
//! The package index (`02packages.details.txt.gz`) lists every indexed
//! module together with its current version and the archive that provides
//! it:
//!
//! ```text
//! File:         02packages.details.txt
//! Line-Count:   2
//!
//! Foo::Bar          1.23  A/AU/AUTHOR/Foo-Bar-1.23.tar.gz
//! Foo::Bar::Util   undef  A/AU/AUTHOR/Foo-Bar-1.23.tar.gz
//! ```
//!
//! Only modules whose owning distribution already has advisories end up in
//! the resulting [`ModuleIndex`].

mod distname;

pub use distname::DistInfo;

use async_trait::async_trait;
use flate2::read::MultiGzDecoder;
use futures::StreamExt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::model::ModuleIndex;
use crate::report::Reporter;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A package index ready to be read.
///
/// When the listing was downloaded, the staging file is owned here and
/// removed when the value is dropped, whatever happened while parsing.
pub struct StagedIndex {
    path: PathBuf,
    _staging: Option<NamedTempFile>,
}

impl StagedIndex {
    /// Uses a listing that already exists on disk.
    pub fn existing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _staging: None,
        }
    }

    /// Takes ownership of a staging file.
    pub fn staged(file: NamedTempFile) -> Self {
        Self {
            path: file.path().to_path_buf(),
            _staging: Some(file),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the listing, transparently decompressing gzip content.
    pub fn open(&self) -> io::Result<Box<dyn BufRead>> {
        let mut file = File::open(&self.path)?;
        let mut magic = [0u8; 2];
        let read = file.read(&mut magic)?;
        file.seek(SeekFrom::Start(0))?;

        if read == 2 && magic == GZIP_MAGIC {
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
        } else {
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

/// Where the package index comes from.
#[async_trait]
pub trait PackageIndexSource: Send + Sync {
    /// Human-readable location, used in diagnostics.
    fn location(&self) -> String;

    async fn fetch(&self) -> Result<StagedIndex>;
}

/// Downloads the listing over HTTP into a temporary file.
pub struct RemoteIndex {
    client: reqwest::Client,
    url: String,
}

impl RemoteIndex {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PackageIndexSource for RemoteIndex {
    fn location(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<StagedIndex> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;

        let mut staging = NamedTempFile::new()?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            staging.write_all(&chunk?)?;
        }
        staging.flush()?;

        Ok(StagedIndex::staged(staging))
    }
}

/// Reads a listing that is already on disk (gzip or plain text).
pub struct LocalIndex {
    path: PathBuf,
}

impl LocalIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PackageIndexSource for LocalIndex {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<StagedIndex> {
        if !self.path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("package index {} not found", self.path.display()),
            )
            .into());
        }
        Ok(StagedIndex::existing(&self.path))
    }
}

/// Builds the module index from a listing.
///
/// The header (everything up to and including the first blank line) is
/// skipped. Rows without a module or path, rows whose path yields no
/// distribution, and rows for distributions `is_known` rejects are
/// dropped silently. A module listed twice keeps its last row.
pub fn build_module_index<R, F>(reader: R, is_known: F) -> io::Result<ModuleIndex>
where
    R: BufRead,
    F: Fn(&str) -> bool,
{
    let mut index = ModuleIndex::new();
    let mut in_header = true;

    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        let line = line.trim_end_matches('\r');

        if in_header {
            if line.trim().is_empty() {
                in_header = false;
            }
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(module), _version, Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        let Some(info) = DistInfo::from_path(path) else {
            continue;
        };
        if !is_known(&info.dist) {
            continue;
        }

        index.insert(module.to_string(), info.dist);
    }

    Ok(index)
}

/// Fetches the listing from `source` and indexes the modules of known
/// distributions. Any staging file is released before this returns.
pub async fn resolve_module_index<F>(
    source: &dyn PackageIndexSource,
    is_known: F,
    reporter: &dyn Reporter,
) -> Result<ModuleIndex>
where
    F: Fn(&str) -> bool,
{
    reporter.info(&format!("Fetching package index from {}", source.location()));
    let staged = source.fetch().await?;
    reporter.debug(&format!("Reading package index at {}", staged.path().display()));

    let index = build_module_index(staged.open()?, is_known)?;
    reporter.info(&format!("Indexed {} modules", index.len()));
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Cursor;

    const LISTING: &str = "\
File:         02packages.details.txt
URL:          http://www.perl.com/CPAN/modules/02packages.details.txt
Line-Count:   6

Foo::Bar            1.23  A/AU/AUTHOR/Foo-Bar-1.23.tar.gz
Foo::Bar::Util     undef  A/AU/AUTHOR/Foo-Bar-1.23.tar.gz
Other::Thing        0.01  O/OT/OTHER/Other-Thing-0.01.tar.gz
Broken::Row
Single::File        0.02  S/SI/SINGLE/File.pm.gz
Baz                 2.00  B/BA/BAZ/Baz-2.00.tgz
";

    fn known(dist: &str) -> bool {
        matches!(dist, "Foo-Bar" | "Baz")
    }

    #[test]
    fn test_index_restricted_to_known_distributions() {
        let index = build_module_index(Cursor::new(LISTING), known).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index["Foo::Bar"], "Foo-Bar");
        assert_eq!(index["Foo::Bar::Util"], "Foo-Bar");
        assert_eq!(index["Baz"], "Baz");
        assert!(!index.contains_key("Other::Thing"));
        assert!(!index.contains_key("Broken::Row"));
        assert!(!index.contains_key("Single::File"));
    }

    #[test]
    fn test_header_lines_are_never_indexed() {
        let listing = "Foo::Bar 1.0 A/AU/AUTHOR/Foo-Bar-1.0.tar.gz\n\nBaz 1 B/BA/BAZ/Baz-1.tgz\n";
        let index = build_module_index(Cursor::new(listing), known).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.contains_key("Baz"));
    }

    #[test]
    fn test_listing_without_blank_line_is_all_header() {
        let listing = "Foo::Bar 1.0 A/AU/AUTHOR/Foo-Bar-1.0.tar.gz\n";
        let index = build_module_index(Cursor::new(listing), known).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_last_row_wins_for_repeated_module() {
        let listing = "\nFoo 1 A/AU/AUTHOR/Foo-Bar-1.tgz\nFoo 2 B/BA/BAZ/Baz-2.tgz\n";
        let index = build_module_index(Cursor::new(listing), known).unwrap();
        assert_eq!(index["Foo"], "Baz");
    }

    #[tokio::test]
    async fn test_local_gzip_listing() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(LISTING.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&compressed).unwrap();

        let reporter = MemoryReporter::new();
        let source = LocalIndex::new(file.path());
        let index = resolve_module_index(&source, known, &reporter).await.unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index["Baz"], "Baz");
    }

    #[tokio::test]
    async fn test_local_plain_listing() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LISTING.as_bytes()).unwrap();

        let reporter = MemoryReporter::new();
        let source = LocalIndex::new(file.path());
        let index = resolve_module_index(&source, known, &reporter).await.unwrap();

        assert_eq!(index["Foo::Bar"], "Foo-Bar");
    }

    #[tokio::test]
    async fn test_missing_local_listing_is_an_error() {
        let reporter = MemoryReporter::new();
        let source = LocalIndex::new("/nonexistent/02packages.details.txt.gz");
        assert!(resolve_module_index(&source, known, &reporter).await.is_err());
    }

    #[test]
    fn test_staged_file_is_removed_on_drop() {
        let file = NamedTempFile::new().unwrap();
        let staged = StagedIndex::staged(file);
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }
}
