//! CPAN archive path parsing.
//!
//! Package index rows point at archives such as
//! `A/AU/AUTHOR/Foo-Bar-1.23.tar.gz`. From that path we recover the
//! uploading author, the distribution name (`Foo-Bar`), its version
//! (`1.23`) and the release name (`Foo-Bar-1.23`).

/// Archive suffixes recognised as distribution uploads, longest first.
const ARCHIVE_SUFFIXES: &[&str] = &[
    ".tar.bz2", ".tar.gz", ".tar.xz", ".tar.Z", ".tar", ".tbz", ".tgz", ".txz", ".zip",
];

/// The pieces of a parsed archive path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistInfo {
    pub author: Option<String>,
    pub dist: String,
    pub version: Option<String>,
    /// Distribution name and version together, e.g. `Foo-Bar-1.23`.
    pub distvname: String,
}

impl DistInfo {
    /// Parses an archive path. Returns `None` when no distribution can be
    /// derived from it.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim().trim_start_matches('/');
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let file = *parts.last()?;

        let author = match parts.as_slice() {
            [first, second, author, _, ..]
                if first.len() == 1 && second.len() == 2 && second.starts_with(first) =>
            {
                Some(author.to_string())
            }
            [author, _, ..] => Some(author.to_string()),
            _ => None,
        };

        let distvname = strip_archive_suffix(file)?;
        let (dist, version) = split_version(distvname);
        if dist.is_empty() {
            return None;
        }

        Some(Self {
            author,
            dist: dist.to_string(),
            version: version.map(str::to_string),
            distvname: distvname.to_string(),
        })
    }
}

fn strip_archive_suffix(file: &str) -> Option<&str> {
    ARCHIVE_SUFFIXES
        .iter()
        .find_map(|suffix| file.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
}

/// Splits `Foo-Bar-1.23` into name and version.
///
/// The version starts at the first dash followed by a dotted, underscored
/// or `v`-prefixed version, so `Foo-1.0-1` keeps `Foo` and `Acme-6502-1.0`
/// keeps `Acme-6502`. Without one, the last dash followed by a digit wins.
fn split_version(distvname: &str) -> (&str, Option<&str>) {
    let dashes: Vec<usize> = distvname
        .char_indices()
        .filter(|(_, c)| *c == '-')
        .map(|(i, _)| i)
        .filter(|&i| looks_like_version(&distvname[i + 1..]))
        .collect();

    let split = dashes
        .iter()
        .copied()
        .find(|&i| is_release_version(&distvname[i + 1..]))
        .or_else(|| dashes.last().copied());

    match split {
        Some(i) => (&distvname[..i], Some(&distvname[i + 1..])),
        None => (distvname, None),
    }
}

/// A version segment that cannot be part of a name, e.g. `1.0` or `v2`.
fn is_release_version(rest: &str) -> bool {
    let segment = rest.split('-').next().unwrap_or_default();
    segment.starts_with(['v', 'V']) || segment.contains(['.', '_'])
}

fn looks_like_version(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('v') | Some('V') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_author_path() {
        let info = DistInfo::from_path("A/AU/AUTHOR/Foo-Bar-1.23.tar.gz").unwrap();
        assert_eq!(info.author.as_deref(), Some("AUTHOR"));
        assert_eq!(info.dist, "Foo-Bar");
        assert_eq!(info.version.as_deref(), Some("1.23"));
        assert_eq!(info.distvname, "Foo-Bar-1.23");
    }

    #[test]
    fn test_dist_with_digits_in_name() {
        let info = DistInfo::from_path("R/RK/RKITOVER/Net-SSH2-0.72.tar.gz").unwrap();
        assert_eq!(info.dist, "Net-SSH2");
        assert_eq!(info.version.as_deref(), Some("0.72"));
    }

    #[test]
    fn test_vstring_and_trial_versions() {
        let info = DistInfo::from_path("X/XY/XYZ/Foo-v1.2.3.tgz").unwrap();
        assert_eq!(info.dist, "Foo");
        assert_eq!(info.version.as_deref(), Some("v1.2.3"));

        let info = DistInfo::from_path("X/XY/XYZ/Foo-1.23-TRIAL.tar.gz").unwrap();
        assert_eq!(info.dist, "Foo");
        assert_eq!(info.version.as_deref(), Some("1.23-TRIAL"));

        let info = DistInfo::from_path("X/XY/XYZ/Foo-Bar-1.23_01.zip").unwrap();
        assert_eq!(info.dist, "Foo-Bar");
        assert_eq!(info.version.as_deref(), Some("1.23_01"));
    }

    #[test]
    fn test_packaging_suffix_after_version() {
        let info = DistInfo::from_path("A/AU/AUTHOR/Foo-Bar-1.0-1.tar.gz").unwrap();
        assert_eq!(info.dist, "Foo-Bar");
        assert_eq!(info.version.as_deref(), Some("1.0-1"));
    }

    #[test]
    fn test_numeric_name_segment() {
        let info = DistInfo::from_path("A/AU/AUTHOR/Acme-6502-1.0.tar.gz").unwrap();
        assert_eq!(info.dist, "Acme-6502");
        assert_eq!(info.version.as_deref(), Some("1.0"));

        let info = DistInfo::from_path("A/AU/AUTHOR/Foo-2.tgz").unwrap();
        assert_eq!(info.dist, "Foo");
        assert_eq!(info.version.as_deref(), Some("2"));
    }

    #[test]
    fn test_core_distribution() {
        let info = DistInfo::from_path("S/SH/SHAY/perl-5.36.0.tar.gz").unwrap();
        assert_eq!(info.dist, "perl");
        assert_eq!(info.version.as_deref(), Some("5.36.0"));
    }

    #[test]
    fn test_nested_author_directory() {
        let info = DistInfo::from_path("A/AU/AUTHOR/sub/dir/Foo-0.01.tar.bz2").unwrap();
        assert_eq!(info.author.as_deref(), Some("AUTHOR"));
        assert_eq!(info.dist, "Foo");
    }

    #[test]
    fn test_no_version() {
        let info = DistInfo::from_path("A/AU/AUTHOR/Foo-Bar.tar.gz").unwrap();
        assert_eq!(info.dist, "Foo-Bar");
        assert_eq!(info.version, None);
    }

    #[test]
    fn test_unparseable_paths() {
        assert_eq!(DistInfo::from_path(""), None);
        assert_eq!(DistInfo::from_path("A/AU/AUTHOR/Foo.pm.gz"), None);
        assert_eq!(DistInfo::from_path("A/AU/AUTHOR/.tar.gz"), None);
        assert_eq!(DistInfo::from_path("A/AU/AUTHOR/-1.0.tar.gz"), None);
    }
}
