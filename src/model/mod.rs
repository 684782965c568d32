//! Core data types for advisories and the assembled database.
//!
//! This module contains the fundamental types used throughout cpansa-db:
//!
//! - [`Advisory`] - One reported vulnerability for one distribution
//! - [`DistributionEntry`] - Everything known about one distribution
//! - [`ReleaseVersion`] - A `{date, version}` pair from the release history
//! - [`Database`] - The assembled output, `dists` plus `module2dist`
//!
//! Every type serializes to a plain nested map/sequence structure, so any
//! serializer can consume a [`Database`] without knowing these types.
//!
//! # Example
//!
//! ```
//! use cpansa_db::{Advisory, Database};
//!
//! let mut db = Database::default();
//! let advisory = Advisory::new().with_field("id", "CPANSA-Foo-2024-01");
//! db.dists.entry("Foo".to_string()).or_default().advisories.push(advisory);
//!
//! println!("Database holds {} distributions", db.dists.len());
//! ```

mod advisory;
mod database;

pub use advisory::*;
pub use database::*;
