pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod index;
pub mod loader;
pub mod merger;
pub mod model;
pub mod output;
pub mod releases;
pub mod report;
pub mod retry;
pub mod stamp;

pub use cache::Cache;
pub use config::Config;
pub use error::GenerateError;
pub use generator::{Generation, Generator};
pub use model::{Advisory, Database, DistributionEntry, ModuleIndex, ReleaseVersion};
pub use report::{Reporter, TracingReporter};
pub use stamp::VersionStamp;
