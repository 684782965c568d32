use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cpansa_db::{
    cache::Cache,
    config::Config,
    generator::{Generation, Generator},
    index::{LocalIndex, PackageIndexSource, RemoteIndex},
    loader::discover_sources,
    output::{render, write_output, Destination, OutputFormat},
    releases::MetaCpanClient,
    report::{Reporter, TracingReporter},
    stamp::ArtifactStamp,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "cpansa-db")]
#[command(
    author,
    version,
    about = "Build the consolidated CPAN security advisory database"
)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the advisory database
    Generate {
        /// Advisory source files (default: discovered under the advisory dir)
        files: Vec<PathBuf>,

        /// Output file, also read back for the previous version stamp
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the database to standard output
        #[arg(long, conflicts_with = "no_output")]
        stdout: bool,

        /// Build the database but do not write it anywhere
        #[arg(long)]
        no_output: bool,

        /// Output format (perl, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Read the package index from a local file instead of downloading it
        #[arg(long)]
        index: Option<PathBuf>,

        /// Only report warnings and errors
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Report debug messages
        #[arg(short, long)]
        verbose: bool,

        /// Print a summary table when done
        #[arg(long)]
        summary: bool,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear the release history cache
    ClearCache,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => Config::load().unwrap_or_default(),
    };

    match cli.command {
        Commands::Generate {
            files,
            output,
            stdout,
            no_output,
            format,
            index,
            quiet,
            verbose,
            summary,
        } => {
            init_tracing(quiet, verbose);

            let mut config = config;
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(format) = format {
                config.format = format;
            }
            if let Some(index) = index {
                config.index_path = Some(index);
            }

            let destination = if no_output {
                Destination::Discard
            } else if stdout {
                Destination::Stdout
            } else {
                Destination::File(config.output.clone())
            };

            run_generate(&config, files, destination, quiet, summary).await
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            let cache = Cache::new();
            cache.clear()?;
            println!("Cache cleared.");
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_generate(
    config: &Config,
    files: Vec<PathBuf>,
    destination: Destination,
    quiet: bool,
    summary: bool,
) -> Result<u8> {
    let format = OutputFormat::from_str(&config.format).map_err(|e| anyhow::anyhow!(e))?;

    let sources = if files.is_empty() {
        discover_sources(&config.advisory_dir, &config.advisory_prefix)
    } else {
        files
    };

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .user_agent(concat!("cpansa-db/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let index: Box<dyn PackageIndexSource> = match &config.index_path {
        Some(path) => Box::new(LocalIndex::new(path)),
        None => Box::new(RemoteIndex::new(client.clone(), &config.index_url)),
    };
    let releases = MetaCpanClient::new(
        client,
        &config.release_search_url,
        config.release_page_size,
    );

    let reporter = CliReporter::new(quiet);
    let cache = (config.cache_ttl_hours > 0).then(|| Cache::with_ttl_hours(config.cache_ttl_hours));

    let mut generator = Generator::new(config, &reporter, &releases, index.as_ref());
    if let Some(cache) = &cache {
        generator = generator.with_cache(cache);
    }

    let stamps = ArtifactStamp::new(&config.output);
    let generation = generator
        .run(&sources, &stamps, chrono::Local::now().date_naive())
        .await?;
    reporter.finish();

    let text = render(
        &generation.database,
        &generation.stamp,
        format,
        &config.perl_package,
    )?;
    write_output(&text, &destination)?;

    if let Destination::File(path) = &destination {
        tracing::info!("Wrote database {} to {}", generation.stamp, path.display());
    }

    if summary {
        print_summary(&generation);
    }

    Ok(exit_codes::SUCCESS)
}

/// Logs through `tracing` and drives a progress bar for release lookups.
struct CliReporter {
    inner: TracingReporter,
    progress: ProgressBar,
}

impl CliReporter {
    fn new(quiet: bool) -> Self {
        let progress = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} Resolving releases...")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        };
        Self {
            inner: TracingReporter,
            progress,
        }
    }

    fn finish(&self) {
        self.progress.finish_and_clear();
    }
}

impl Reporter for CliReporter {
    fn debug(&self, message: &str) {
        self.progress.suspend(|| self.inner.debug(message));
    }

    fn info(&self, message: &str) {
        self.progress.suspend(|| self.inner.info(message));
    }

    fn warn(&self, message: &str) {
        self.progress.suspend(|| self.inner.warn(message));
    }

    fn progress(&self, done: usize, total: usize) {
        self.progress.set_length(total as u64);
        self.progress.set_position(done as u64);
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Count")]
    count: usize,
}

fn print_summary(generation: &Generation) {
    let db = &generation.database;
    let rows = vec![
        SummaryRow {
            metric: "Distributions",
            count: db.dists.len(),
        },
        SummaryRow {
            metric: "Advisories",
            count: db.advisory_count(),
        },
        SummaryRow {
            metric: "With release history",
            count: db.resolved_count(),
        },
        SummaryRow {
            metric: "Indexed modules",
            count: db.module2dist.len(),
        },
    ];

    println!();
    println!("Database version {}", generation.stamp);
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'cpansa-db config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
