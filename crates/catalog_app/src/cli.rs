use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use catalog_core::DEFAULT_RETRY_BUDGET;
use catalog_engine::{SampleRunSettings, SamplerSettings, SizeRunSettings, CATALOG_ROOT};

#[derive(Parser, Debug)]
#[command(name = "catalog-sampler")]
#[command(about = "Random sampling of company contacts from https://www.edb.cz/katalog-firem/")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Max number of HTTP requests per second
    #[arg(short, long, default_value_t = 10.0, global = true)]
    pub limit: f64,

    /// Cache file with the number of pages in each section, loaded at start and stored when ending
    #[arg(short = 'g', long, default_value = "groups.json", global = true)]
    pub group_cache: PathBuf,

    /// Catalog front page listing the sections
    #[arg(long, default_value = CATALOG_ROOT, global = true)]
    pub catalog_root: String,

    /// Verbose logging (-v for request details, -vv for every page fetch)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write the log to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Gather randomly chosen companies with their emails
    Sample(SampleArgs),
    /// Write the number of companies in each section
    Size(SizeArgs),
    /// Print how many sections there are
    Count {
        #[arg(value_enum)]
        target: CountTarget,
    },
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Number of samples to gather
    pub num_samples: usize,

    /// Append to an existing output file instead of overwriting it
    #[arg(short, long)]
    pub append: bool,

    /// Output file path
    #[arg(short, long, default_value = "contacts.csv")]
    pub output: PathBuf,

    /// CSV with a `url` column, such as an earlier output; its companies are never sampled
    #[arg(short, long)]
    pub exclude: Option<PathBuf>,

    /// Attempts per sample before giving up on it
    #[arg(short, long, default_value_t = DEFAULT_RETRY_BUDGET)]
    pub retries: u32,

    /// Seconds to wait after a request timed out
    #[arg(long, default_value_t = 60)]
    pub timeout_backoff: u64,

    /// Only sample from sections whose page count is cached
    #[arg(long)]
    pub skip_uncached: bool,
}

impl SampleArgs {
    pub fn run_settings(&self, catalog_root: &str) -> SampleRunSettings {
        SampleRunSettings {
            requested: self.num_samples,
            catalog_root: catalog_root.to_string(),
            sampler: SamplerSettings {
                retry_budget: self.retries,
                timeout_backoff: Duration::from_secs(self.timeout_backoff),
                discover_uncached: !self.skip_uncached,
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct SizeArgs {
    /// Also discover sections missing from the cache, filling it
    #[arg(short, long)]
    pub fill: bool,

    /// Output file path
    #[arg(short, long, default_value = "group_size.csv")]
    pub output: PathBuf,
}

impl SizeArgs {
    pub fn run_settings(&self, catalog_root: &str) -> SizeRunSettings {
        SizeRunSettings {
            catalog_root: catalog_root.to_string(),
            discover_uncached: self.fill,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountTarget {
    /// Sections in the live catalog
    Total,
    /// Sections in the cache file
    Cached,
}
