//! CLI argument definitions for tickvault.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Full pipeline: universe, fundamentals, macro, FX, indexes |
//! | `universe` | Resolve and cache the four symbol lists |
//! | `fundamentals` | Fetch the eight fundamentals files for given symbols |
//! | `macro` | Macro indicators and reference series |
//! | `fx` | Currency catalog and yearly FX chunks |
//! | `index` | Build exchange and search indexes from the cache |
//!
//! # Global Options
//!
//! | Option | Env | Default |
//! |--------|-----|---------|
//! | `--data-dir` | `TICKVAULT_DATA_DIR` | `./data` |
//! | `--api-key` | `TICKVAULT_API_KEY` | none |
//! | `--fx-access-key` | `TICKVAULT_FX_ACCESS_KEY` | none |
//! | `--rate-per-minute` | | `250` |
//! | `--max-attempts` | | `3` |
//! | `--retry-delay-ms` | | `2000` |
//! | `--timeout-ms` | | `30000` |
//! | `--workers` | | `1` |
//! | `--fx-start-year` | | `2000` |
//!
//! # Examples
//!
//! ```bash
//! # Populate ./data from scratch (resumable)
//! TICKVAULT_API_KEY=... tickvault run
//!
//! # Refresh two symbols with four concurrent workers
//! tickvault --workers 4 fundamentals AAPL ^GSPC --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Rate-limited, resumable downloader for fundamentals, macro and FX data.
#[derive(Debug, Parser)]
#[command(
    name = "tickvault",
    author,
    version,
    about = "Rate-limited, resumable financial data downloader",
    long_about = "tickvault populates a local data directory with fundamentals, macro \
indicators and FX rates, then builds exchange and search indexes from it.\n\
\n\
Every file is downloaded at most once: re-running a command only fetches \
what is still missing."
)]
pub struct Cli {
    /// Root of the on-disk dataset.
    #[arg(long, global = true, env = "TICKVAULT_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Fundamentals API key.
    #[arg(long, global = true, env = "TICKVAULT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Optional FX API access key.
    #[arg(long, global = true, env = "TICKVAULT_FX_ACCESS_KEY", hide_env_values = true)]
    pub fx_access_key: Option<String>,

    /// Fundamentals API base URL.
    #[arg(
        long,
        global = true,
        default_value = tickvault_core::fetcher::DEFAULT_FUNDAMENTALS_BASE_URL
    )]
    pub fundamentals_url: String,

    /// FX API base URL.
    #[arg(long, global = true, default_value = tickvault_core::fetcher::DEFAULT_FX_BASE_URL)]
    pub fx_url: String,

    /// Maximum requests per minute across all workers.
    #[arg(long, global = true, default_value_t = 250)]
    pub rate_per_minute: u32,

    /// Total attempts per file, including the first.
    #[arg(long, global = true, default_value_t = 3)]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    #[arg(long, global = true, default_value_t = 2000)]
    pub retry_delay_ms: u64,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Symbols processed concurrently.
    #[arg(long, global = true, default_value_t = 1)]
    pub workers: usize,

    /// First year of FX history, 1999 or later.
    #[arg(long, global = true, default_value_t = 2000)]
    pub fx_start_year: i32,

    /// Pretty-print the JSON report.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every stage in order.
    Run,
    /// Resolve and cache the symbol lists.
    Universe,
    /// Fetch fundamentals for specific symbols.
    Fundamentals(FundamentalsArgs),
    /// Fetch macro indicators and reference series.
    Macro,
    /// Fetch the currency catalog and yearly FX chunks.
    Fx,
    /// Build exchange and search indexes from cached profiles.
    Index,
}

#[derive(Debug, Clone, Args)]
pub struct FundamentalsArgs {
    /// Ticker symbols, e.g. AAPL MSFT ^GSPC.
    #[arg(required = true)]
    pub symbols: Vec<String>,
}
