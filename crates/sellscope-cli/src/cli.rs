//! CLI argument definitions for Sellscope.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scan` | Aggregate insider sells and score anomalies |
//! | `sources` | List provider availability and constraints |
//! | `universe` | Print the resolved ticker universe |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! # Scan the S&P 500 for anomalous selling
//! sellscope scan
//!
//! # Scan specific tickers with a tighter threshold
//! sellscope scan --tickers AAPL,NVDA --std-threshold 1.5 --all-signals
//!
//! # Reproducible historical scan
//! sellscope scan --as-of 2024-06-01 --csv signals.csv
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Insider stock-sale tracker and anomaly scanner.
///
/// Aggregates insider disposal filings from multiple providers
/// (FMP, SEC-API, EODHD, Financial Datasets), deduplicates them across
/// sources and flags tickers whose recent sell volume is anomalous
/// against their own one-year baseline.
#[derive(Debug, Parser)]
#[command(
    name = "sellscope",
    author,
    version,
    about = "Insider stock-sale tracker and anomaly scanner"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object output.
    Json,
    /// ASCII table format for terminal display.
    Table,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// 🔎 Aggregate insider sells and score anomalies.
    ///
    /// Fetches disposal filings for the ticker universe across all
    /// configured providers, deduplicates them and computes windowed
    /// z-score signals.
    ///
    /// # Examples
    ///
    ///   sellscope scan
    ///   sellscope scan --tickers AAPL,MSFT --all-signals --pretty
    ///   sellscope scan --as-of 2024-06-01 --baseline-days 180
    Scan(ScanArgs),

    /// 🔌 List provider availability and constraints.
    ///
    /// Shows which providers have keys configured and their free-tier
    /// fan-out caps.
    Sources(SourcesArgs),

    /// 🌐 Print the resolved ticker universe.
    Universe(UniverseArgs),
}

/// Arguments for the `scan` command.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Comma-separated tickers to scan instead of the S&P 500 universe.
    #[arg(long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Cap the universe at the first N tickers.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Reference date (YYYY-MM-DD); defaults to today (UTC).
    #[arg(long)]
    pub as_of: Option<String>,

    /// Baseline window length in days.
    #[arg(long, default_value_t = 365)]
    pub baseline_days: i64,

    /// Current window length in days.
    #[arg(long, default_value_t = 30)]
    pub current_days: i64,

    /// Z-score threshold at or above which a ticker is flagged.
    #[arg(long, default_value_t = 2.0)]
    pub std_threshold: f64,

    /// Minimum baseline observations required to score a ticker.
    #[arg(long, default_value_t = 5)]
    pub min_baseline_points: usize,

    /// Emit every scored signal, not just anomalies.
    #[arg(long, default_value_t = false)]
    pub all_signals: bool,

    /// Also write the signals to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<std::path::PathBuf>,

    /// Cache aggregated records in this JSON snapshot (24 h max age).
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<std::path::PathBuf>,

    /// Read the snapshot even when it is older than 24 h.
    #[arg(long, default_value_t = false)]
    pub allow_stale: bool,
}

/// Arguments for the `sources` command.
#[derive(Debug, Args)]
pub struct SourcesArgs {}

/// Arguments for the `universe` command.
#[derive(Debug, Args)]
pub struct UniverseArgs {
    /// Cap the universe at the first N tickers.
    #[arg(long)]
    pub limit: Option<usize>,
}
