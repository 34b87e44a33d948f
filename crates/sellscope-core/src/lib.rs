//! # Sellscope Core
//!
//! Insider-sell aggregation and anomaly-signal engine.
//!
//! ## Overview
//!
//! This crate provides the foundational components for Sellscope:
//!
//! - **Canonical domain model** for insider sell transactions
//! - **Provider adapters** for FMP, SEC-API, EODHD and Financial Datasets
//! - **Aggregator** with concurrent fan-out and deterministic cross-source
//!   deduplication
//! - **Signal engine** scoring current sell volume against a historical
//!   baseline (windowed z-score)
//! - **Universe loader** and **snapshot store** supporting batch scans
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (FMP, SEC-API, EODHD, Financial Datasets) |
//! | [`aggregator`] | Fan-out, merge and deduplication |
//! | [`config`] | Runtime configuration from the environment |
//! | [`domain`] | Domain model (SellRecord, Symbol, date codecs) |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider`] | Source trait and request/error contract |
//! | [`provider_policy`] | Per-provider quota and fan-out policies |
//! | [`report`] | Presentation rollups (top insiders) |
//! | [`signal`] | Windowed z-score anomaly detection |
//! | [`snapshot`] | Flat-file result cache |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Rate limiting support |
//! | [`universe`] | S&P 500 ticker universe |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sellscope_core::{Aggregator, SignalConfig, TrackerConfig, compute_signals};
//! use time::macros::date;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TrackerConfig::from_env();
//!     let aggregator = Aggregator::builder()
//!         .from_tracker_config(&config)
//!         .build();
//!
//!     let tickers = vec!["AAPL".parse()?, "NVDA".parse()?];
//!     let report = aggregator
//!         .aggregate(&tickers, date!(2023 - 06 - 01), date!(2024 - 06 - 01))
//!         .await?;
//!
//!     let signals = compute_signals(&report.records, &config.signal, date!(2024 - 06 - 01));
//!     for signal in signals.iter().filter(|s| s.is_anomaly) {
//!         println!("{}: z = {:?}", signal.ticker, signal.z_score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod aggregator;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod provider_policy;
pub mod report;
pub mod signal;
pub mod snapshot;
pub mod source;
pub mod throttling;
pub mod universe;

pub use adapters::{EodhdAdapter, FinancialDatasetsAdapter, FmpAdapter, SecApiAdapter};
pub use aggregator::{
    AggregateError, AggregateReport, Aggregator, AggregatorBuilder, AggregatorConfig,
    SourceFailure,
};
pub use config::TrackerConfig;
pub use domain::{SellRecord, Symbol};
pub use error::{CoreError, ValidationError};
pub use provider::{FetchRequest, InsiderSource, SourceError, SourceErrorKind, SourceTraits};
pub use provider_policy::ProviderPolicy;
pub use report::{top_insiders_by_ticker, TopInsider};
pub use signal::{
    anomalous_tickers, compute_signals, daily_volume, rank_by_z_score, DailyVolume, Signal,
    SignalConfig,
};
pub use snapshot::SnapshotStore;
pub use source::ProviderId;
pub use throttling::ThrottleGate;
pub use universe::UniverseLoader;
