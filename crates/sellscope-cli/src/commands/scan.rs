//! `scan`: aggregate insider sells for the universe, then score each
//! ticker's current sell volume against its own baseline.

use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use time::{Date, OffsetDateTime};

use sellscope_core::domain::dates;
use sellscope_core::http_client::ReqwestHttpClient;
use sellscope_core::{
    compute_signals, rank_by_z_score, Aggregator, SellRecord, Signal, SignalConfig,
    SnapshotStore, Symbol, TrackerConfig, UniverseLoader,
};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{csv_field, CommandOutput};

pub async fn run(args: &ScanArgs) -> Result<CommandOutput, CliError> {
    let config = TrackerConfig::from_env();
    let signal_config = SignalConfig {
        baseline_days: args.baseline_days,
        current_days: args.current_days,
        std_threshold: args.std_threshold,
        min_baseline_points: args.min_baseline_points,
    };

    let as_of = match &args.as_of {
        Some(raw) => dates::parse_iso_date(raw)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let lookback =
        time::Duration::days(signal_config.baseline_days + signal_config.current_days);
    let date_from = as_of.saturating_sub(lookback);

    let tickers = resolve_tickers(args, &config).await?;

    let (records, scan_meta) = load_records(args, &config, &tickers, date_from, as_of).await?;

    let mut signals = rank_by_z_score(compute_signals(&records, &signal_config, as_of));
    if !args.all_signals {
        signals.retain(|signal| signal.is_anomaly);
    }

    if let Some(path) = &args.csv {
        write_csv(path, &signals)?;
    }

    let data = json!({
        "as_of": dates::format_iso_date(as_of),
        "universe_size": tickers.len(),
        "records": records.len(),
        "cache_hit": scan_meta.cache_hit,
        "duplicates_removed": scan_meta.duplicates_removed,
        "failures": scan_meta.failures,
        "signals": signals,
    });

    Ok(CommandOutput::new(data).with_table(table_lines(as_of, &signals)))
}

struct ScanMeta {
    cache_hit: bool,
    duplicates_removed: usize,
    failures: Vec<serde_json::Value>,
}

/// Tickers from `--tickers` verbatim, otherwise the S&P 500 universe.
async fn resolve_tickers(args: &ScanArgs, config: &TrackerConfig) -> Result<Vec<Symbol>, CliError> {
    let mut tickers = if args.tickers.is_empty() {
        let loader = UniverseLoader::new(
            Arc::new(ReqwestHttpClient::new()),
            config.fmp_api_key.clone(),
        );
        loader.load().await
    } else {
        args.tickers
            .iter()
            .map(|raw| Symbol::parse(raw))
            .collect::<Result<Vec<_>, _>>()?
    };

    if let Some(limit) = args.limit {
        tickers.truncate(limit);
    }
    Ok(tickers)
}

/// Aggregate fresh records, or reuse the snapshot when one is configured
/// and still fresh.
async fn load_records(
    args: &ScanArgs,
    config: &TrackerConfig,
    tickers: &[Symbol],
    date_from: Date,
    date_to: Date,
) -> Result<(Vec<SellRecord>, ScanMeta), CliError> {
    let store = args.snapshot.as_ref().map(SnapshotStore::new);

    if let Some(store) = &store {
        if let Some(records) = store.read::<Vec<SellRecord>>(args.allow_stale) {
            tracing::debug!(count = records.len(), "serving records from snapshot");
            return Ok((
                records,
                ScanMeta {
                    cache_hit: true,
                    duplicates_removed: 0,
                    failures: Vec::new(),
                },
            ));
        }
    }

    let aggregator = Aggregator::builder().from_tracker_config(config).build();
    let report = aggregator.aggregate(tickers, date_from, date_to).await?;

    if let Some(store) = &store {
        store.write(&report.records)?;
    }

    let failures = report
        .failures
        .iter()
        .map(|failure| {
            json!({
                "source": failure.source,
                "ticker": failure.ticker.as_ref().map(|t| t.as_str()),
                "code": failure.error.code(),
                "message": failure.error.message(),
            })
        })
        .collect();

    Ok((
        report.records,
        ScanMeta {
            cache_hit: false,
            duplicates_removed: report.duplicates_removed,
            failures,
        },
    ))
}

fn write_csv(path: &std::path::Path, signals: &[Signal]) -> Result<(), CliError> {
    let mut file = std::fs::File::create(path)?;
    writeln!(
        file,
        "ticker,current_shares_sold,baseline_mean,baseline_std,z_score,is_anomaly"
    )?;
    for signal in signals {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            csv_field(signal.ticker.as_str()),
            signal.current_shares_sold,
            opt_num(signal.baseline_mean),
            opt_num(signal.baseline_std),
            opt_num(signal.z_score),
            signal.is_anomaly,
        )?;
    }
    Ok(())
}

fn opt_num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn table_lines(as_of: Date, signals: &[Signal]) -> Vec<String> {
    let mut lines = vec![
        format!("as_of       : {}", dates::format_iso_date(as_of)),
        format!("signals     : {}", signals.len()),
        format!(
            "{:<8} {:>16} {:>14} {:>10} {:>8}",
            "ticker", "current_shares", "baseline_mean", "z_score", "anomaly"
        ),
    ];
    for signal in signals {
        lines.push(format!(
            "{:<8} {:>16.1} {:>14} {:>10} {:>8}",
            signal.ticker.as_str(),
            signal.current_shares_sold,
            signal
                .baseline_mean
                .map(|v| format!("{v:.1}"))
                .unwrap_or_else(|| String::from("-")),
            signal
                .z_score
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| String::from("-")),
            if signal.is_anomaly { "yes" } else { "no" },
        ));
    }
    lines
}
