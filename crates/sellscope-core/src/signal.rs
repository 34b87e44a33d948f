//! Windowed z-score anomaly detection over daily sell volume.
//!
//! The engine is a pure function of its inputs: records in, signals out,
//! with the reference date passed explicitly. Two adjacent windows are
//! anchored at `as_of`:
//!
//! ```text
//! [baseline_end - baseline_days, baseline_end)  [as_of - current_days, as_of]
//!              baseline window                         current window
//! ```
//!
//! with `baseline_end = as_of - current_days`. Baseline observations are
//! daily totals for days that had recorded selling; days without filings
//! contribute nothing. The current window's average daily volume is then
//! scored against the baseline distribution.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::dates;
use crate::{SellRecord, Symbol};

/// Tunables for the anomaly scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Length of the baseline window in days.
    pub baseline_days: i64,
    /// Length of the current window in days.
    pub current_days: i64,
    /// Z-score at or above which the current window is anomalous.
    pub std_threshold: f64,
    /// Minimum baseline observations required to score at all.
    pub min_baseline_points: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            baseline_days: 365,
            current_days: 30,
            std_threshold: 2.0,
            min_baseline_points: 5,
        }
    }
}

/// Aggregate sell volume for one `(ticker, day)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVolume {
    pub ticker: Symbol,
    #[serde(with = "dates::iso")]
    pub date: Date,
    pub total_shares_sold: f64,
    /// Sum of transaction values; `None` when no transaction that day
    /// carried a value.
    pub total_value_usd: Option<f64>,
    pub num_transactions: usize,
}

/// Scored outcome for one ticker.
///
/// `baseline_mean`, `baseline_std` and `z_score` are `None` when the
/// baseline had fewer than `min_baseline_points` observations. That state
/// is "undetermined", not "no anomaly": `is_anomaly` is `false` but the
/// caller can tell the two apart by checking `z_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: Symbol,
    pub current_shares_sold: f64,
    pub baseline_mean: Option<f64>,
    pub baseline_std: Option<f64>,
    pub z_score: Option<f64>,
    pub is_anomaly: bool,
}

/// Collapse records into per-`(ticker, day)` totals, ordered by ticker
/// then date.
pub fn daily_volume(records: &[SellRecord]) -> Vec<DailyVolume> {
    let mut days: BTreeMap<(Symbol, Date), (f64, Option<f64>, usize)> = BTreeMap::new();

    for record in records {
        let entry = days
            .entry((record.ticker.clone(), record.transaction_date))
            .or_insert((0.0, None, 0));
        entry.0 += record.shares_sold;
        if let Some(value) = record.value_usd {
            entry.1 = Some(entry.1.unwrap_or(0.0) + value);
        }
        entry.2 += 1;
    }

    days.into_iter()
        .map(
            |((ticker, date), (total_shares_sold, total_value_usd, num_transactions))| {
                DailyVolume {
                    ticker,
                    date,
                    total_shares_sold,
                    total_value_usd,
                    num_transactions,
                }
            },
        )
        .collect()
}

/// Score every ticker present in `records` against its own baseline.
///
/// Output carries exactly one entry per distinct input ticker, ordered
/// by ticker. A ticker whose records all fall outside both windows still
/// appears, as an undetermined signal with zero current volume.
pub fn compute_signals(records: &[SellRecord], config: &SignalConfig, as_of: Date) -> Vec<Signal> {
    let current_start = as_of.saturating_sub(time::Duration::days(config.current_days));
    let baseline_end = current_start;
    let baseline_start = baseline_end.saturating_sub(time::Duration::days(config.baseline_days));

    // Per ticker: baseline daily totals and the current-window total.
    let mut baselines: BTreeMap<Symbol, BTreeMap<Date, f64>> = BTreeMap::new();
    let mut currents: BTreeMap<Symbol, f64> = BTreeMap::new();
    let mut tickers: BTreeSet<Symbol> = BTreeSet::new();

    for record in records {
        tickers.insert(record.ticker.clone());
        let date = record.transaction_date;
        if date >= baseline_start && date < baseline_end {
            *baselines
                .entry(record.ticker.clone())
                .or_default()
                .entry(date)
                .or_insert(0.0) += record.shares_sold;
        } else if date >= current_start && date <= as_of {
            *currents.entry(record.ticker.clone()).or_insert(0.0) += record.shares_sold;
        }
    }

    tickers
        .into_iter()
        .map(|ticker| {
            let current_total = currents.get(&ticker).copied().unwrap_or(0.0);
            let baseline: Vec<f64> = baselines
                .get(&ticker)
                .map(|days| days.values().copied().collect())
                .unwrap_or_default();

            // A single observation has no sample deviation, so it can
            // never be scored even when the configured minimum allows it.
            if baseline.len() < config.min_baseline_points.max(2) {
                return Signal {
                    ticker,
                    current_shares_sold: current_total,
                    baseline_mean: None,
                    baseline_std: None,
                    z_score: None,
                    is_anomaly: false,
                };
            }

            let mean = baseline.iter().sum::<f64>() / baseline.len() as f64;
            let std = sample_std(&baseline, mean).max(1e-9);

            let window_days = (config.current_days + 1).max(1) as f64;
            let current_avg_daily = current_total / window_days;
            let z = (current_avg_daily - mean) / std;

            Signal {
                ticker,
                current_shares_sold: current_total,
                baseline_mean: Some(mean),
                baseline_std: Some(std),
                z_score: Some(z),
                is_anomaly: z >= config.std_threshold && current_total > 0.0,
            }
        })
        .collect()
}

/// Signals sorted by descending z-score; undetermined signals sink to the
/// bottom in ticker order.
pub fn rank_by_z_score(mut signals: Vec<Signal>) -> Vec<Signal> {
    signals.sort_by(|a, b| match (b.z_score, a.z_score) {
        (Some(zb), Some(za)) => zb.total_cmp(&za),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => a.ticker.cmp(&b.ticker),
    });
    signals
}

/// Tickers currently flagged anomalous, in signal order.
pub fn anomalous_tickers(signals: &[Signal]) -> Vec<Symbol> {
    signals
        .iter()
        .filter(|signal| signal.is_anomaly)
        .map(|signal| signal.ticker.clone())
        .collect()
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderId;
    use time::macros::date;

    fn record(ticker: &str, date: Date, shares: f64) -> SellRecord {
        SellRecord::new(
            Symbol::parse(ticker).unwrap(),
            None,
            None,
            None,
            date,
            None,
            shares,
            None,
            ProviderId::Fmp,
        )
        .unwrap()
    }

    #[test]
    fn daily_volume_sums_per_day_and_keeps_value_nullable() {
        let mut with_value = record("AAPL", date!(2024 - 03 - 01), 100.0);
        with_value.value_usd = Some(5_000.0);
        let records = vec![
            with_value,
            record("AAPL", date!(2024 - 03 - 01), 50.0),
            record("AAPL", date!(2024 - 03 - 02), 10.0),
        ];

        let days = daily_volume(&records);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].total_shares_sold, 150.0);
        assert_eq!(days[0].total_value_usd, Some(5_000.0));
        assert_eq!(days[0].num_transactions, 2);
        assert_eq!(days[1].total_value_usd, None);
    }

    #[test]
    fn thin_baseline_is_undetermined_not_negative() {
        let as_of = date!(2024 - 06 - 01);
        let records = vec![
            record("AAPL", date!(2024 - 01 - 10), 100.0),
            record("AAPL", date!(2024 - 02 - 10), 100.0),
            record("AAPL", date!(2024 - 05 - 20), 9_999.0),
        ];

        let signals = compute_signals(&records, &SignalConfig::default(), as_of);
        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert_eq!(signal.z_score, None);
        assert_eq!(signal.baseline_mean, None);
        assert!(!signal.is_anomaly);
        assert_eq!(signal.current_shares_sold, 9_999.0);
    }

    #[test]
    fn flat_baseline_gets_epsilon_std() {
        let as_of = date!(2024 - 12 - 01);
        let mut records: Vec<SellRecord> = (1..=5)
            .map(|month| record("AAPL", Date::from_calendar_date(2024, time::Month::try_from(month).unwrap(), 10).unwrap(), 100.0))
            .collect();
        records.push(record("AAPL", date!(2024 - 11 - 20), 1_000_000.0));

        let signals = compute_signals(&records, &SignalConfig::default(), as_of);
        let signal = &signals[0];
        assert_eq!(signal.baseline_std, Some(1e-9));
        assert!(signal.z_score.unwrap() > 0.0);
        assert!(signal.is_anomaly);
    }

    #[test]
    fn windows_are_contiguous_and_non_overlapping() {
        let as_of = date!(2024 - 06 - 01);
        let config = SignalConfig::default();
        // baseline_end = 2024-05-02; this record sits exactly on the
        // boundary and must count as current, not baseline.
        let boundary = record("AAPL", date!(2024 - 05 - 02), 500.0);

        let signals = compute_signals(&[boundary], &config, as_of);
        assert_eq!(signals[0].current_shares_sold, 500.0);
        assert_eq!(signals[0].z_score, None);
    }

    #[test]
    fn zero_current_volume_never_flags() {
        let as_of = date!(2024 - 12 - 01);
        let records: Vec<SellRecord> = (1..=6)
            .map(|month| record("AAPL", Date::from_calendar_date(2024, time::Month::try_from(month).unwrap(), 10).unwrap(), 100.0))
            .collect();

        let signals = compute_signals(&records, &SignalConfig::default(), as_of);
        let signal = &signals[0];
        assert_eq!(signal.current_shares_sold, 0.0);
        assert!(!signal.is_anomaly);
        assert!(signal.z_score.is_some());
    }

    #[test]
    fn ranking_sinks_undetermined_signals() {
        let mk = |ticker: &str, z: Option<f64>| Signal {
            ticker: Symbol::parse(ticker).unwrap(),
            current_shares_sold: 0.0,
            baseline_mean: None,
            baseline_std: None,
            z_score: z,
            is_anomaly: false,
        };
        let ranked = rank_by_z_score(vec![
            mk("AAA", None),
            mk("BBB", Some(1.0)),
            mk("CCC", Some(3.0)),
        ]);
        assert_eq!(ranked[0].ticker.as_str(), "CCC");
        assert_eq!(ranked[1].ticker.as_str(), "BBB");
        assert_eq!(ranked[2].ticker.as_str(), "AAA");
    }
}
