//! Presentation-side rollups over deduplicated records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{SellRecord, Symbol};

/// One insider's totals within a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopInsider {
    pub insider_name: String,
    pub role: Option<String>,
    pub total_shares_sold: f64,
    pub total_value_usd: Option<f64>,
    pub num_transactions: usize,
}

/// Top `n` insiders per ticker by shares sold. Records without an insider
/// name are grouped under "(unknown)".
pub fn top_insiders_by_ticker(
    records: &[SellRecord],
    n: usize,
) -> BTreeMap<Symbol, Vec<TopInsider>> {
    let mut by_insider: BTreeMap<(Symbol, String), TopInsider> = BTreeMap::new();

    for record in records {
        let name = record
            .insider_name
            .clone()
            .unwrap_or_else(|| String::from("(unknown)"));
        let entry = by_insider
            .entry((record.ticker.clone(), name.clone()))
            .or_insert_with(|| TopInsider {
                insider_name: name,
                role: record.role.clone(),
                total_shares_sold: 0.0,
                total_value_usd: None,
                num_transactions: 0,
            });

        entry.total_shares_sold += record.shares_sold;
        if let Some(value) = record.value_usd {
            entry.total_value_usd = Some(entry.total_value_usd.unwrap_or(0.0) + value);
        }
        if entry.role.is_none() {
            entry.role = record.role.clone();
        }
        entry.num_transactions += 1;
    }

    let mut by_ticker: BTreeMap<Symbol, Vec<TopInsider>> = BTreeMap::new();
    for ((ticker, _), insider) in by_insider {
        by_ticker.entry(ticker).or_default().push(insider);
    }

    for insiders in by_ticker.values_mut() {
        insiders.sort_by(|a, b| b.total_shares_sold.total_cmp(&a.total_shares_sold));
        insiders.truncate(n);
    }

    by_ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderId;
    use time::macros::date;

    fn record(insider: Option<&str>, shares: f64, value: Option<f64>) -> SellRecord {
        SellRecord::new(
            Symbol::parse("AAPL").unwrap(),
            None,
            insider.map(str::to_owned),
            None,
            date!(2024 - 03 - 01),
            None,
            shares,
            value,
            ProviderId::Fmp,
        )
        .unwrap()
    }

    #[test]
    fn ranks_insiders_by_shares_and_truncates() {
        let records = vec![
            record(Some("A"), 100.0, Some(1_000.0)),
            record(Some("A"), 50.0, None),
            record(Some("B"), 400.0, None),
            record(Some("C"), 10.0, None),
        ];

        let report = top_insiders_by_ticker(&records, 2);
        let insiders = &report[&Symbol::parse("AAPL").unwrap()];
        assert_eq!(insiders.len(), 2);
        assert_eq!(insiders[0].insider_name, "B");
        assert_eq!(insiders[1].total_shares_sold, 150.0);
        assert_eq!(insiders[1].total_value_usd, Some(1_000.0));
    }

    #[test]
    fn nameless_records_pool_together() {
        let records = vec![record(None, 5.0, None), record(None, 7.0, None)];
        let report = top_insiders_by_ticker(&records, 5);
        let insiders = &report[&Symbol::parse("AAPL").unwrap()];
        assert_eq!(insiders.len(), 1);
        assert_eq!(insiders[0].insider_name, "(unknown)");
        assert_eq!(insiders[0].num_transactions, 2);
    }
}
