use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::adapters::{date_field, f64_field, item_list, str_field};
use crate::domain::dates::format_iso_date;
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::provider::{FetchRequest, InsiderSource, SourceError, SourceTraits};
use crate::{ProviderId, SellRecord, Symbol};

const EODHD_BASE: &str = "https://eodhd.com/api";

/// EODHD insider-transactions adapter (Form 4 derived).
#[derive(Clone)]
pub struct EodhdAdapter {
    api_key: Option<String>,
    http_client: Arc<dyn HttpClient>,
}

impl Default for EodhdAdapter {
    fn default() -> Self {
        Self {
            api_key: None,
            http_client: Arc::new(NoopHttpClient),
        }
    }
}

impl EodhdAdapter {
    pub fn new(api_key: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            http_client,
        }
    }

    /// EODHD addresses US listings as `TICKER.US`; records must carry the
    /// bare ticker so they line up with the other sources. Share-class
    /// dots (`BRK.B`) are not exchange suffixes and stay intact.
    fn canonical_ticker(ticker: &Symbol) -> Symbol {
        match ticker.as_str().strip_suffix(".US") {
            Some(bare) => Symbol::parse(bare).unwrap_or_else(|_| ticker.clone()),
            None => ticker.clone(),
        }
    }

    fn parse_item(item: &Value, ticker: &Symbol, req: &FetchRequest) -> Option<SellRecord> {
        // EODHD transaction codes: S=Sale, D=Disposed, C=Conversion
        // (treated as a disposal), P=Purchase.
        let code = str_field(item, &["transactionCode", "code", "transactionType"])
            .unwrap_or("")
            .to_ascii_uppercase();
        if !matches!(code.as_str(), "S" | "D" | "C") {
            return None;
        }

        let shares = f64_field(item, &["shares", "share", "amount"])?;
        let tx_date = date_field(item, &["transactionDate", "date", "reportDate"])?;
        if !req.contains(tx_date) {
            return None;
        }

        SellRecord::new(
            ticker.clone(),
            str_field(item, &["companyName", "issuer"]).map(str::to_owned),
            str_field(item, &["ownerName", "reportingName", "name"]).map(str::to_owned),
            str_field(item, &["relationship", "typeOfOwner"]).map(str::to_owned),
            tx_date,
            date_field(item, &["reportDate", "filingDate"]),
            shares,
            f64_field(item, &["value", "valueUsd"]),
            ProviderId::Eodhd,
        )
        .ok()
    }
}

impl InsiderSource for EodhdAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Eodhd
    }

    fn traits(&self) -> SourceTraits {
        SourceTraits::per_ticker_only()
    }

    fn fetch<'a>(
        &'a self,
        req: FetchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SellRecord>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(api_key) = self.api_key.as_deref() else {
                return Err(SourceError::unavailable("eodhd api key not configured"));
            };
            let Some(ticker) = req.ticker.clone() else {
                return Err(SourceError::invalid_request(
                    "eodhd only supports per-ticker queries",
                ));
            };

            let endpoint = format!(
                "{EODHD_BASE}/insider-transactions?api_token={}&code={}&limit=500&date_from={}&date_to={}",
                urlencoding::encode(api_key),
                urlencoding::encode(ticker.as_str()),
                format_iso_date(req.date_from),
                format_iso_date(req.date_to),
            );

            let response = self
                .http_client
                .execute(HttpRequest::get(endpoint))
                .await
                .map_err(|e| {
                    SourceError::unavailable(format!("eodhd transport error: {}", e.message()))
                })?;

            if response.status == 429 {
                return Err(SourceError::rate_limited("eodhd quota exhausted"));
            }
            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "eodhd upstream returned status {}",
                    response.status
                )));
            }

            let payload: Value = serde_json::from_str(&response.body)
                .map_err(|e| SourceError::unavailable(format!("eodhd decode error: {e}")))?;

            let record_ticker = Self::canonical_ticker(&ticker);
            let records: Vec<SellRecord> = item_list(&payload, &["data", "transactions"])
                .iter()
                .filter_map(|item| Self::parse_item(item, &record_ticker, &req))
                .collect();

            tracing::debug!(
                source = "eodhd",
                ticker = ticker.as_str(),
                count = records.len(),
                "fetched insider sells"
            );
            Ok(records)
        })
    }
}
