use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::adapters::{date_field, f64_field, item_list, str_field};
use crate::domain::dates::format_iso_date;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, NoopHttpClient};
use crate::provider::{FetchRequest, InsiderSource, SourceError, SourceTraits};
use crate::{ProviderId, SellRecord, Symbol};

const FD_BASE: &str = "https://api.financialdatasets.ai";

/// Financial Datasets insider-trades adapter.
///
/// The upstream filters on filing date rather than transaction date, so
/// the transaction-date range check after parsing is still required.
#[derive(Clone)]
pub struct FinancialDatasetsAdapter {
    api_key: Option<String>,
    http_client: Arc<dyn HttpClient>,
}

impl Default for FinancialDatasetsAdapter {
    fn default() -> Self {
        Self {
            api_key: None,
            http_client: Arc::new(NoopHttpClient),
        }
    }
}

impl FinancialDatasetsAdapter {
    pub fn new(api_key: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            http_client,
        }
    }

    fn parse_item(item: &Value, ticker: &Symbol, req: &FetchRequest) -> Option<SellRecord> {
        let acq_disp = str_field(
            item,
            &["acquired_disposed", "acquiredDisposedCode", "transaction_type"],
        )
        .unwrap_or("")
        .to_ascii_uppercase();
        if !matches!(acq_disp.as_str(), "D" | "DISPOSED" | "S" | "SALE") {
            return None;
        }

        let shares = f64_field(item, &["shares", "shares_traded", "numberOfShares"])?;
        let tx_date = date_field(item, &["transaction_date", "periodOfReport", "filing_date"])?;
        if !req.contains(tx_date) {
            return None;
        }

        SellRecord::new(
            ticker.clone(),
            str_field(item, &["company_name", "issuer"]).map(str::to_owned),
            str_field(item, &["insider_name", "name"]).map(str::to_owned),
            str_field(item, &["title", "relationship", "officerTitle"]).map(str::to_owned),
            tx_date,
            date_field(item, &["filing_date", "filedAt"]),
            shares,
            f64_field(item, &["value", "value_usd", "valueUsd"]),
            ProviderId::FinancialDatasets,
        )
        .ok()
    }
}

impl InsiderSource for FinancialDatasetsAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::FinancialDatasets
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
                return Err(SourceError::unavailable(
                    "financial_datasets api key not configured",
                ));
            };
            let Some(ticker) = req.ticker.clone() else {
                return Err(SourceError::invalid_request(
                    "financial_datasets only supports per-ticker queries",
                ));
            };

            let endpoint = format!(
                "{FD_BASE}/insider-trades?ticker={}&limit=500&filing_date_gte={}&filing_date_lte={}",
                urlencoding::encode(ticker.as_str()),
                format_iso_date(req.date_from),
                format_iso_date(req.date_to),
            );

            let request = HttpRequest::get(endpoint).with_auth(&HttpAuth::Header {
                name: String::from("x-api-key"),
                value: api_key.to_owned(),
            });

            let response = self.http_client.execute(request).await.map_err(|e| {
                SourceError::unavailable(format!(
                    "financial_datasets transport error: {}",
                    e.message()
                ))
            })?;

            if response.status == 429 {
                return Err(SourceError::rate_limited("financial_datasets quota exhausted"));
            }
            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "financial_datasets upstream returned status {}",
                    response.status
                )));
            }

            let payload: Value = serde_json::from_str(&response.body).map_err(|e| {
                SourceError::unavailable(format!("financial_datasets decode error: {e}"))
            })?;

            let records: Vec<SellRecord> =
                item_list(&payload, &["insider_trades", "data", "trades"])
                    .iter()
                    .filter_map(|item| Self::parse_item(item, &ticker, &req))
                    .collect();

            tracing::debug!(
                source = "financial_datasets",
                ticker = ticker.as_str(),
                count = records.len(),
                "fetched insider sells"
            );
            Ok(records)
        })
    }
}
