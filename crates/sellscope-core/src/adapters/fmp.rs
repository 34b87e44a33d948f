use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::adapters::{date_field, f64_field, item_list, str_field};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::provider::{FetchRequest, InsiderSource, SourceError, SourceTraits};
use crate::{ProviderId, SellRecord, Symbol};

const FMP_BASE: &str = "https://financialmodelingprep.com/stable";

/// Financial Modeling Prep insider-trading adapter.
///
/// The only source that also supports a global "latest across all symbols"
/// query, used to pick up disposals for tickers outside the configured
/// universe. Free tier allows 250 calls/day, surfaced as a 25-ticker cap.
#[derive(Clone)]
pub struct FmpAdapter {
    api_key: Option<String>,
    http_client: Arc<dyn HttpClient>,
    free_tier: bool,
}

impl Default for FmpAdapter {
    fn default() -> Self {
        Self {
            api_key: None,
            http_client: Arc::new(NoopHttpClient),
            free_tier: true,
        }
    }
}

impl FmpAdapter {
    pub fn new(api_key: impl Into<String>, http_client: Arc<dyn HttpClient>, free_tier: bool) -> Self {
        Self {
            api_key: Some(api_key.into()),
            http_client,
            free_tier,
        }
    }

    fn endpoint(&self, req: &FetchRequest, api_key: &str) -> String {
        match &req.ticker {
            Some(ticker) => format!(
                "{FMP_BASE}/insider-trading/search?symbol={}&page=0&limit=100&apikey={}",
                urlencoding::encode(ticker.as_str()),
                urlencoding::encode(api_key)
            ),
            None => format!(
                "{FMP_BASE}/insider-trading/latest?page=0&limit=200&apikey={}",
                urlencoding::encode(api_key)
            ),
        }
    }

    fn parse_item(item: &Value, req: &FetchRequest) -> Option<SellRecord> {
        // FMP marks sales as transactionType S (or D), with an
        // acquisition/disposition flag on newer payloads.
        let trans_type = str_field(item, &["transactionType", "type"])
            .unwrap_or("")
            .to_ascii_uppercase();
        let acq_disp = str_field(item, &["acquisitionOrDisposition", "acquiredDisposedCode"])
            .unwrap_or("")
            .to_ascii_uppercase();
        let is_sell = matches!(trans_type.as_str(), "S" | "D")
            || acq_disp == "D"
            || trans_type.contains("SALE");
        if !is_sell {
            return None;
        }

        let raw_symbol = str_field(item, &["symbol", "ticker"])
            .map(str::to_owned)
            .or_else(|| req.ticker.as_ref().map(|t| t.as_str().to_owned()))?;
        let ticker = Symbol::parse(&raw_symbol).ok()?;

        let tx_date = date_field(item, &["transactionDate", "periodOfReport", "filingDate"])?;
        if !req.contains(tx_date) {
            return None;
        }

        let shares = f64_field(item, &["numberOfShares", "shares"])?;
        let value = f64_field(item, &["value", "valueUsd"]);

        SellRecord::new(
            ticker,
            str_field(item, &["companyName"]).map(str::to_owned),
            str_field(item, &["reportingName"]).map(str::to_owned),
            str_field(item, &["typeOfOwner"]).map(str::to_owned),
            tx_date,
            date_field(item, &["filingDate", "filedAt"]),
            shares,
            value,
            ProviderId::Fmp,
        )
        .ok()
    }
}

impl InsiderSource for FmpAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Fmp
    }

    fn traits(&self) -> SourceTraits {
        SourceTraits {
            per_ticker: true,
            global_latest: true,
            ticker_cap: if self.free_tier { Some(25) } else { None },
        }
    }

    fn fetch<'a>(
        &'a self,
        req: FetchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SellRecord>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(api_key) = self.api_key.as_deref() else {
                return Err(SourceError::unavailable("fmp api key not configured"));
            };

            let request = HttpRequest::get(self.endpoint(&req, api_key));
            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|e| SourceError::unavailable(format!("fmp transport error: {}", e.message())))?;

            if response.status == 429 {
                return Err(SourceError::rate_limited("fmp daily api limit reached"));
            }
            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "fmp upstream returned status {}",
                    response.status
                )));
            }

            let payload: Value = serde_json::from_str(&response.body)
                .map_err(|e| SourceError::unavailable(format!("fmp decode error: {e}")))?;

            if let Some(message) = payload.get("Error Message").and_then(Value::as_str) {
                return Err(SourceError::unavailable(format!("fmp api error: {message}")));
            }

            let records: Vec<SellRecord> = item_list(&payload, &["data", "insider_trading"])
                .iter()
                .filter_map(|item| Self::parse_item(item, &req))
                .collect();

            tracing::debug!(
                source = "fmp",
                ticker = req.ticker.as_ref().map(|t| t.as_str()),
                count = records.len(),
                "fetched insider sells"
            );
            Ok(records)
        })
    }
}
