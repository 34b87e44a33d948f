//! S&P 500 ticker universe.
//!
//! Resolution order: the FMP constituents endpoint when a key is present,
//! then a public CSV mirror. The universe is a boundary collaborator, so
//! failure degrades to an empty list rather than an error; callers treat
//! an empty universe as fatal at the aggregation step.

use std::sync::Arc;

use serde_json::Value;

use crate::adapters::str_field;
use crate::http_client::{HttpClient, HttpRequest};
use crate::Symbol;

const FMP_CONSTITUENTS_URL: &str =
    "https://financialmodelingprep.com/stable/sp500-constituent?apikey=";
const CSV_FALLBACK_URL: &str = "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/master/data/constituents.csv";

pub struct UniverseLoader {
    http_client: Arc<dyn HttpClient>,
    fmp_api_key: Option<String>,
}

impl UniverseLoader {
    pub fn new(http_client: Arc<dyn HttpClient>, fmp_api_key: Option<String>) -> Self {
        Self {
            http_client,
            fmp_api_key,
        }
    }

    /// Resolve the universe, preserving upstream order.
    pub async fn load(&self) -> Vec<Symbol> {
        if let Some(key) = self.fmp_api_key.as_deref() {
            let from_fmp = self.load_from_fmp(key).await;
            if !from_fmp.is_empty() {
                return from_fmp;
            }
            tracing::warn!("fmp constituents endpoint yielded nothing, trying csv fallback");
        }
        self.load_from_csv().await
    }

    async fn load_from_fmp(&self, api_key: &str) -> Vec<Symbol> {
        let url = format!("{FMP_CONSTITUENTS_URL}{}", urlencoding::encode(api_key));
        let Some(body) = self.fetch_body(url).await else {
            return Vec::new();
        };
        let Ok(payload) = serde_json::from_str::<Value>(&body) else {
            return Vec::new();
        };
        let Some(items) = payload.as_array() else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| str_field(item, &["symbol", "ticker"]))
            .filter_map(|raw| Symbol::parse(raw).ok())
            .collect()
    }

    /// Hand-rolled CSV scan: header row `Symbol,Name,Sector`, symbol in
    /// the first column, no quoting in that column upstream.
    async fn load_from_csv(&self) -> Vec<Symbol> {
        let Some(body) = self.fetch_body(CSV_FALLBACK_URL.to_owned()).await else {
            return Vec::new();
        };

        body.lines()
            .skip(1)
            .filter_map(|line| line.split(',').next())
            .filter_map(|raw| Symbol::parse(raw).ok())
            .collect()
    }

    async fn fetch_body(&self, url: String) -> Option<String> {
        match self.http_client.execute(HttpRequest::get(url)).await {
            Ok(response) if response.is_success() => Some(response.body),
            Ok(response) => {
                tracing::warn!(status = response.status, "universe fetch rejected");
                None
            }
            Err(error) => {
                tracing::warn!(error = error.message(), "universe fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::StaticHttpClient;

    #[tokio::test]
    async fn parses_fmp_constituents() {
        let client = Arc::new(StaticHttpClient::with_json(
            r#"[{"symbol": "AAPL"}, {"symbol": "MSFT"}, {"symbol": ""}]"#,
        ));
        let loader = UniverseLoader::new(client, Some(String::from("key")));

        let universe = loader.load().await;
        assert_eq!(universe.len(), 2);
        assert_eq!(universe[0].as_str(), "AAPL");
    }

    #[tokio::test]
    async fn falls_back_to_csv_without_key() {
        let client = Arc::new(StaticHttpClient::with_json(
            "Symbol,Name,Sector\nNVDA,NVIDIA,Technology\nBRK-B,Berkshire,Financials\n",
        ));
        let loader = UniverseLoader::new(client, None);

        let universe = loader.load().await;
        assert_eq!(universe.len(), 2);
        assert_eq!(universe[1].as_str(), "BRK-B");
    }

    #[tokio::test]
    async fn failure_degrades_to_empty() {
        let client = Arc::new(StaticHttpClient::with_responses(vec![Ok(
            crate::http_client::HttpResponse::with_status(500, "nope"),
        )]));
        let loader = UniverseLoader::new(client, None);
        assert!(loader.load().await.is_empty());
    }
}
