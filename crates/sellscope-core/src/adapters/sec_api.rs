use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Value};
use time::Date;

use crate::adapters::{date_field, f64_field, str_field};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, NoopHttpClient};
use crate::provider::{FetchRequest, InsiderSource, SourceError, SourceTraits};
use crate::{ProviderId, SellRecord, Symbol};

const SEC_API_BASE: &str = "https://api.sec-api.io";

/// SEC-API.io adapter reading insider activity from Form 3/4/5 filings.
///
/// A single filing can carry several transactions across the
/// non-derivative and derivative tables; each disposed transaction becomes
/// its own record.
#[derive(Clone)]
pub struct SecApiAdapter {
    api_key: Option<String>,
    http_client: Arc<dyn HttpClient>,
}

impl Default for SecApiAdapter {
    fn default() -> Self {
        Self {
            api_key: None,
            http_client: Arc::new(NoopHttpClient),
        }
    }
}

impl SecApiAdapter {
    pub fn new(api_key: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            http_client,
        }
    }

    fn query_payload(req: &FetchRequest, ticker: &Symbol) -> String {
        let query = format!(
            "issuer.tradingSymbol:{} AND periodOfReport:[{} TO {}]",
            ticker.as_str(),
            crate::domain::dates::format_iso_date(req.date_from),
            crate::domain::dates::format_iso_date(req.date_to),
        );
        json!({
            "query": query,
            "from": "0",
            "size": "50",
            "sort": [{"filedAt": {"order": "desc"}}],
        })
        .to_string()
    }

    /// Owner role from the filing's relationship block.
    fn role_from_relationship(reporting: &Value) -> Option<String> {
        let rel = reporting.get("relationship")?;
        let truthy = |key: &str| rel.get(key).and_then(Value::as_bool).unwrap_or(false);

        if truthy("isDirector") {
            Some(String::from("Director"))
        } else if truthy("isOfficer") {
            Some(
                str_field(reporting, &["officerTitle"])
                    .unwrap_or("Officer")
                    .to_owned(),
            )
        } else if truthy("isTenPercentOwner") {
            Some(String::from("10% Owner"))
        } else if truthy("isOther") {
            Some(str_field(rel, &["otherText"]).unwrap_or("Other").to_owned())
        } else {
            None
        }
    }

    /// Extract every disposed transaction from one filing.
    fn records_from_filing(filing: &Value, req: &FetchRequest) -> Vec<SellRecord> {
        let mut records = Vec::new();

        let issuer = filing.get("issuer").cloned().unwrap_or(Value::Null);
        let Some(ticker) = str_field(&issuer, &["tradingSymbol"])
            .and_then(|raw| Symbol::parse(raw).ok())
        else {
            return records;
        };
        let company_name = str_field(&issuer, &["name"]).map(str::to_owned);

        let reporting = filing.get("reportingOwner").cloned().unwrap_or(Value::Null);
        let insider_name = str_field(&reporting, &["name"]).map(str::to_owned);
        let role = Self::role_from_relationship(&reporting);

        let filed_at = date_field(filing, &["filedAt"]);
        let period = date_field(filing, &["periodOfReport"]);

        let mut tables: Vec<&Value> = Vec::new();
        if let Some(nd) = filing.get("nonDerivativeTable") {
            if let Some(txns) = nd.get("transactions").or_else(|| nd.get("holdings")) {
                tables.push(txns);
            }
        }
        let mut derivative_txns: Vec<Value> = Vec::new();
        if let Some(holdings) = filing
            .get("derivativeTable")
            .and_then(|der| der.get("holdings"))
            .and_then(Value::as_array)
        {
            for holding in holdings {
                if let Some(txns) = holding.get("transactions") {
                    derivative_txns.push(txns.clone());
                }
            }
        }
        tables.extend(derivative_txns.iter());

        for table in tables {
            let Some(transactions) = table.as_array() else {
                continue;
            };
            for txn in transactions {
                if let Some(record) = Self::record_from_transaction(
                    txn,
                    &ticker,
                    company_name.as_deref(),
                    insider_name.as_deref(),
                    role.as_deref(),
                    filed_at,
                    period,
                    req,
                ) {
                    records.push(record);
                }
            }
        }

        records
    }

    #[allow(clippy::too_many_arguments)]
    fn record_from_transaction(
        txn: &Value,
        ticker: &Symbol,
        company_name: Option<&str>,
        insider_name: Option<&str>,
        role: Option<&str>,
        filed_at: Option<Date>,
        period: Option<Date>,
        req: &FetchRequest,
    ) -> Option<SellRecord> {
        let amounts = txn.get("amounts")?;
        let acq_disp = str_field(amounts, &["acquiredDisposedCode"])
            .unwrap_or("")
            .to_ascii_uppercase();
        if acq_disp != "D" {
            return None;
        }

        let shares = f64_field(amounts, &["shares"])?;
        let value = f64_field(amounts, &["pricePerShare"]).map(|price| price * shares);

        let tx_date = date_field(amounts, &["transactionDate"])
            .or(period)
            .or(filed_at)?;
        if !req.contains(tx_date) {
            return None;
        }

        SellRecord::new(
            ticker.clone(),
            company_name.map(str::to_owned),
            insider_name.map(str::to_owned),
            role.map(str::to_owned),
            tx_date,
            filed_at,
            shares,
            value,
            ProviderId::SecApi,
        )
        .ok()
    }
}

impl InsiderSource for SecApiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::SecApi
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
                return Err(SourceError::unavailable("sec_api key not configured"));
            };
            let Some(ticker) = req.ticker.clone() else {
                return Err(SourceError::invalid_request(
                    "sec_api only supports per-ticker queries",
                ));
            };

            let request = HttpRequest::post(format!(
                "{SEC_API_BASE}/insider-trading?token={}",
                urlencoding::encode(api_key)
            ))
            .with_json_body(Self::query_payload(&req, &ticker))
            .with_auth(&HttpAuth::Header {
                name: String::from("authorization"),
                value: api_key.to_owned(),
            });

            let response = self.http_client.execute(request).await.map_err(|e| {
                SourceError::unavailable(format!("sec_api transport error: {}", e.message()))
            })?;

            if response.status == 429 {
                return Err(SourceError::rate_limited("sec_api quota exhausted"));
            }
            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "sec_api upstream returned status {}",
                    response.status
                )));
            }

            let payload: Value = serde_json::from_str(&response.body)
                .map_err(|e| SourceError::unavailable(format!("sec_api decode error: {e}")))?;

            let records: Vec<SellRecord> = payload
                .get("transactions")
                .and_then(Value::as_array)
                .map(|filings| {
                    filings
                        .iter()
                        .flat_map(|filing| Self::records_from_filing(filing, &req))
                        .collect()
                })
                .unwrap_or_default();

            tracing::debug!(
                source = "sec_api",
                ticker = ticker.as_str(),
                count = records.len(),
                "fetched insider sells"
            );
            Ok(records)
        })
    }
}
