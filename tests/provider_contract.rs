//! Contract tests every provider adapter must satisfy.
//!
//! These tests verify the shared adapter contract: keyless adapters are
//! unavailable rather than panicking, rate limits stay distinguishable,
//! malformed payload items are dropped without failing the call, and
//! returned records honour the record invariants.

use std::sync::Arc;

use sellscope_core::http_client::{HttpResponse, StaticHttpClient};
use sellscope_core::{
    EodhdAdapter, FetchRequest, FinancialDatasetsAdapter, FmpAdapter, InsiderSource, ProviderId,
    SecApiAdapter, SourceErrorKind, Symbol,
};
use time::macros::date;

fn per_ticker_request(ticker: &str) -> FetchRequest {
    FetchRequest::per_ticker(
        Symbol::parse(ticker).expect("valid ticker"),
        date!(2024 - 01 - 01),
        date!(2024 - 12 - 31),
    )
    .expect("valid request")
}

fn all_adapters() -> Vec<Box<dyn InsiderSource>> {
    vec![
        Box::new(FmpAdapter::default()),
        Box::new(SecApiAdapter::default()),
        Box::new(EodhdAdapter::default()),
        Box::new(FinancialDatasetsAdapter::default()),
    ]
}

// =============================================================================
// Contract: identity and capability matrix
// =============================================================================

#[test]
fn every_provider_id_has_exactly_one_adapter() {
    let ids: Vec<ProviderId> = all_adapters().iter().map(|a| a.id()).collect();
    assert_eq!(ids, ProviderId::ALL.to_vec());
}

#[test]
fn only_fmp_supports_the_global_latest_query() {
    for adapter in all_adapters() {
        let traits = adapter.traits();
        assert!(traits.per_ticker, "{} must serve per-ticker", adapter.id());
        assert_eq!(traits.global_latest, adapter.id() == ProviderId::Fmp);
    }
}

#[test]
fn fmp_free_tier_caps_fan_out_at_25_tickers() {
    assert_eq!(FmpAdapter::default().traits().ticker_cap, Some(25));

    let paid = FmpAdapter::new("key", Arc::new(StaticHttpClient::with_json("[]")), false);
    assert_eq!(paid.traits().ticker_cap, None);
}

// =============================================================================
// Contract: error classification
// =============================================================================

#[tokio::test]
async fn keyless_adapters_report_unavailable_not_panic() {
    for adapter in all_adapters() {
        let result = adapter.fetch(per_ticker_request("AAPL")).await;
        let error = result.expect_err("no key must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.retryable());
    }
}

#[tokio::test]
async fn per_ticker_only_adapters_reject_global_requests() {
    let global = FetchRequest::global_latest(date!(2024 - 01 - 01), date!(2024 - 12 - 31))
        .expect("valid request");

    for adapter in [
        Box::new(SecApiAdapter::new(
            "key",
            Arc::new(StaticHttpClient::with_json("{}")),
        )) as Box<dyn InsiderSource>,
        Box::new(EodhdAdapter::new(
            "key",
            Arc::new(StaticHttpClient::with_json("[]")),
        )),
        Box::new(FinancialDatasetsAdapter::new(
            "key",
            Arc::new(StaticHttpClient::with_json("{}")),
        )),
    ] {
        let error = adapter.fetch(global.clone()).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
        assert!(!error.retryable());
    }
}

#[tokio::test]
async fn upstream_429_maps_to_rate_limited() {
    let client = Arc::new(StaticHttpClient::with_responses(vec![Ok(
        HttpResponse::with_status(429, "slow down"),
    )]));
    let adapter = EodhdAdapter::new("key", client);

    let error = adapter
        .fetch(per_ticker_request("AAPL"))
        .await
        .expect_err("429 must fail");
    assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    assert_eq!(error.code(), "source.rate_limited");
}

#[tokio::test]
async fn upstream_500_maps_to_unavailable() {
    let client = Arc::new(StaticHttpClient::with_responses(vec![Ok(
        HttpResponse::with_status(500, "boom"),
    )]));
    let adapter = FmpAdapter::new("key", client, true);

    let error = adapter
        .fetch(per_ticker_request("AAPL"))
        .await
        .expect_err("500 must fail");
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
}

// =============================================================================
// Contract: malformed payloads degrade item by item
// =============================================================================

#[tokio::test]
async fn malformed_items_are_dropped_without_failing_the_call() {
    // One good disposal, one with garbage shares, one missing its date.
    let payload = r#"[
        {"symbol": "AAPL", "transactionType": "S", "transactionDate": "2024-03-01",
         "numberOfShares": 1500, "reportingName": "COOK TIMOTHY D"},
        {"symbol": "AAPL", "transactionType": "S", "transactionDate": "2024-03-02",
         "numberOfShares": "lots"},
        {"symbol": "AAPL", "transactionType": "S", "numberOfShares": 100}
    ]"#;
    let adapter = FmpAdapter::new("key", Arc::new(StaticHttpClient::with_json(payload)), true);

    let records = adapter
        .fetch(per_ticker_request("AAPL"))
        .await
        .expect("call must succeed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].insider_name.as_deref(), Some("COOK TIMOTHY D"));
}

#[tokio::test]
async fn non_json_body_fails_the_whole_call() {
    let client = Arc::new(StaticHttpClient::with_json("<html>maintenance</html>"));
    let adapter = FinancialDatasetsAdapter::new("key", client);

    let error = adapter
        .fetch(per_ticker_request("AAPL"))
        .await
        .expect_err("html body must fail");
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
}

// =============================================================================
// Contract: returned records honour domain invariants
// =============================================================================

#[tokio::test]
async fn returned_records_are_positive_in_range_disposals() {
    let payload = r#"{"data": [
        {"code": "S", "shares": 500, "date": "2024-06-15", "ownerName": "A"},
        {"code": "P", "shares": 900, "date": "2024-06-15", "ownerName": "B"},
        {"code": "S", "shares": 700, "date": "2020-01-01", "ownerName": "C"}
    ]}"#;
    let adapter = EodhdAdapter::new("key", Arc::new(StaticHttpClient::with_json(payload)));

    let records = adapter
        .fetch(per_ticker_request("MSFT"))
        .await
        .expect("call must succeed");

    assert_eq!(records.len(), 1, "purchase and out-of-range rows dropped");
    let record = &records[0];
    assert!(record.shares_sold > 0.0);
    assert_eq!(record.source, ProviderId::Eodhd);
    assert_eq!(record.transaction_date, date!(2024 - 06 - 15));
}
