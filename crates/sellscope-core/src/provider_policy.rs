use std::time::Duration;

use crate::ProviderId;

/// Per-provider fan-out limits.
///
/// `quota_window`/`quota_limit` mirror the upstream plan's documented rate
/// limits; `ticker_cap` is the free-tier constraint surfaced through
/// `SourceTraits` so the aggregator can shrink its ticker list instead of
/// burning the daily budget on the first run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub max_concurrency: usize,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub call_timeout: Duration,
    pub ticker_cap: Option<usize>,
}

impl ProviderPolicy {
    /// FMP free tier: 250 calls/day. One call per ticker plus one global
    /// "latest" call, so cap fan-out at 25 tickers per run.
    pub fn fmp_free_tier() -> Self {
        Self {
            provider_id: ProviderId::Fmp,
            max_concurrency: 4,
            quota_window: Duration::from_secs(86_400),
            quota_limit: 250,
            call_timeout: Duration::from_secs(30),
            ticker_cap: Some(25),
        }
    }

    pub fn fmp_paid() -> Self {
        Self {
            ticker_cap: None,
            quota_limit: 3_000,
            quota_window: Duration::from_secs(60),
            ..Self::fmp_free_tier()
        }
    }

    pub fn sec_api_default() -> Self {
        Self {
            provider_id: ProviderId::SecApi,
            max_concurrency: 4,
            quota_window: Duration::from_secs(60),
            quota_limit: 100,
            call_timeout: Duration::from_secs(30),
            ticker_cap: None,
        }
    }

    pub fn eodhd_default() -> Self {
        Self {
            provider_id: ProviderId::Eodhd,
            max_concurrency: 4,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            call_timeout: Duration::from_secs(30),
            ticker_cap: None,
        }
    }

    pub fn financial_datasets_default() -> Self {
        Self {
            provider_id: ProviderId::FinancialDatasets,
            max_concurrency: 4,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            call_timeout: Duration::from_secs(30),
            ticker_cap: None,
        }
    }

    pub fn default_for(provider_id: ProviderId, fmp_free_tier: bool) -> Self {
        match provider_id {
            ProviderId::Fmp if fmp_free_tier => Self::fmp_free_tier(),
            ProviderId::Fmp => Self::fmp_paid(),
            ProviderId::SecApi => Self::sec_api_default(),
            ProviderId::Eodhd => Self::eodhd_default(),
            ProviderId::FinancialDatasets => Self::financial_datasets_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmp_free_tier_caps_tickers() {
        let policy = ProviderPolicy::fmp_free_tier();
        assert_eq!(policy.ticker_cap, Some(25));
        assert_eq!(policy.quota_limit, 250);
        assert_eq!(policy.quota_window, Duration::from_secs(86_400));
    }

    #[test]
    fn paid_fmp_is_uncapped() {
        assert_eq!(ProviderPolicy::fmp_paid().ticker_cap, None);
        assert_eq!(
            ProviderPolicy::default_for(ProviderId::Fmp, true).ticker_cap,
            Some(25)
        );
    }
}
