//! Runtime configuration.
//!
//! Keys are read per provider; an absent key disables that provider rather
//! than failing the run. Environment variables are checked with the
//! `SELLSCOPE_` prefix first, then unprefixed, so both
//! `SELLSCOPE_FMP_API_KEY` and plain `FMP_API_KEY` work.

use crate::{ProviderId, SignalConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub fmp_api_key: Option<String>,
    pub sec_api_key: Option<String>,
    pub eodhd_api_key: Option<String>,
    pub financial_datasets_api_key: Option<String>,
    /// Apply the FMP free-tier fan-out cap (250 calls/day, 25 tickers).
    pub fmp_free_tier: bool,
    pub signal: SignalConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            fmp_api_key: None,
            sec_api_key: None,
            eodhd_api_key: None,
            financial_datasets_api_key: None,
            fmp_free_tier: true,
            signal: SignalConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        Self {
            fmp_api_key: env_key("FMP_API_KEY"),
            sec_api_key: env_key("SEC_API_KEY"),
            eodhd_api_key: env_key("EODHD_API_KEY"),
            financial_datasets_api_key: env_key("FINANCIAL_DATASETS_API_KEY"),
            fmp_free_tier: env_key("FMP_FREE_TIER")
                .map(|raw| !matches!(raw.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            signal: SignalConfig::default(),
        }
    }

    pub fn api_key_for(&self, id: ProviderId) -> Option<&str> {
        match id {
            ProviderId::Fmp => self.fmp_api_key.as_deref(),
            ProviderId::SecApi => self.sec_api_key.as_deref(),
            ProviderId::Eodhd => self.eodhd_api_key.as_deref(),
            ProviderId::FinancialDatasets => self.financial_datasets_api_key.as_deref(),
        }
    }

    /// Providers with a key configured, in canonical priority order.
    pub fn enabled_sources(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.api_key_for(*id).is_some())
            .collect()
    }
}

/// Prefixed env var with unprefixed fallback; empty values count as absent.
fn env_key(name: &str) -> Option<String> {
    let prefixed = format!("SELLSCOPE_{name}");
    [prefixed.as_str(), name]
        .iter()
        .filter_map(|candidate| std::env::var(candidate).ok())
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
}
