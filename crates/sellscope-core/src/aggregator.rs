//! Multi-source fan-out and cross-source deduplication.
//!
//! The aggregator fans `(source, ticker)` fetches out over a bounded
//! tokio task set, then merges results back in canonical order so that
//! deduplication is deterministic no matter which call finished first.
//! Provider failures degrade to empty slices and are reported out of band
//! in [`AggregateReport::failures`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use time::Date;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::adapters::{EodhdAdapter, FinancialDatasetsAdapter, FmpAdapter, SecApiAdapter};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::provider::{FetchRequest, InsiderSource, SourceError};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::ThrottleGate;
use crate::{ProviderId, SellRecord, Symbol, TrackerConfig};

/// Batch-level tunables; per-provider quotas live in [`ProviderPolicy`].
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub max_concurrency: usize,
    pub call_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Conditions that make a whole batch impossible, as opposed to the
/// per-call failures the report carries.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("no insider-sell sources are configured")]
    NoSourcesConfigured,
    #[error("ticker universe is empty")]
    EmptyUniverse,
}

/// One absorbed provider failure. `ticker` is `None` for the global
/// "latest" fetch.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: ProviderId,
    pub ticker: Option<Symbol>,
    pub error: SourceError,
}

/// Outcome of one aggregation batch.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    /// Deduplicated records, in canonical (provider, ticker) merge order.
    pub records: Vec<SellRecord>,
    /// Surviving records per source, after dedup.
    pub source_counts: BTreeMap<ProviderId, usize>,
    pub duplicates_removed: usize,
    pub failures: Vec<SourceFailure>,
}

/// Exact-match dedup identity. Float shares compare bitwise: two sources
/// reporting 1500.0 collide, 1500.0 vs 1500.5 do not.
#[derive(PartialEq, Eq, Hash)]
struct DedupKey(String, Date, String, u64);

impl DedupKey {
    fn of(record: &SellRecord) -> Self {
        Self(
            record.ticker.as_str().to_owned(),
            record.transaction_date,
            record
                .insider_name
                .as_deref()
                .unwrap_or_default()
                .to_owned(),
            record.shares_sold.to_bits(),
        )
    }
}

enum SlotOutcome {
    Records(Vec<SellRecord>),
    Failed(SourceError),
}

pub struct Aggregator {
    sources: Vec<Arc<dyn InsiderSource>>,
    config: AggregatorConfig,
    gates: HashMap<ProviderId, ThrottleGate>,
}

impl Aggregator {
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::default()
    }

    /// Fetch, merge and deduplicate insider sells for `tickers` over the
    /// inclusive `[date_from, date_to]` range.
    pub async fn aggregate(
        &self,
        tickers: &[Symbol],
        date_from: Date,
        date_to: Date,
    ) -> Result<AggregateReport, AggregateError> {
        if self.sources.is_empty() {
            return Err(AggregateError::NoSourcesConfigured);
        }
        if tickers.is_empty() {
            return Err(AggregateError::EmptyUniverse);
        }

        let plan = self.build_plan(tickers, date_from, date_to);
        let outcomes = self.run_plan(&plan).await;
        Ok(self.merge(&plan, outcomes))
    }

    /// Fetch slots in canonical order: providers in priority order, and
    /// within a provider the global slot first, then tickers as given.
    fn build_plan(
        &self,
        tickers: &[Symbol],
        date_from: Date,
        date_to: Date,
    ) -> Vec<(Arc<dyn InsiderSource>, FetchRequest)> {
        let mut plan = Vec::new();

        for source in &self.sources {
            let traits = source.traits();

            if traits.global_latest {
                if let Ok(req) = FetchRequest::global_latest(date_from, date_to) {
                    plan.push((Arc::clone(source), req));
                }
            }
            if !traits.per_ticker {
                continue;
            }

            let capped = match traits.ticker_cap {
                Some(cap) => &tickers[..tickers.len().min(cap)],
                None => tickers,
            };
            for ticker in capped {
                if let Ok(req) = FetchRequest::per_ticker(ticker.clone(), date_from, date_to) {
                    plan.push((Arc::clone(source), req));
                }
            }
        }

        plan
    }

    async fn run_plan(
        &self,
        plan: &[(Arc<dyn InsiderSource>, FetchRequest)],
    ) -> Vec<SlotOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks: JoinSet<(usize, SlotOutcome)> = JoinSet::new();

        for (slot, (source, req)) in plan.iter().enumerate() {
            let source = Arc::clone(source);
            let req = req.clone();
            let semaphore = Arc::clone(&semaphore);
            let gate = self.gates.get(&source.id()).cloned();
            let timeout = self.config.call_timeout;

            tasks.spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            slot,
                            SlotOutcome::Failed(SourceError::internal("fan-out semaphore closed")),
                        )
                    }
                };

                if let Some(gate) = &gate {
                    if !gate.try_acquire() {
                        return (
                            slot,
                            SlotOutcome::Failed(SourceError::rate_limited(format!(
                                "{} local quota gate denied the call",
                                source.id()
                            ))),
                        );
                    }
                }

                let outcome = match tokio::time::timeout(timeout, source.fetch(req)).await {
                    Ok(Ok(records)) => SlotOutcome::Records(records),
                    Ok(Err(error)) => SlotOutcome::Failed(error),
                    Err(_) => SlotOutcome::Failed(SourceError::unavailable(format!(
                        "{} call timed out after {}s",
                        source.id(),
                        timeout.as_secs()
                    ))),
                };
                (slot, outcome)
            });
        }

        let mut outcomes: Vec<Option<SlotOutcome>> = Vec::new();
        outcomes.resize_with(plan.len(), || None);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, outcome)) => outcomes[slot] = Some(outcome),
                Err(join_error) => {
                    tracing::warn!(error = %join_error, "aggregation task panicked");
                }
            }
        }

        outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| {
                    SlotOutcome::Failed(SourceError::internal("fetch task vanished"))
                })
            })
            .collect()
    }

    /// Sequential merge in plan order. First occurrence of a dedup key
    /// wins, so provider priority decides which copy survives.
    fn merge(
        &self,
        plan: &[(Arc<dyn InsiderSource>, FetchRequest)],
        outcomes: Vec<SlotOutcome>,
    ) -> AggregateReport {
        let mut report = AggregateReport::default();
        let mut seen: HashSet<DedupKey> = HashSet::new();

        for ((source, req), outcome) in plan.iter().zip(outcomes) {
            match outcome {
                SlotOutcome::Records(records) => {
                    for record in records {
                        if seen.insert(DedupKey::of(&record)) {
                            *report.source_counts.entry(record.source).or_insert(0) += 1;
                            report.records.push(record);
                        } else {
                            report.duplicates_removed += 1;
                        }
                    }
                }
                SlotOutcome::Failed(error) => {
                    tracing::warn!(
                        source = %source.id(),
                        ticker = req.ticker.as_ref().map(|t| t.as_str()),
                        error = %error,
                        "provider call failed, degrading to empty result"
                    );
                    report.failures.push(SourceFailure {
                        source: source.id(),
                        ticker: req.ticker.clone(),
                        error,
                    });
                }
            }
        }

        report
    }
}

/// Builds an [`Aggregator`] from configured keys, skipping keyless
/// providers. Tests inject sources directly via [`with_source`].
///
/// [`with_source`]: AggregatorBuilder::with_source
#[derive(Default)]
pub struct AggregatorBuilder {
    sources: Vec<Arc<dyn InsiderSource>>,
    config: AggregatorConfig,
    policies: Vec<ProviderPolicy>,
}

impl AggregatorBuilder {
    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_source(mut self, source: Arc<dyn InsiderSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Wire up production adapters for every provider with a key.
    pub fn from_tracker_config(mut self, config: &TrackerConfig) -> Self {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

        for id in ProviderId::ALL {
            let Some(key) = config.api_key_for(id) else {
                continue;
            };
            let source: Arc<dyn InsiderSource> = match id {
                ProviderId::Fmp => Arc::new(FmpAdapter::new(
                    key,
                    Arc::clone(&http),
                    config.fmp_free_tier,
                )),
                ProviderId::SecApi => Arc::new(SecApiAdapter::new(key, Arc::clone(&http))),
                ProviderId::Eodhd => Arc::new(EodhdAdapter::new(key, Arc::clone(&http))),
                ProviderId::FinancialDatasets => {
                    Arc::new(FinancialDatasetsAdapter::new(key, Arc::clone(&http)))
                }
            };
            self.sources.push(source);
            self.policies
                .push(ProviderPolicy::default_for(id, config.fmp_free_tier));
        }
        self
    }

    pub fn build(mut self) -> Aggregator {
        // Canonical priority order regardless of insertion order.
        self.sources
            .sort_by_key(|source| ProviderId::ALL.iter().position(|id| *id == source.id()));

        let gates = self
            .policies
            .iter()
            .map(|policy| (policy.provider_id, ThrottleGate::from_policy(policy)))
            .collect();

        Aggregator {
            sources: self.sources,
            config: self.config,
            gates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SourceTraits;
    use std::future::Future;
    use std::pin::Pin;
    use time::macros::date;

    struct FixedSource {
        id: ProviderId,
        traits: SourceTraits,
        records: Vec<SellRecord>,
    }

    impl InsiderSource for FixedSource {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn traits(&self) -> SourceTraits {
            self.traits
        }

        fn fetch<'a>(
            &'a self,
            _req: FetchRequest,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<SellRecord>, SourceError>> + Send + 'a>>
        {
            let records = self.records.clone();
            Box::pin(async move { Ok(records) })
        }
    }

    fn record(source: ProviderId, insider: &str, shares: f64) -> SellRecord {
        SellRecord::new(
            Symbol::parse("AAPL").unwrap(),
            None,
            Some(insider.to_owned()),
            None,
            date!(2024 - 03 - 01),
            None,
            shares,
            None,
            source,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn empty_universe_is_fatal() {
        let aggregator = Aggregator::builder()
            .with_source(Arc::new(FixedSource {
                id: ProviderId::Eodhd,
                traits: SourceTraits::per_ticker_only(),
                records: vec![],
            }))
            .build();

        let err = aggregator
            .aggregate(&[], date!(2024 - 01 - 01), date!(2024 - 06 - 01))
            .await
            .expect_err("must fail");
        assert!(matches!(err, AggregateError::EmptyUniverse));
    }

    #[tokio::test]
    async fn higher_priority_source_wins_duplicates() {
        let aggregator = Aggregator::builder()
            .with_source(Arc::new(FixedSource {
                id: ProviderId::Eodhd,
                traits: SourceTraits::per_ticker_only(),
                records: vec![record(ProviderId::Eodhd, "COOK TIMOTHY D", 1500.0)],
            }))
            .with_source(Arc::new(FixedSource {
                id: ProviderId::SecApi,
                traits: SourceTraits::per_ticker_only(),
                records: vec![record(ProviderId::SecApi, "COOK TIMOTHY D", 1500.0)],
            }))
            .build();

        let report = aggregator
            .aggregate(
                &[Symbol::parse("AAPL").unwrap()],
                date!(2024 - 01 - 01),
                date!(2024 - 06 - 01),
            )
            .await
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].source, ProviderId::SecApi);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.source_counts.get(&ProviderId::SecApi), Some(&1));
    }

    #[tokio::test]
    async fn ticker_cap_limits_fan_out() {
        let source = Arc::new(FixedSource {
            id: ProviderId::Fmp,
            traits: SourceTraits {
                per_ticker: true,
                global_latest: false,
                ticker_cap: Some(2),
            },
            records: vec![],
        });
        let aggregator = Aggregator::builder().with_source(source).build();

        let tickers: Vec<Symbol> = ["AAPL", "MSFT", "NVDA", "TSLA"]
            .iter()
            .map(|t| Symbol::parse(t).unwrap())
            .collect();
        let plan = aggregator.build_plan(&tickers, date!(2024 - 01 - 01), date!(2024 - 06 - 01));
        assert_eq!(plan.len(), 2);
    }
}
