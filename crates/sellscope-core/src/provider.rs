//! Provider contract for insider-sell sources.
//!
//! Every upstream API is wrapped by one adapter implementing
//! [`InsiderSource`]. The contract encodes the error policy from the top of
//! the stack down:
//!
//! - a malformed upstream *item* is dropped inside the adapter and never
//!   surfaces;
//! - a failed upstream *call* returns a typed [`SourceError`] which the
//!   aggregator absorbs into an empty result, keeping rate-limit conditions
//!   distinguishable for fail-over decisions.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::Date;

use crate::{ProviderId, Symbol};

/// Capability and constraint matrix for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTraits {
    /// Supports `fetch` with a concrete ticker.
    pub per_ticker: bool,
    /// Supports a global "latest across all symbols" query (ticker absent).
    pub global_latest: bool,
    /// Hard free-tier constraint: maximum tickers worth fanning out per run.
    /// `None` means unconstrained.
    pub ticker_cap: Option<usize>,
}

impl SourceTraits {
    pub const fn per_ticker_only() -> Self {
        Self {
            per_ticker: true,
            global_latest: false,
            ticker_cap: None,
        }
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Network, decode or upstream-status failure.
    Unavailable,
    /// Upstream quota exhausted; recoverable by failing over or waiting.
    RateLimited,
    /// The caller built a request the source cannot serve.
    InvalidRequest,
    /// Bug-shaped condition inside the adapter.
    Internal,
}

/// Structured error returned by a provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for an insider-sell fetch.
///
/// `ticker` is absent for the global "latest" form, which only sources with
/// `SourceTraits::global_latest` accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticker: Option<Symbol>,
    pub date_from: Date,
    pub date_to: Date,
}

impl FetchRequest {
    pub fn per_ticker(ticker: Symbol, date_from: Date, date_to: Date) -> Result<Self, SourceError> {
        Self::validated(Some(ticker), date_from, date_to)
    }

    pub fn global_latest(date_from: Date, date_to: Date) -> Result<Self, SourceError> {
        Self::validated(None, date_from, date_to)
    }

    fn validated(
        ticker: Option<Symbol>,
        date_from: Date,
        date_to: Date,
    ) -> Result<Self, SourceError> {
        if date_from > date_to {
            return Err(SourceError::invalid_request(
                "fetch request date_from must not be after date_to",
            ));
        }
        Ok(Self {
            ticker,
            date_from,
            date_to,
        })
    }

    /// True when `date` falls inside the requested range.
    pub fn contains(&self, date: Date) -> bool {
        date >= self.date_from && date <= self.date_to
    }
}

type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<crate::SellRecord>, SourceError>> + Send + 'a>>;

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; each `fetch` call is an
/// independent unit of work with no shared mutable state, which is what
/// makes the aggregator fan-out safely parallel.
pub trait InsiderSource: Send + Sync {
    /// Unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Capability and free-tier constraint matrix.
    fn traits(&self) -> SourceTraits;

    /// Fetch normalized sell records for the request.
    ///
    /// Returned records are guaranteed to be genuine disposals (each
    /// adapter filters on its own source vocabulary), to have
    /// `shares_sold > 0`, and to fall inside the requested date range.
    fn fetch<'a>(&'a self, req: FetchRequest) -> FetchFuture<'a>;
}
