use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::dates;
use crate::{ProviderId, Symbol, ValidationError};

/// One normalized insider disposal event, from any source.
///
/// Invariants enforced at construction: `shares_sold > 0` and finite,
/// `value_usd` non-negative when present, ticker uppercase via [`Symbol`].
/// The `source` field is provenance for diagnostics only and never
/// participates in deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellRecord {
    pub ticker: Symbol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insider_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(with = "dates::iso")]
    pub transaction_date: Date,
    #[serde(default, with = "dates::iso_opt", skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<Date>,
    pub shares_sold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_usd: Option<f64>,
    pub source: ProviderId,
}

impl SellRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ticker: Symbol,
        company_name: Option<String>,
        insider_name: Option<String>,
        role: Option<String>,
        transaction_date: Date,
        filing_date: Option<Date>,
        shares_sold: f64,
        value_usd: Option<f64>,
        source: ProviderId,
    ) -> Result<Self, ValidationError> {
        if !shares_sold.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "shares_sold",
            });
        }
        if shares_sold <= 0.0 {
            return Err(ValidationError::NonPositiveShares);
        }
        if let Some(value) = value_usd {
            if !value.is_finite() {
                return Err(ValidationError::NonFiniteValue { field: "value_usd" });
            }
            if value < 0.0 {
                return Err(ValidationError::NegativeValue { field: "value_usd" });
            }
        }

        Ok(Self {
            ticker,
            company_name,
            insider_name,
            role,
            transaction_date,
            filing_date,
            shares_sold,
            value_usd,
            source,
        })
    }
}
