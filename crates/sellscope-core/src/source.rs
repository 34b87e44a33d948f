use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers, in global priority order.
///
/// The order of [`ProviderId::ALL`] is the "first seen wins" order used by
/// cross-source deduplication, independent of which fetch completes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Fmp,
    SecApi,
    Eodhd,
    FinancialDatasets,
}

impl ProviderId {
    pub const ALL: [Self; 4] = [Self::Fmp, Self::SecApi, Self::Eodhd, Self::FinancialDatasets];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fmp => "fmp",
            Self::SecApi => "sec_api",
            Self::Eodhd => "eodhd",
            Self::FinancialDatasets => "financial_datasets",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fmp" => Ok(Self::Fmp),
            "sec_api" | "sec" => Ok(Self::SecApi),
            "eodhd" => Ok(Self::Eodhd),
            "financial_datasets" => Ok(Self::FinancialDatasets),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
