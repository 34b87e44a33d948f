//! Provider adapters (FMP, SEC-API, EODHD, Financial Datasets).
//!
//! Each adapter owns its source's payload quirks end to end: field-name
//! fallbacks, the source's sell/disposal transaction vocabulary, and the
//! drop-malformed-items policy. Nothing upstream-specific leaks past this
//! module boundary.

mod eodhd;
mod financial_datasets;
mod fmp;
mod sec_api;

pub use eodhd::EodhdAdapter;
pub use financial_datasets::FinancialDatasetsAdapter;
pub use fmp::FmpAdapter;
pub use sec_api::SecApiAdapter;

use serde_json::Value;
use time::Date;

use crate::domain::dates::parse_loose_date;

/// First non-empty string value among candidate keys.
pub(crate) fn str_field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// First parseable numeric value among candidate keys. Upstreams disagree
/// about whether numbers arrive as JSON numbers or strings.
pub(crate) fn f64_field(item: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let value = item.get(*key)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
    })
}

/// First parseable date among candidate keys.
pub(crate) fn date_field(item: &Value, keys: &[&str]) -> Option<Date> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .find_map(parse_loose_date)
}

/// Locate the item list in a payload that is either a bare array or an
/// object wrapping the array under one of the given keys.
pub(crate) fn item_list<'a>(payload: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(items) = payload.as_array() {
        return items;
    }
    for key in keys {
        if let Some(items) = payload.get(*key).and_then(Value::as_array) {
            return items;
        }
    }
    &[]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn field_helpers_tolerate_mixed_shapes() {
        let item = json!({
            "shares": "1500",
            "transactionDate": "2024-03-05T00:00:00Z",
            "reportingName": "  DOE JANE  ",
            "empty": "",
        });

        assert_eq!(f64_field(&item, &["numberOfShares", "shares"]), Some(1500.0));
        assert_eq!(
            date_field(&item, &["transactionDate"]),
            Some(date!(2024 - 03 - 05))
        );
        assert_eq!(str_field(&item, &["empty", "reportingName"]), Some("DOE JANE"));
        assert_eq!(str_field(&item, &["missing"]), None);
    }

    #[test]
    fn item_list_unwraps_both_shapes() {
        let bare = json!([{"a": 1}]);
        assert_eq!(item_list(&bare, &["data"]).len(), 1);

        let wrapped = json!({"data": [{"a": 1}, {"b": 2}]});
        assert_eq!(item_list(&wrapped, &["rows", "data"]).len(), 2);

        let neither = json!({"message": "nope"});
        assert!(item_list(&neither, &["data"]).is_empty());
    }
}
