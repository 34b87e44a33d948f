use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

use crate::ValidationError;

const ISO_DATE: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_iso_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), ISO_DATE).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

/// Lenient date extraction used on upstream payloads.
///
/// Providers mix bare dates, datetimes (`2022-08-09T21:23:00-04:00`) and
/// empty strings in the same field; the leading 10 characters are all that
/// is trusted. Returns `None` on anything unparseable.
pub fn parse_loose_date(input: &str) -> Option<Date> {
    let prefix = input.trim().get(..10)?;
    Date::parse(prefix, ISO_DATE).ok()
}

pub fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE)
        .expect("ISO date format cannot fail for a valid Date")
}

/// Serde adapter for required `Date` fields serialized as `YYYY-MM-DD`.
pub mod iso {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let value = String::deserialize(deserializer)?;
        super::parse_loose_date(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid date '{value}'")))
    }
}

/// Serde adapter for optional `Date` fields.
pub mod iso_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&super::format_iso_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.as_deref().and_then(super::parse_loose_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_strict_iso_date() {
        assert_eq!(parse_iso_date("2024-06-01").unwrap(), date!(2024 - 06 - 01));
        assert!(parse_iso_date("06/01/2024").is_err());
    }

    #[test]
    fn loose_parse_accepts_datetime_prefix() {
        assert_eq!(
            parse_loose_date("2022-08-09T21:23:00-04:00"),
            Some(date!(2022 - 08 - 09))
        );
        assert_eq!(parse_loose_date(""), None);
        assert_eq!(parse_loose_date("not-a-date-at-all"), None);
    }
}
