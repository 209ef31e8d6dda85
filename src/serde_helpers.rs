use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// Calendar day format used on the command line, in profiles and in reports.
pub const DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month padding:zero]-[day padding:zero]");

/// Parse a `YYYY-mm-dd` string into a [`Date`].
pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw.trim(), DATE_FORMAT)
}

/// Serde helpers for `time::Date` as `YYYY-mm-dd`.
pub mod date {
    use super::*;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for `Option<Date>` fields.
    pub mod option {
        use super::*;

        pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| parse_date(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Serde helpers for `Option<std::time::Duration>` as humantime strings (`100ms`, `2s`).
pub mod optional_duration {
    use super::*;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use time::macros::date;

    #[test]
    fn roundtrips_date() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Wrapper {
            #[serde(with = "crate::serde_helpers::date")]
            day: Date,
        }

        let value = Wrapper {
            day: date!(2025 - 05 - 04),
        };
        let serialized = serde_json::to_string(&value).unwrap();
        assert_eq!(
            serialized, "{\"day\":\"2025-05-04\"}",
            "Expected 2025-05-04 got {}",
            serialized
        );

        let deserialized: Wrapper = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, value);
    }

    #[test]
    fn optional_date_accepts_missing_and_null() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Wrapper {
            #[serde(default, with = "crate::serde_helpers::date::option")]
            start: Option<Date>,
        }

        let parsed: Wrapper = serde_json::from_str("{\"start\": \"2025-06-07\"}").unwrap();
        assert_eq!(parsed.start, Some(date!(2025 - 06 - 07)));

        let parsed: Wrapper = serde_json::from_str("{\"start\": null}").unwrap();
        assert_eq!(parsed.start, None);

        let parsed: Wrapper = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.start, None);

        assert!(serde_json::from_str::<Wrapper>("{\"start\": \"06/07/2025\"}").is_err());
    }

    #[test]
    fn duration_uses_humantime_strings() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Wrapper {
            #[serde(with = "crate::serde_helpers::optional_duration")]
            delay: Option<Duration>,
        }

        let value = Wrapper {
            delay: Some(Duration::from_millis(100)),
        };
        let serialized = serde_json::to_string(&value).unwrap();
        assert_eq!(serialized, "{\"delay\":\"100ms\"}");

        let parsed: Wrapper = serde_json::from_str("{\"delay\": \"2s\"}").unwrap();
        assert_eq!(parsed.delay, Some(Duration::from_secs(2)));
        assert!(serde_json::from_str::<Wrapper>("{\"delay\": \"soon\"}").is_err());
    }
}
