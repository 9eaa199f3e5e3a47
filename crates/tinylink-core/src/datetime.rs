//! Timestamp helpers shared by the record types and the persistent backends.
//!
//! Records are persisted with whole-second precision as `YYYY-MM-DD HH:MM:SS`
//! in UTC, which is both the JSON document format and the MySQL `DATETIME`
//! literal format.

use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};

/// `strftime`/`strptime` pattern of a persisted timestamp.
pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current time truncated to whole seconds.
///
/// Records are created with this so that every backend returns exactly the
/// value that was stored.
pub fn now() -> Timestamp {
    truncate(Timestamp::now())
}

/// Drops the sub-second part of a timestamp.
pub fn truncate(ts: Timestamp) -> Timestamp {
    ts - SignedDuration::from_nanos(i64::from(ts.subsec_nanosecond()))
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format(ts: Timestamp) -> String {
    ts.strftime(FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD HH:MM:SS` string, interpreting it as UTC.
pub fn parse(value: &str) -> Result<Timestamp, jiff::Error> {
    let civil = DateTime::strptime(FORMAT, value)?;
    Ok(civil.to_zoned(TimeZone::UTC)?.timestamp())
}

/// Serde adapter for `#[serde(with = "...")]` on `Timestamp` fields.
pub mod serde_format {
    use jiff::Timestamp;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format(*ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for `Option<Timestamp>` fields.
    pub mod option {
        use jiff::Timestamp;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(ts: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match ts {
                Some(ts) => serializer.serialize_some(&crate::datetime::format(*ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| crate::datetime::parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_and_parse_agree() {
        let ts = Timestamp::from_second(1_700_000_000).unwrap();
        let text = format(ts);
        assert_eq!(text, "2023-11-14 22:13:20");
        assert_eq!(parse(&text).unwrap(), ts);
    }

    #[test]
    fn parse_rejects_other_layouts() {
        assert!(parse("2023-11-14T22:13:20Z").is_err());
        assert!(parse("yesterday").is_err());
    }

    #[test]
    fn now_has_no_subsecond_part() {
        assert_eq!(now().subsec_nanosecond(), 0);
    }

    #[test]
    fn truncate_keeps_the_second() {
        let ts = Timestamp::new(1_700_000_000, 999_999_999).unwrap();
        assert_eq!(truncate(ts), Timestamp::from_second(1_700_000_000).unwrap());
    }
}
