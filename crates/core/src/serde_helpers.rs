//! Serde helpers for backend timestamp formats.
//!
//! The backend emits either RFC 3339 timestamps or zone-less local
//! date-times (`2024-05-01T10:00:00`, optionally with fractional seconds).
//! Zone-less values are read as UTC. Serialization always emits RFC 3339.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Parse a backend timestamp string.
///
/// # Errors
///
/// Returns the underlying parse error message when the input matches
/// neither accepted format.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
}

/// `#[serde(with = "timestamp")]` for required timestamps.
pub mod timestamp {
    use super::{DateTime, Deserialize, Deserializer, Serializer, Utc, parse_timestamp};

    /// Serialize as RFC 3339.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    /// Deserialize from RFC 3339 or a zone-less local date-time.
    ///
    /// # Errors
    ///
    /// Fails when the string matches neither format.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(default, with = "timestamp_option")]` for optional timestamps.
pub mod timestamp_option {
    use super::{DateTime, Deserialize, Deserializer, Serializer, Utc, parse_timestamp};

    /// Serialize as RFC 3339 or `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional timestamp; `null` and empty strings map to `None`.
    ///
    /// # Errors
    ///
    /// Fails when a non-empty string matches neither format.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => parse_timestamp(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_timestamp("2024-05-01T10:00:00+09:00").unwrap();
        assert_eq!(dt.hour(), 1);
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let dt = parse_timestamp("2024-05-01T10:15:30").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 5, 1));
        assert_eq!(dt.hour(), 10);

        let fractional = parse_timestamp("2024-05-01T10:15:30.123456").unwrap();
        assert_eq!(fractional.minute(), 15);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }
}
