//! Serde helpers for timestamps.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer};

/// Format used when writing timestamps: ISO-8601 with microseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Format used when reading timestamps. The fractional part is optional so
/// that whole-second values written by older snapshots still parse.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Render a timestamp the way it is stored on disk and in the database.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_PARSE_FORMAT)
}

/// (De)serialize a `NaiveDateTime` as an ISO-8601 string.
///
/// Usage:
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "crate::serde_utils::iso_timestamp")]
///     created_at: NaiveDateTime,
/// }
/// ```
pub mod iso_timestamp {
    use super::*;

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D>(de: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(de)?;
        parse_timestamp(&raw).map_err(|e| {
            serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e))
        })
    }
}
