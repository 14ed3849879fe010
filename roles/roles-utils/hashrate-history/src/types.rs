//! Record types shared by the aggregator, the history store and the pool API client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One worker as reported by the pool's wallet endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Algorithm identifier (e.g. "sha256", "scrypt")
    pub algo: String,

    /// Accepted hashrate in hashes per second
    #[serde(default, deserialize_with = "lenient_f64")]
    pub accepted: f64,
}

impl WorkerRecord {
    pub fn new(algo: impl Into<String>, accepted: f64) -> Self {
        Self {
            algo: algo.into(),
            accepted,
        }
    }
}

/// A single point in a hashrate time-series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HashrateSample {
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,

    /// Hashrate in hashes per second
    pub hashrate: f64,
}

/// Current totals for one algorithm of a wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmSummary {
    pub algo: String,
    pub hashrate: f64,
    pub workers: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
    Null,
}

/// Deserialize a real that the pool API may send as a JSON number, a numeric
/// string or null (read as zero).
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => text.trim().parse::<f64>().map_err(serde::de::Error::custom),
        NumberOrString::Null => Ok(0.0),
    }
}

/// ISO-8601 timestamps. Written as RFC 3339 in UTC; offset-less values are
/// read as UTC so older history files still load.
pub mod iso8601 {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(timestamp.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}
