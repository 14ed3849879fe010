//! Rolling hashrate history per wallet.
//!
//! Each algorithm of a wallet gets a `HistorySeries`: an oldest-first buffer of
//! samples bounded both by count (`HISTORY_CAPACITY`) and by age
//! (`HISTORY_WINDOW`). Age eviction is lazy and only happens on `update`, so a
//! series that stops receiving samples keeps its last values until the
//! algorithm shows up again.
//!
//! # Example
//! ```ignore
//! let mut history = WalletHistory::default();
//! history.update("scrypt", 1_500.0, Utc::now());
//! let avg = history.average("scrypt"); // 1500.0
//! ```

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::types::HashrateSample;

/// Maximum samples kept per series: 24 hours at a 10 minute cadence.
pub const HISTORY_CAPACITY: usize = 144;

/// Samples older than this, relative to the latest update, are evicted.
pub const HISTORY_WINDOW: Duration = Duration::hours(24);

/// Time-ordered, bounded samples for one algorithm.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<HashrateSample>")]
pub struct HistorySeries {
    samples: VecDeque<HashrateSample>,
}

impl HistorySeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HashrateSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&HashrateSample> {
        self.samples.back()
    }

    /// Arithmetic mean of the retained samples, `0.0` when empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: f64 = self.samples.iter().map(|s| s.hashrate).sum();
        total / self.samples.len() as f64
    }

    /// Append a sample taken at `now` and evict from the front until the
    /// series fits both the capacity and the 24h window. Samples dated after
    /// `now` are dropped first. Returns the number of evicted samples.
    fn push(&mut self, hashrate: f64, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        // Timestamps stay non-decreasing and always record the real clock
        while self.samples.back().is_some_and(|last| last.timestamp > now) {
            self.samples.pop_back();
            evicted += 1;
        }
        self.samples.push_back(HashrateSample {
            timestamp: now,
            hashrate,
        });

        let cutoff = now - HISTORY_WINDOW;
        while let Some(front) = self.samples.front() {
            if self.samples.len() > HISTORY_CAPACITY || front.timestamp < cutoff {
                self.samples.pop_front();
                evicted += 1;
            } else {
                break;
            }
        }
        evicted
    }
}

impl From<Vec<HashrateSample>> for HistorySeries {
    /// Keeps only the newest `HISTORY_CAPACITY` samples. The input is trusted
    /// to be oldest first.
    fn from(samples: Vec<HashrateSample>) -> Self {
        let mut samples = VecDeque::from(samples);
        let excess = samples.len().saturating_sub(HISTORY_CAPACITY);
        samples.drain(..excess);
        Self { samples }
    }
}

impl Serialize for HistorySeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.samples)
    }
}

/// All tracked series of one wallet, keyed by algorithm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletHistory {
    series: BTreeMap<String, HistorySeries>,
}

impl WalletHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hashrate` for `algo` at `now`, creating the series on first use.
    pub fn update(&mut self, algo: &str, hashrate: f64, now: DateTime<Utc>) {
        let series = self.series.entry(algo.to_string()).or_default();
        let evicted = series.push(hashrate, now);
        if evicted > 0 {
            debug!(
                "Evicted {} sample(s) from {} history, {} retained",
                evicted,
                algo,
                series.len()
            );
        }
    }

    /// Mean hashrate over the retained samples. Unknown algorithms average to `0.0`.
    pub fn average(&self, algo: &str) -> f64 {
        self.series
            .get(algo)
            .map(HistorySeries::average)
            .unwrap_or(0.0)
    }

    pub fn series(&self, algo: &str) -> Option<&HistorySeries> {
        self.series.get(algo)
    }

    pub fn latest(&self, algo: &str) -> Option<&HashrateSample> {
        self.series.get(algo).and_then(HistorySeries::latest)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Number of tracked algorithms.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
