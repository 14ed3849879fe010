//! Per-algorithm reduction of worker telemetry.

use std::collections::BTreeMap;

use crate::types::{AlgorithmSummary, WorkerRecord};

/// Sum accepted hashrate and count workers per algorithm.
///
/// Workers whose accepted hashrate is not strictly positive are skipped, so an
/// algorithm only appears when at least one worker contributed to it. Both
/// returned maps always share the same key set.
pub fn aggregate_hashrates(
    records: &[WorkerRecord],
) -> (BTreeMap<String, f64>, BTreeMap<String, u32>) {
    let mut hashrates: BTreeMap<String, f64> = BTreeMap::new();
    let mut workers: BTreeMap<String, u32> = BTreeMap::new();

    for record in records {
        // Also rejects NaN
        if !(record.accepted > 0.0) {
            continue;
        }
        *hashrates.entry(record.algo.clone()).or_insert(0.0) += record.accepted;
        *workers.entry(record.algo.clone()).or_insert(0) += 1;
    }

    (hashrates, workers)
}

/// Aggregate and zip both maps into one row per algorithm, ordered by name.
pub fn summarize(records: &[WorkerRecord]) -> Vec<AlgorithmSummary> {
    let (hashrates, workers) = aggregate_hashrates(records);
    hashrates
        .into_iter()
        .map(|(algo, hashrate)| {
            let workers = workers.get(&algo).copied().unwrap_or_default();
            AlgorithmSummary {
                algo,
                hashrate,
                workers,
            }
        })
        .collect()
}
