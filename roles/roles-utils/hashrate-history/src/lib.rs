//! Hashrate aggregation and rolling history for pool wallets.
//!
//! This crate turns the per-worker telemetry reported by a mining pool into
//! per-algorithm totals, keeps a bounded 24 hour history of those totals for
//! each wallet, and persists that history between runs.

pub mod aggregate;
pub mod history;
pub mod storage;
pub mod types;

pub use aggregate::{aggregate_hashrates, summarize};
pub use history::{HistorySeries, WalletHistory, HISTORY_CAPACITY, HISTORY_WINDOW};
pub use storage::{history_path_for, HistoryStorage, JsonFileStorage, StorageError};
pub use types::{AlgorithmSummary, HashrateSample, WorkerRecord};
