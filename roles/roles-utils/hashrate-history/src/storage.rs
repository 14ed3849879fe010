//! JSON file backend for wallet histories.
//!
//! The on-disk format maps each algorithm to its samples, oldest first:
//! `{"scrypt": [{"timestamp": "2024-05-01T12:30:00Z", "hashrate": 1500.0}]}`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::history::WalletHistory;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage abstraction for one wallet's history.
pub trait HistoryStorage {
    /// Restore the stored history. Missing or unreadable data yields an empty
    /// history, so a first run and a corrupt file look the same to callers.
    fn load(&self) -> WalletHistory;

    /// Persist the full history, replacing whatever was stored.
    fn save(&self, history: &WalletHistory) -> Result<()>;
}

impl WalletHistory {
    /// Serialize to the durable JSON representation.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse the durable JSON representation, keeping at most the newest
    /// `HISTORY_CAPACITY` samples per series. Anything unparseable yields an
    /// empty history.
    pub fn from_json_bytes(bytes: &[u8]) -> WalletHistory {
        match serde_json::from_slice(bytes) {
            Ok(history) => history,
            Err(e) => {
                warn!("Discarding unparseable hashrate history: {}", e);
                WalletHistory::default()
            }
        }
    }
}

/// Stores a wallet history as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Storage for `wallet` inside `dir`, see `history_path_for`.
    pub fn for_wallet<P: AsRef<Path>>(dir: P, wallet: &str) -> Self {
        Self::new(history_path_for(dir, wallet))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStorage for JsonFileStorage {
    fn load(&self) -> WalletHistory {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let history = WalletHistory::from_json_bytes(&bytes);
                debug!(
                    "Loaded hashrate history for {} algorithm(s) from {}",
                    history.len(),
                    self.path.display()
                );
                history
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No hashrate history at {}, starting fresh", self.path.display());
                WalletHistory::default()
            }
            Err(e) => {
                warn!(
                    "Failed to read hashrate history {}: {}",
                    self.path.display(),
                    e
                );
                WalletHistory::default()
            }
        }
    }

    fn save(&self, history: &WalletHistory) -> Result<()> {
        // Create parent directories if they don't exist
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = history.to_json_bytes()?;

        // Write next to the target, then rename so a crash never leaves a torn file
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!("Saved hashrate history to {}", self.path.display());
        Ok(())
    }
}

/// Per-wallet history file: `<dir>/hashrate_history_<wallet>.json`.
///
/// Characters outside `[A-Za-z0-9_-]` in the wallet are replaced by `_`.
pub fn history_path_for<P: AsRef<Path>>(dir: P, wallet: &str) -> PathBuf {
    let sanitized: String = wallet
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.as_ref()
        .join(format!("hashrate_history_{}.json", sanitized))
}
