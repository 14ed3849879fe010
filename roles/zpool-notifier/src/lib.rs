//! Polls a mining pool for wallet statistics and posts balance and hashrate
//! summaries to a webhook.

pub mod api;
pub mod config;
pub mod error;
pub mod poller;
pub mod report;
pub mod signal;
pub mod webhook;

#[cfg(test)]
mod test_utils;

pub use config::{Config, WalletConfig};
pub use poller::Notifier;
pub use signal::ShutdownReason;
