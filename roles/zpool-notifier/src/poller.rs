//! The poll loop: fetch, aggregate, record, report and persist, once per
//! wallet per cycle.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hashrate_history::{summarize, HistoryStorage, JsonFileStorage, StorageError, WalletHistory};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{build_http_client, PoolApi, PriceApi};
use crate::config::{Config, WalletConfig};
use crate::error::ApiError;
use crate::report::{ReportContext, ReportRenderer};
use crate::signal::ShutdownReason;
use crate::webhook::{WebhookClient, WebhookPayload};

/// A tracked wallet with its history and where that history is stored.
pub struct WalletState {
    pub config: WalletConfig,
    pub history: WalletHistory,
    storage: JsonFileStorage,
}

impl WalletState {
    /// Restore the wallet's history from `storage`, empty if nothing usable is stored.
    pub fn restore(config: WalletConfig, storage: JsonFileStorage) -> Self {
        let history = storage.load();
        info!(
            "Restored history for {}: {} algorithm(s) from {}",
            config.wallet_address,
            history.len(),
            storage.path().display()
        );
        Self {
            config,
            history,
            storage,
        }
    }

    pub fn save(&self) -> Result<(), StorageError> {
        self.storage.save(&self.history)
    }
}

/// Clients and rendering shared by every wallet.
struct Services {
    pool_api: PoolApi,
    price_api: PriceApi,
    webhook: WebhookClient,
    renderer: Box<dyn ReportRenderer>,
    username: String,
}

impl Services {
    /// Fetch the wallet's numbers, record them in its history and render the
    /// report. Nothing is recorded when a fetch fails.
    async fn collect(
        &self,
        wallet: &mut WalletState,
        now: DateTime<Utc>,
    ) -> Result<WebhookPayload, ApiError> {
        let coin_to_usd = self.price_api.fetch_coin_to_usd(&wallet.config.coin).await?;
        let stats = self
            .pool_api
            .fetch_wallet_stats(&wallet.config.wallet_address)
            .await?;

        let summaries = summarize(&stats.miners);
        for row in &summaries {
            wallet.history.update(&row.algo, row.hashrate, now);
        }

        let ctx = ReportContext {
            stats: &stats,
            summaries: &summaries,
            history: &wallet.history,
            coin_to_usd,
            ticker: &wallet.config.ticker,
            generated_at: now,
        };
        Ok(self.renderer.render(&ctx, &self.username))
    }
}

pub struct Notifier {
    services: Services,
    wallets: Vec<WalletState>,
    poll_interval: Duration,
}

impl Notifier {
    /// Build clients from `config` and restore every wallet's history.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = build_http_client(config)?;
        let wallets = config
            .wallets
            .iter()
            .map(|wallet| {
                WalletState::restore(
                    wallet.clone(),
                    JsonFileStorage::for_wallet(&config.history_dir, &wallet.wallet_address),
                )
            })
            .collect();

        Ok(Self {
            services: Services {
                pool_api: PoolApi::new(client.clone(), config.pool_api_url.clone()),
                price_api: PriceApi::new(client.clone(), config.price_api_url.clone()),
                webhook: WebhookClient::new(client),
                renderer: config.render_style.renderer(),
                username: config.webhook_username.clone(),
            },
            wallets,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        })
    }

    pub fn wallets(&self) -> &[WalletState] {
        &self.wallets
    }

    /// Process every wallet once, in config order. A wallet whose fetch fails
    /// is logged and skipped; the others still run.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) {
        for wallet in &mut self.wallets {
            let address = wallet.config.wallet_address.clone();
            let payload = match self.services.collect(wallet, now).await {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Skipping wallet {} this cycle: {}", address, e);
                    continue;
                }
            };

            match self
                .services
                .webhook
                .post(&wallet.config.webhook_url, &payload)
                .await
            {
                Ok(response) if response.is_success() => {
                    info!(
                        "Data sent to webhook for {}. Status code: {}",
                        address, response.status
                    );
                    debug!("Webhook response: {}", response.body);
                }
                Ok(response) => {
                    warn!(
                        "Webhook for {} rejected the report. Status code: {}, response: {}",
                        address, response.status, response.body
                    );
                }
                Err(e) => {
                    error!("Failed to post report for {}: {}", address, e);
                }
            }

            // Saved whatever happened to the post, the history already holds this cycle
            if let Err(e) = wallet.save() {
                error!("Failed to save history for {}: {}", address, e);
            }
        }
    }

    /// Persist every wallet's history, logging failures.
    pub fn save_all(&self) {
        for wallet in &self.wallets {
            if let Err(e) = wallet.save() {
                error!(
                    "Failed to save history for {}: {}",
                    wallet.config.wallet_address, e
                );
            }
        }
    }

    /// Run cycles every `poll_interval` until shutdown is requested, then
    /// flush all histories.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<ShutdownReason>) {
        info!(
            "Polling {} wallet(s) every {} seconds",
            self.wallets.len(),
            self.poll_interval.as_secs()
        );

        loop {
            if *shutdown.borrow() != ShutdownReason::None {
                break;
            }

            // A signal cancels the cycle between requests; samples already
            // recorded are flushed below
            tokio::select! {
                _ = self.run_cycle(Utc::now()) => {}
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Saving hashrate history before exit");
        self.save_all();
    }
}
