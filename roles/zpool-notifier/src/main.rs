use chrono::Utc;
use tokio::sync::watch;
use tracing::info;

use zpool_notifier::{signal::setup_signal_handler, Config, Notifier, ShutdownReason};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_args()?;

    // Setup tracing with optional file output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt().with_env_filter(env_filter);

    if let Some(log_file) = &config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| format!("Failed to open log file {}: {}", log_file, e))?;
        fmt_layer.with_writer(std::sync::Arc::new(file)).init();
    } else {
        fmt_layer.init();
    }

    info!("Starting zpool-notifier");
    info!("Pool API: {}", config.pool_api_url);
    info!("Price API: {}", config.price_api_url);
    info!("History directory: {}", config.history_dir.display());
    info!("Poll interval: {} seconds", config.poll_interval_secs);
    for wallet in &config.wallets {
        info!("Tracking wallet {} ({})", wallet.wallet_address, wallet.ticker);
    }

    let mut notifier = Notifier::new(&config)?;

    if config.run_once {
        notifier.run_cycle(Utc::now()).await;
        notifier.save_all();
        return Ok(());
    }

    let (exit_sender, exit_receiver) = watch::channel(ShutdownReason::None);
    let _signal_task = setup_signal_handler(exit_sender);

    notifier.run(exit_receiver).await;
    info!("zpool-notifier stopped");

    Ok(())
}
