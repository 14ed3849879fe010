use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use hashrate_history::history_path_for;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::report::RenderStyle;

const DEFAULT_CONFIG_PATH: &str = "config/zpool-notifier.toml";

/// One tracked pool wallet and where its reports go.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletConfig {
    pub wallet_address: String,
    /// Price API coin id, e.g. "bitcoin"
    pub coin: String,
    /// Display ticker, e.g. "BTC"
    pub ticker: String,
    pub webhook_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval_secs: u64,
    pub webhook_username: String,
    pub render_style: RenderStyle,
    pub history_dir: PathBuf,
    pub pool_api_url: String,
    pub price_api_url: String,
    pub request_timeout_secs: u64,
    pub pool_idle_timeout_secs: u64,
    pub wallets: Vec<WalletConfig>,
    pub log_file: Option<String>,
    pub run_once: bool,
}

#[derive(Debug, Deserialize)]
struct NotifierFileConfig {
    #[serde(default)]
    notifier: NotifierSection,
    #[serde(default)]
    api: ApiSection,
    #[serde(default)]
    http_client: HttpClientConfig,
    #[serde(default)]
    wallets: Vec<WalletConfig>,
}

#[derive(Debug, Deserialize)]
struct NotifierSection {
    poll_interval_secs: Option<u64>,
    webhook_username: Option<String>,
    render_style: Option<RenderStyle>,
    history_dir: Option<String>,
}

impl Default for NotifierSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: Some(600),
            webhook_username: Some("Zpool Stats".to_string()),
            render_style: Some(RenderStyle::Plain),
            history_dir: Some(".".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiSection {
    pool_api_url: Option<String>,
    price_api_url: Option<String>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            pool_api_url: Some("https://www.zpool.ca".to_string()),
            price_api_url: Some("https://api.coingecko.com".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HttpClientConfig {
    pool_idle_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout_secs: Some(300),
            request_timeout_secs: Some(60),
        }
    }
}

impl Config {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args: Vec<String> = env::args().collect();

        let config_path = arg_value(&args, &["--config", "-c"])?
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let config_str = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;

        Self::from_parts(&args, &config_str)
    }

    /// Build the runtime config from a TOML document, with command line
    /// arguments taking precedence.
    pub fn from_parts(args: &[String], config_str: &str) -> Result<Self, ConfigError> {
        let file_config: NotifierFileConfig = toml::from_str(config_str)?;
        let defaults = NotifierSection::default();
        let api_defaults = ApiSection::default();
        let http_defaults = HttpClientConfig::default();

        let log_file = arg_value(args, &["--log-file", "-f"])?;

        let history_dir = arg_value(args, &["--history-dir"])?
            .or(file_config.notifier.history_dir)
            .or(defaults.history_dir)
            .map(PathBuf::from)
            .unwrap_or_default();

        let run_once = args.iter().any(|arg| arg == "--once");

        let poll_interval_secs = file_config
            .notifier
            .poll_interval_secs
            .or(defaults.poll_interval_secs)
            .unwrap_or(600);
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "notifier.poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        if file_config.wallets.is_empty() {
            return Err(ConfigError::NoWallets);
        }
        // Each wallet needs a history file of its own
        let mut history_files = HashMap::new();
        for wallet in &file_config.wallets {
            if wallet.wallet_address.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "wallets.wallet_address must not be empty".to_string(),
                ));
            }
            let path = history_path_for(&history_dir, &wallet.wallet_address);
            if let Some(other) = history_files.insert(path, &wallet.wallet_address) {
                return Err(ConfigError::InvalidValue(format!(
                    "wallets {} and {} would share the history file {}",
                    other,
                    wallet.wallet_address,
                    history_path_for(&history_dir, &wallet.wallet_address).display()
                )));
            }
        }

        Ok(Config {
            poll_interval_secs,
            webhook_username: file_config
                .notifier
                .webhook_username
                .or(defaults.webhook_username)
                .unwrap_or_default(),
            render_style: file_config
                .notifier
                .render_style
                .or(defaults.render_style)
                .unwrap_or_default(),
            history_dir,
            pool_api_url: file_config
                .api
                .pool_api_url
                .or(api_defaults.pool_api_url)
                .unwrap_or_default(),
            price_api_url: file_config
                .api
                .price_api_url
                .or(api_defaults.price_api_url)
                .unwrap_or_default(),
            request_timeout_secs: file_config
                .http_client
                .request_timeout_secs
                .or(http_defaults.request_timeout_secs)
                .unwrap_or(60),
            pool_idle_timeout_secs: file_config
                .http_client
                .pool_idle_timeout_secs
                .or(http_defaults.pool_idle_timeout_secs)
                .unwrap_or(300),
            wallets: file_config.wallets,
            log_file,
            run_once,
        })
    }
}

/// Value following the first matching flag, if the flag is present.
fn arg_value(args: &[String], flags: &[&str]) -> Result<Option<String>, ConfigError> {
    match args.iter().position(|arg| flags.contains(&arg.as_str())) {
        Some(i) => args
            .get(i + 1)
            .cloned()
            .map(Some)
            .ok_or_else(|| ConfigError::MissingArgument(flags[0].to_string())),
        None => Ok(None),
    }
}
