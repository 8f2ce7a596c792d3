use clap::Parser;
use log::{error, info, warn};
use ratewatch::config::Config;
use ratewatch::http::{ReqwestTransport, ResilientFetcher};
use ratewatch::rates::RateMonitor;
use ratewatch::sms::{DialogGateway, Notifier, TokenManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Command-line arguments for the exchange-rate monitor
#[derive(Parser)]
#[command(
    name = "ratewatch",
    about = "USD/LKR exchange-rate monitor with SMS alerting",
    long_about = "Checks a currency-exchange API for the USD buy rate crossing a configured \
                  threshold and sends an SMS alert through the Dialog eSMS gateway when it does. \
                  Intended to be invoked periodically by an external scheduler such as cron."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files are handled gracefully by Config::load, which
            // warns and falls back to defaults
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let timeout = Duration::from_secs(config.fetch.timeout_seconds);

    let transport = Arc::new(ReqwestTransport::new(timeout));
    let fetcher = ResilientFetcher::new(transport, config.fetch.max_retries);

    let gateway = Arc::new(DialogGateway::new(
        config.sms.login_url.clone(),
        config.sms.send_url.clone(),
        timeout,
    ));
    let tokens = TokenManager::new(
        gateway.clone(),
        config.sms.username.clone(),
        config.sms.password.clone(),
    );
    let notifier = Notifier::new(gateway, tokens, config.sms.source_address.clone());

    let monitor = RateMonitor::new(
        fetcher,
        notifier,
        config.exchange.api_url.clone(),
        config.exchange.threshold,
        config.sms.recipient.clone(),
    );

    match monitor.run_check().await {
        Ok(outcome) => {
            info!(
                "Check complete: {} buy rate {}, alerted: {}",
                outcome.quote.currency_code, outcome.quote.buy_rate, outcome.alerted
            );
        }
        Err(e) => {
            error!("Monitor error: {}", e);
            std::process::exit(1);
        }
    }
}
