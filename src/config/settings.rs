use crate::error::ConfigError;
use crate::http::DEFAULT_MAX_RETRIES;
use crate::sms::notifier::SOURCE_ADDRESS;
use log::warn;
use serde::Deserialize;
use std::path::Path;

/// Environment variables recognized as overrides
///
/// These match the variables the deployment's periodic trigger already
/// exports; they win over values from the config file.
const ENV_EXCHANGE_API: &str = "EXCHANGE_API";
const ENV_LIMIT: &str = "LIMIT";
const ENV_SMS_RECIPIENT: &str = "SMS_RECIPIENT";
const ENV_ESMS_USERNAME: &str = "ESMS_USERNAME";
const ENV_ESMS_PASSWORD: &str = "ESMS_PASSWORD";

/// Application configuration
///
/// Loaded from an optional TOML file with environment overrides applied
/// on top. Every section has safe defaults; in particular the default
/// threshold of 0 disables alerting, so a misconfigured deployment
/// cannot spam anyone.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub sms: SmsConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Exchange API endpoint serving the currency feed
    pub api_url: String,
    /// Alert when the buy rate exceeds this; 0 or below disables alerting
    pub threshold: f64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmsConfig {
    /// Destination number, in any format the notifier can normalize
    pub recipient: Option<String>,
    pub username: String,
    pub password: String,
    pub login_url: String,
    pub send_url: String,
    /// Sender label shown on the delivered SMS
    pub source_address: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// Total fetch attempts against the exchange API
    pub max_retries: u32,
    /// Per-request timeout for both the exchange API and the gateway
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exchange: ExchangeConfig::default(),
            sms: SmsConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            threshold: 0.0,
        }
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            recipient: None,
            username: String::new(),
            password: String::new(),
            login_url: "https://esms.dialog.lk/api/v1/login".to_string(),
            send_url: "https://e-sms.dialog.lk/api/v2/sms".to_string(),
            source_address: SOURCE_ADDRESS.to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_seconds: 10,
        }
    }
}

impl Config {
    /// Parse a configuration file
    ///
    /// # Errors
    ///
    /// Returns `ReadError` if the file cannot be read and `TomlError`
    /// if it is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration: file (or defaults), then environment, then validation
    ///
    /// A missing or unreadable config file falls back to defaults with a
    /// warning; environment parse failures and validation failures are
    /// hard errors.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => match Self::from_file(path) {
                Ok(config) => config,
                Err(ConfigError::ReadError(e)) => {
                    warn!(
                        "Configuration file '{}' not found or unreadable ({}), using defaults",
                        path.display(),
                        e
                    );
                    Self::default()
                }
                Err(e) => return Err(e),
            },
            None => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_EXCHANGE_API) {
            self.exchange.api_url = url;
        }
        if let Some(limit) = lookup(ENV_LIMIT) {
            self.exchange.threshold =
                limit.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    name: ENV_LIMIT.to_string(),
                    value: limit,
                })?;
        }
        if let Some(recipient) = lookup(ENV_SMS_RECIPIENT) {
            self.sms.recipient = Some(recipient);
        }
        if let Some(username) = lookup(ENV_ESMS_USERNAME) {
            self.sms.username = username;
        }
        if let Some(password) = lookup(ENV_ESMS_PASSWORD) {
            self.sms.password = password;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.exchange.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "exchange.api_url must be set (config file or EXCHANGE_API)".to_string(),
            ));
        }
        Ok(())
    }
}
