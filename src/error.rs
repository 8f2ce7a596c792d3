use thiserror::Error;

/// Errors from a single HTTP fetch or from the retrying fetcher
///
/// The fetcher surfaces the error of the final attempt once its retry
/// budget is exhausted.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),
}

/// Errors that abort a rate check
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("exchange rate fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid exchange API response: {0}")]
    InvalidResponseFormat(String),

    #[error("{0} rate not found in exchange API response")]
    RateNotFound(String),
}

/// Errors in the notification path
///
/// These are never fatal to a check: the rate monitor logs them and the
/// process still exits cleanly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("no recipient number provided")]
    MissingRecipient,

    #[error("gateway login failed: {0}")]
    LoginFailure(String),

    #[error("SMS send failed: {0}")]
    SendFailure(String),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}
