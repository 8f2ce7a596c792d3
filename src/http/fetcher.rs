use crate::error::FetchError;
use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// User-Agent presented to the exchange API
///
/// Some exchange-rate endpoints reject requests carrying default HTTP
/// client identifiers, so the fetcher identifies itself as a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// Default number of total fetch attempts before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A single HTTP GET attempt, returning the response body as text
///
/// Implementations decide what counts as a failed attempt; the reqwest
/// implementation treats transport errors, timeouts, and non-2xx status
/// codes as failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed transport with a fixed timeout and browser User-Agent
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests are bounded by `timeout`
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Compute the backoff delay before the given retry
///
/// Delays grow as `2^retries * 1000` ms: 2 s before the first retry,
/// 4 s before the second, 8 s before the third. Deterministic, no jitter.
pub fn backoff_delay(retries: u32) -> Duration {
    Duration::from_millis(1000 * (1u64 << retries))
}

/// HTTP fetcher with bounded exponential-backoff retries
///
/// Each call to [`fetch`](ResilientFetcher::fetch) makes up to
/// `max_retries` total attempts. Failed attempts are logged with the
/// attempt count and the delay before the next try; once the budget is
/// exhausted the error of the final attempt is propagated.
pub struct ResilientFetcher {
    transport: Arc<dyn HttpTransport>,
    max_retries: u32,
}

impl ResilientFetcher {
    /// Create a fetcher over the given transport
    ///
    /// # Arguments
    ///
    /// * `transport` - the underlying single-attempt HTTP transport
    /// * `max_retries` - total attempts per fetch; a value of 0 still
    ///   performs one attempt
    pub fn new(transport: Arc<dyn HttpTransport>, max_retries: u32) -> Self {
        Self {
            transport,
            max_retries,
        }
    }

    /// Fetch `url`, retrying with exponential backoff on any failure
    ///
    /// # Errors
    ///
    /// Returns the final attempt's `FetchError` after the retry budget
    /// is exhausted.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut retries = 0;
        loop {
            match self.transport.get(url).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    retries += 1;
                    if retries >= self.max_retries {
                        return Err(err);
                    }
                    let delay = backoff_delay(retries);
                    warn!(
                        "Retry {}/{} after {}ms: {}",
                        retries,
                        self.max_retries,
                        delay.as_millis(),
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
