use crate::error::MonitorError;
use crate::http::ResilientFetcher;
use crate::rates::api::{ExchangeFeed, RateQuote};
use crate::sms::notifier::{AlertRequest, Notifier};
use log::{info, warn};

/// Currency whose buy rate is monitored
pub const MONITORED_CURRENCY: &str = "USD";

/// Result of one completed check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// The quote observed during this check
    pub quote: RateQuote,
    /// Whether an alert was actually delivered
    pub alerted: bool,
}

/// Runs one fetch → validate → decide → notify cycle
///
/// Fetch and parse failures abort the check and propagate to the caller;
/// notification failures are logged and swallowed, so a gateway outage
/// never masks a successfully determined rate.
pub struct RateMonitor {
    fetcher: ResilientFetcher,
    notifier: Notifier,
    api_url: String,
    threshold: f64,
    recipient: Option<String>,
}

impl RateMonitor {
    /// Create a monitor for one configured check
    ///
    /// # Arguments
    ///
    /// * `fetcher` - retrying HTTP fetcher for the exchange API
    /// * `notifier` - alert delivery path
    /// * `api_url` - exchange API endpoint
    /// * `threshold` - alert when the buy rate exceeds this; a value of
    ///   0 or below disables alerting entirely
    /// * `recipient` - SMS destination, if configured
    pub fn new(
        fetcher: ResilientFetcher,
        notifier: Notifier,
        api_url: String,
        threshold: f64,
        recipient: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            api_url,
            threshold,
            recipient,
        }
    }

    /// Perform one rate check
    ///
    /// # Errors
    ///
    /// * `Fetch` - the exchange API could not be reached after retries
    /// * `InvalidResponseFormat` - the response body does not match the
    ///   expected feed schema, or the monitored rate is not numeric
    /// * `RateNotFound` - the feed carries no record for the monitored
    ///   currency
    pub async fn run_check(&self) -> Result<CheckOutcome, MonitorError> {
        info!("Checking exchange rates...");

        let body = self.fetcher.fetch(&self.api_url).await?;

        let feed: ExchangeFeed = serde_json::from_str(&body)
            .map_err(|e| MonitorError::InvalidResponseFormat(e.to_string()))?;

        let record = feed
            .data
            .iter()
            .find(|record| record.currency_code == MONITORED_CURRENCY)
            .ok_or_else(|| MonitorError::RateNotFound(MONITORED_CURRENCY.to_string()))?;

        let quote = record.quote().ok_or_else(|| {
            MonitorError::InvalidResponseFormat(format!(
                "{} buy rate is not numeric",
                MONITORED_CURRENCY
            ))
        })?;

        info!("Current {} TTBUY rate: {}", quote.currency_code, quote.buy_rate);

        if self.threshold <= 0.0 || quote.buy_rate <= self.threshold {
            info!(
                "No action needed. Current rate: {}, threshold: {}",
                quote.buy_rate, self.threshold
            );
            return Ok(CheckOutcome {
                quote,
                alerted: false,
            });
        }

        info!(
            "Rate {} exceeds threshold {}, sending notification",
            quote.buy_rate, self.threshold
        );

        let alert = AlertRequest {
            recipient: self.recipient.clone().unwrap_or_default(),
            rate: quote.buy_rate,
        };

        let alerted = match self.notifier.send_alert(&alert).await {
            Ok(_) => {
                info!("Notification sent successfully");
                true
            }
            Err(e) => {
                warn!("Notification failed: {}", e);
                false
            }
        };

        Ok(CheckOutcome { quote, alerted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::http::fetcher::MockHttpTransport;
    use crate::sms::gateway::RecordingGateway;
    use crate::sms::notifier::SOURCE_ADDRESS;
    use crate::sms::token_manager::TokenManager;
    use std::sync::Arc;

    const FEED: &str = r#"{"data": [
        {"CurrCode": "EUR", "TTBUY": "330.10"},
        {"CurrCode": "USD", "TTBUY": "310.50"}
    ]}"#;

    fn fetcher_serving(body: &'static str) -> ResilientFetcher {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().returning(move |_| Ok(body.to_string()));
        ResilientFetcher::new(Arc::new(transport), 3)
    }

    fn monitor_with(
        fetcher: ResilientFetcher,
        gateway: Arc<RecordingGateway>,
        threshold: f64,
        recipient: Option<&str>,
    ) -> RateMonitor {
        let tokens = TokenManager::new(gateway.clone(), "user".into(), "pass".into());
        let notifier = Notifier::new(gateway, tokens, SOURCE_ADDRESS.to_string());
        RateMonitor::new(
            fetcher,
            notifier,
            "http://rates.example/feed".to_string(),
            threshold,
            recipient.map(String::from),
        )
    }

    #[tokio::test]
    async fn test_rate_above_threshold_sends_exactly_one_alert() {
        let gateway = Arc::new(RecordingGateway::with_login("tok-1", 3600));
        let monitor = monitor_with(fetcher_serving(FEED), gateway.clone(), 300.0, Some("0771234567"));

        let outcome = monitor.run_check().await.unwrap();
        assert_eq!(outcome.quote.buy_rate, 310.5);
        assert!(outcome.alerted);

        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].1.message,
            "USD → LKR exchange rate has reached 310.5."
        );
    }

    #[tokio::test]
    async fn test_zero_threshold_disables_alerting() {
        let gateway = Arc::new(RecordingGateway::with_login("tok-1", 3600));
        let monitor = monitor_with(fetcher_serving(FEED), gateway.clone(), 0.0, Some("0771234567"));

        let outcome = monitor.run_check().await.unwrap();
        assert!(!outcome.alerted);
        assert_eq!(gateway.login_calls(), 0);
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_rate_below_threshold_takes_no_action() {
        let gateway = Arc::new(RecordingGateway::with_login("tok-1", 3600));
        let monitor = monitor_with(fetcher_serving(FEED), gateway.clone(), 400.0, Some("0771234567"));

        let outcome = monitor.run_check().await.unwrap();
        assert!(!outcome.alerted);
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_usd_record_is_rate_not_found() {
        let gateway = Arc::new(RecordingGateway::with_login("tok-1", 3600));
        let body = r#"{"data": [{"CurrCode": "EUR", "TTBUY": "330.10"}]}"#;
        let monitor = monitor_with(fetcher_serving(body), gateway.clone(), 300.0, Some("0771234567"));

        let err = monitor.run_check().await.unwrap_err();
        assert!(matches!(err, MonitorError::RateNotFound(_)));
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_non_list_body_is_invalid_format() {
        let gateway = Arc::new(RecordingGateway::with_login("tok-1", 3600));
        let monitor = monitor_with(
            fetcher_serving(r#"{"data": "unavailable"}"#),
            gateway,
            300.0,
            Some("0771234567"),
        );

        let err = monitor.run_check().await.unwrap_err();
        assert!(matches!(err, MonitorError::InvalidResponseFormat(_)));
    }

    #[tokio::test]
    async fn test_non_numeric_rate_is_invalid_format() {
        let gateway = Arc::new(RecordingGateway::with_login("tok-1", 3600));
        let body = r#"{"data": [{"CurrCode": "USD", "TTBUY": "suspended"}]}"#;
        let monitor = monitor_with(fetcher_serving(body), gateway, 300.0, Some("0771234567"));

        let err = monitor.run_check().await.unwrap_err();
        assert!(matches!(err, MonitorError::InvalidResponseFormat(_)));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let gateway = Arc::new(RecordingGateway::with_login("tok-1", 3600));
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| Err(FetchError::Status(503)));
        let fetcher = ResilientFetcher::new(Arc::new(transport), 1);
        let monitor = monitor_with(fetcher, gateway.clone(), 300.0, Some("0771234567"));

        let err = monitor.run_check().await.unwrap_err();
        assert!(matches!(err, MonitorError::Fetch(_)));
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_login_still_completes_the_check() {
        let gateway = Arc::new(RecordingGateway::rejecting_login("account disabled"));
        let monitor = monitor_with(fetcher_serving(FEED), gateway.clone(), 300.0, Some("0771234567"));

        // The rate was determined, so the check succeeds; only the
        // notification is lost (and logged).
        let outcome = monitor.run_check().await.unwrap();
        assert_eq!(outcome.quote.buy_rate, 310.5);
        assert!(!outcome.alerted);
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_recipient_is_swallowed() {
        let gateway = Arc::new(RecordingGateway::with_login("tok-1", 3600));
        let monitor = monitor_with(fetcher_serving(FEED), gateway.clone(), 300.0, None);

        let outcome = monitor.run_check().await.unwrap();
        assert!(!outcome.alerted);
        assert_eq!(gateway.login_calls(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed() {
        let gateway = Arc::new(
            RecordingGateway::with_login("tok-1", 3600)
                .failing_send(crate::error::NotifyError::SendFailure("HTTP 500".into())),
        );
        let monitor = monitor_with(fetcher_serving(FEED), gateway.clone(), 300.0, Some("0771234567"));

        let outcome = monitor.run_check().await.unwrap();
        assert!(!outcome.alerted);
        assert_eq!(gateway.sent().len(), 1);
    }
}
