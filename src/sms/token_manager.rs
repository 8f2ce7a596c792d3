use crate::error::NotifyError;
use crate::sms::gateway::SmsGateway;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A gateway bearer token and the instant it stops being valid
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Owns the cached gateway token and refreshes it via login when needed
///
/// The cache is process-wide state for one run: created empty, filled by
/// the first successful login, overwritten by the next login once the
/// expiry passes. The mutex is held across the login call so concurrent
/// callers collapse into a single refresh rather than each logging in.
pub struct TokenManager {
    gateway: Arc<dyn SmsGateway>,
    username: String,
    password: String,
    cached: Mutex<Option<AuthToken>>,
}

impl TokenManager {
    pub fn new(gateway: Arc<dyn SmsGateway>, username: String, password: String) -> Self {
        Self {
            gateway,
            username,
            password,
            cached: Mutex::new(None),
        }
    }

    /// Return a token that is valid right now, logging in if necessary
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::LoginFailure` when the gateway rejects the
    /// credentials, omits a token, or the login request itself fails.
    /// The cached token is left untouched on failure. Login is not
    /// retried; the caller treats a failure as a hard stop for this
    /// notification.
    pub async fn token(&self) -> Result<String, NotifyError> {
        self.token_at(Utc::now()).await
    }

    /// Return a token valid at `now`
    ///
    /// This is the clock-injected entry point used by tests with
    /// controlled timestamps.
    pub async fn token_at(&self, now: DateTime<Utc>) -> Result<String, NotifyError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if now <= token.expires_at {
                return Ok(token.value.clone());
            }
            debug!("Cached gateway token expired, logging in again");
        }

        let response = self.gateway.login(&self.username, &self.password).await?;

        if response.status != "success" {
            return Err(NotifyError::LoginFailure(
                response
                    .comment
                    .unwrap_or_else(|| format!("gateway returned status \"{}\"", response.status)),
            ));
        }

        let value = response
            .token
            .ok_or_else(|| NotifyError::LoginFailure("login response missing token".to_string()))?;

        let token = AuthToken {
            value: value.clone(),
            expires_at: now + Duration::seconds(response.expiration.unwrap_or(0)),
        };
        *cached = Some(token);

        Ok(value)
    }
}
