use crate::error::NotifyError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Login request body for the gateway
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login response from the gateway
///
/// `status == "success"` is the only outcome that carries a usable
/// token; everything else is a login failure, usually explained by
/// `comment`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub status: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Token lifetime in seconds
    #[serde(default)]
    pub expiration: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One destination number in the send payload
#[derive(Debug, Clone, Serialize)]
pub struct Msisdn {
    pub mobile: String,
}

/// Send request body, serialized exactly as the gateway wire format
#[derive(Debug, Clone, Serialize)]
pub struct SmsPayload {
    pub msisdn: Vec<Msisdn>,
    #[serde(rename = "sourceAddress")]
    pub source_address: String,
    pub message: String,
    pub transaction_id: u64,
    pub payment_method: u8,
}

/// The two gateway operations the notification path needs
///
/// The token manager drives `login`; the notifier drives `send`. Tests
/// script both through [`RecordingGateway`].
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// POST credentials to the login endpoint and return the parsed body
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, NotifyError>;

    /// POST one message with bearer-token auth and return the response body
    async fn send(&self, token: &str, payload: &SmsPayload)
        -> Result<serde_json::Value, NotifyError>;
}

/// Dialog eSMS REST client
pub struct DialogGateway {
    client: Client,
    login_url: String,
    send_url: String,
}

impl DialogGateway {
    /// Create a gateway client whose requests are bounded by `timeout`
    pub fn new(login_url: String, send_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            login_url,
            send_url,
        }
    }
}

#[async_trait]
impl SmsGateway for DialogGateway {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, NotifyError> {
        let response = self
            .client
            .post(&self.login_url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| NotifyError::LoginFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::LoginFailure(format!(
                "login endpoint returned status {}",
                response.status()
            )));
        }

        response
            .json::<LoginResponse>()
            .await
            .map_err(|e| NotifyError::LoginFailure(format!("malformed login response: {}", e)))
    }

    async fn send(
        &self,
        token: &str,
        payload: &SmsPayload,
    ) -> Result<serde_json::Value, NotifyError> {
        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::SendFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::SendFailure(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| NotifyError::SendFailure(format!("malformed send response: {}", e)))
    }
}

/// Scriptable gateway for tests
///
/// Login responses are consumed in order, cycling once exhausted; every
/// call is recorded so tests can assert on counts and captured payloads.
#[cfg(test)]
pub(crate) struct RecordingGateway {
    login_responses: std::sync::Mutex<Vec<Result<LoginResponse, NotifyError>>>,
    login_index: std::sync::Mutex<usize>,
    send_response: std::sync::Mutex<Result<serde_json::Value, NotifyError>>,
    login_calls: std::sync::Mutex<usize>,
    sent: std::sync::Mutex<Vec<(String, SmsPayload)>>,
}

#[cfg(test)]
impl RecordingGateway {
    /// Gateway whose logins always succeed with the given token and lifetime
    pub(crate) fn with_login(token: &str, expiration_secs: i64) -> Self {
        Self::with_login_responses(vec![Ok(LoginResponse {
            status: "success".to_string(),
            token: Some(token.to_string()),
            expiration: Some(expiration_secs),
            comment: None,
        })])
    }

    /// Gateway that serves the given login responses in order, cycling
    pub(crate) fn with_login_responses(
        responses: Vec<Result<LoginResponse, NotifyError>>,
    ) -> Self {
        Self {
            login_responses: std::sync::Mutex::new(responses),
            login_index: std::sync::Mutex::new(0),
            send_response: std::sync::Mutex::new(Ok(serde_json::json!({"status": "success"}))),
            login_calls: std::sync::Mutex::new(0),
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Gateway whose logins are rejected with the given comment
    pub(crate) fn rejecting_login(comment: &str) -> Self {
        Self::with_login_responses(vec![Ok(LoginResponse {
            status: "failure".to_string(),
            token: None,
            expiration: None,
            comment: Some(comment.to_string()),
        })])
    }

    pub(crate) fn failing_send(mut self, error: NotifyError) -> Self {
        self.send_response = std::sync::Mutex::new(Err(error));
        self
    }

    pub(crate) fn login_calls(&self) -> usize {
        *self.login_calls.lock().unwrap()
    }

    pub(crate) fn sent(&self) -> Vec<(String, SmsPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl SmsGateway for RecordingGateway {
    async fn login(&self, _username: &str, _password: &str) -> Result<LoginResponse, NotifyError> {
        *self.login_calls.lock().unwrap() += 1;
        let responses = self.login_responses.lock().unwrap();
        let mut index = self.login_index.lock().unwrap();
        let response = responses[*index % responses.len()].clone();
        *index += 1;
        response
    }

    async fn send(
        &self,
        token: &str,
        payload: &SmsPayload,
    ) -> Result<serde_json::Value, NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), payload.clone()));
        self.send_response.lock().unwrap().clone()
    }
}
