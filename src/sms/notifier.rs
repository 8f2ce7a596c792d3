use crate::error::NotifyError;
use crate::sms::gateway::{Msisdn, SmsGateway, SmsPayload};
use crate::sms::token_manager::TokenManager;
use chrono::Utc;
use log::info;
use std::sync::Arc;

/// Source address label shown as the SMS sender
pub const SOURCE_ADDRESS: &str = "Chutte";

/// Payment method code the gateway expects for this account
const PAYMENT_METHOD: u8 = 0;

/// Largest transaction id the gateway accepts
const TRANSACTION_ID_BOUND: u64 = 1_000_000_000_000_000 - 1;

/// A request to alert one recipient about a rate
///
/// Transient, built per notification attempt. The recipient is carried
/// raw; formatting happens at send time.
#[derive(Debug, Clone)]
pub struct AlertRequest {
    pub recipient: String,
    pub rate: f64,
}

/// Normalize a phone number to the gateway's 94XXXXXXXXX format
///
/// Strips every non-digit character. A number already carrying the 94
/// country code (and at least 11 digits) is truncated to its first 11
/// digits; anything else has 94 prefixed to its last 9 digits. Numbers
/// that do not fit the single-country scheme are not validated further.
pub fn format_msisdn(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.starts_with("94") && digits.len() >= 11 {
        return digits[..11].to_string();
    }

    format!("94{}", &digits[digits.len().saturating_sub(9)..])
}

/// Derive a transaction id from a millisecond timestamp
///
/// Always in `[1, 10^15 - 1]`; the offset keeps it from ever being zero.
pub fn transaction_id_at(now_millis: u64) -> u64 {
    now_millis % TRANSACTION_ID_BOUND + 1
}

/// Formats and delivers one rate alert through the SMS gateway
///
/// A single send attempt per invocation: token acquisition failures and
/// gateway errors surface as `NotifyError` for the caller to log.
pub struct Notifier {
    gateway: Arc<dyn SmsGateway>,
    tokens: TokenManager,
    source_address: String,
}

impl Notifier {
    pub fn new(gateway: Arc<dyn SmsGateway>, tokens: TokenManager, source_address: String) -> Self {
        Self {
            gateway,
            tokens,
            source_address,
        }
    }

    /// Send an SMS alert with the current exchange rate
    ///
    /// # Errors
    ///
    /// * `MissingRecipient` - the request carries no recipient number;
    ///   nothing is sent and no gateway traffic occurs
    /// * `LoginFailure` - no valid token could be obtained
    /// * `SendFailure` - the gateway rejected or failed the send
    pub async fn send_alert(&self, alert: &AlertRequest) -> Result<serde_json::Value, NotifyError> {
        if alert.recipient.trim().is_empty() {
            return Err(NotifyError::MissingRecipient);
        }

        let token = self.tokens.token().await?;

        let payload = SmsPayload {
            msisdn: vec![Msisdn {
                mobile: format_msisdn(&alert.recipient),
            }],
            source_address: self.source_address.clone(),
            message: format!("USD → LKR exchange rate has reached {}.", alert.rate),
            transaction_id: transaction_id_at(Utc::now().timestamp_millis() as u64),
            payment_method: PAYMENT_METHOD,
        };

        let response = self.gateway.send(&token, &payload).await?;
        info!("SMS sent successfully");
        Ok(response)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn prop_formatted_msisdn_is_digits_prefixed_with_94(number: String) -> bool {
        let formatted = format_msisdn(&number);
        formatted.starts_with("94") && formatted.chars().all(|c| c.is_ascii_digit())
    }

    #[quickcheck]
    fn prop_formatted_msisdn_never_exceeds_eleven_digits(number: String) -> bool {
        format_msisdn(&number).len() <= 11
    }

    #[quickcheck]
    fn prop_formatting_is_idempotent_for_full_numbers(suffix: u32) -> bool {
        // Build a canonical 11-digit number and re-format it
        let number = format!("94{:09}", suffix % 1_000_000_000);
        format_msisdn(&format_msisdn(&number)) == format_msisdn(&number)
    }

    #[quickcheck]
    fn prop_transaction_id_is_in_gateway_range(now_millis: u64) -> bool {
        let id = transaction_id_at(now_millis);
        (1..=TRANSACTION_ID_BOUND).contains(&id)
    }
}
