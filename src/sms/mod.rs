/// SMS gateway wire protocol and HTTP client
pub mod gateway;

/// Cached authentication token lifecycle
pub mod token_manager;

/// Alert formatting and delivery
pub mod notifier;

pub use gateway::{DialogGateway, LoginResponse, Msisdn, SmsGateway, SmsPayload};
pub use notifier::{format_msisdn, AlertRequest, Notifier};
pub use token_manager::{AuthToken, TokenManager};
