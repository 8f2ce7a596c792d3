/// Resilient HTTP fetching with bounded exponential backoff
pub mod fetcher;

pub use fetcher::{
    backoff_delay, HttpTransport, ReqwestTransport, ResilientFetcher, DEFAULT_MAX_RETRIES,
};
