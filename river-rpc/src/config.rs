//! Transport configuration

use crate::error::RpcError;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Environment variable that switches the wire format to JSON.
pub const DEBUG_TRANSPORT_ENV: &str = "RIVER_DEBUG_TRANSPORT";

/// Backoff parameters for unary calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryParams {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_retry_delay: Duration,
    pub max_retry_delay: Duration,
}

impl Default for RetryParams {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_retry_delay: Duration::from_millis(2000),
            max_retry_delay: Duration::from_millis(6000),
        }
    }
}

impl RetryParams {
    /// Delay before the attempt following failed attempt number `attempt` (1-based):
    /// `min(max, initial * 2^attempt)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_retry_delay
            .checked_mul(factor)
            .map_or(self.max_retry_delay, |d| d.min(self.max_retry_delay))
    }
}

/// Wire encoding for request and response messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    #[default]
    Binary,
    /// Debug mode: every field emitted as JSON, defaults included.
    Json,
}

impl WireFormat {
    /// `"true"` selects JSON; anything else, or no value, selects binary.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("true") => WireFormat::Json,
            _ => WireFormat::Binary,
        }
    }

    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(DEBUG_TRANSPORT_ENV).ok().as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Comma-separated node urls; one is picked per client.
    pub node_urls: String,
    pub retry: RetryParams,
    pub attempt_timeout: Option<Duration>,
    pub wire_format: WireFormat,
}

impl TransportConfig {
    pub fn new(node_urls: impl Into<String>) -> Self {
        Self {
            node_urls: node_urls.into(),
            retry: RetryParams::default(),
            attempt_timeout: None,
            wire_format: WireFormat::from_env(),
        }
    }

    pub fn with_retry(mut self, retry: RetryParams) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn with_wire_format(mut self, wire_format: WireFormat) -> Self {
        self.wire_format = wire_format;
        self
    }

    pub fn select_node_url(&self) -> Result<String, RpcError> {
        select_node_url(&self.node_urls)
    }
}

fn split_urls(urls: &str) -> Vec<&str> {
    urls.split(',').map(str::trim).filter(|u| !u.is_empty()).collect()
}

/// Pick one url uniformly at random from a comma-separated list.
pub fn select_node_url(urls: &str) -> Result<String, RpcError> {
    let candidates = split_urls(urls);
    match candidates.as_slice() {
        [] => Err(RpcError::NoNodeUrls),
        [only] => Ok((*only).to_string()),
        many => many
            .choose(&mut rand::thread_rng())
            .map(|u| (*u).to_string())
            .ok_or(RpcError::NoNodeUrls),
    }
}

/// True when `url` is still listed in `urls`, ignoring trailing slashes.
pub fn is_base_url_included(urls: &str, url: &str) -> bool {
    let url = url.trim_end_matches('/');
    split_urls(urls).iter().any(|u| u.trim_end_matches('/') == url)
}
