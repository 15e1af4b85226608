//! Retry loop for unary calls.

use crate::config::{is_base_url_included, RetryParams};
use crate::error::RpcError;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Returns the current comma-separated list of node urls from the registry.
pub type RefreshNodeUrl = Arc<dyn Fn() -> BoxFuture<'static, Result<String, RpcError>> + Send + Sync>;

pub struct RetryPolicy<'a> {
    pub params: RetryParams,
    pub attempt_timeout: Option<Duration>,
    /// Url the client is bound to, checked against `refresh_node_url`.
    pub url: &'a str,
    pub refresh_node_url: Option<&'a RefreshNodeUrl>,
}

async fn run_attempt<T, Fut>(method: &'static str, timeout: Option<Duration>, fut: Fut) -> Result<T, RpcError>
where
    Fut: Future<Output = Result<T, RpcError>>,
{
    match timeout {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .unwrap_or(Err(RpcError::Timeout { method, after })),
        None => fut.await,
    }
}

/// Run `attempt` until it succeeds, fails with a final error, or
/// `max_attempts` is reached. `attempt` receives the 1-based attempt
/// number and must build a fresh request each time.
///
/// Cancelling `cancel` aborts the in-flight attempt or backoff and
/// returns [`RpcError::Canceled`] at once.
pub async fn retry_unary<T, F, Fut>(
    policy: &RetryPolicy<'_>,
    method: &'static str,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T, RpcError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RpcError>>,
{
    let mut n = 0u32;
    loop {
        n += 1;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RpcError::Canceled(method)),
            res = run_attempt(method, policy.attempt_timeout, attempt(n)) => res,
        };
        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if n >= policy.params.max_attempts || !err.is_retryable() {
            return Err(err);
        }

        if let Some(refresh) = policy.refresh_node_url {
            let urls = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RpcError::Canceled(method)),
                urls = refresh() => urls?,
            };
            if !is_base_url_included(&urls, policy.url) {
                return Err(RpcError::NodeNotOperational(policy.url.to_string()));
            }
        }

        let delay = policy.params.delay_for(n);
        tracing::warn!(
            method,
            attempt = n,
            max_attempts = policy.params.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "RPC error, retrying"
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RpcError::Canceled(method)),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
