//! Call logging support: request ids and the rolling call histogram.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Header carrying the per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-river-request-id";

pub const HISTOGRAM_INTERVAL: Duration = Duration::from_millis(5000);

/// Short random id used to correlate the log lines of one call.
pub fn gen_short_id() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(12).map(char::from).collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    /// Calls since the last flush.
    pub interval: u64,
    pub total: u64,
    pub error: u64,
}

/// Per-method call counts, keyed by method name plus optional suffix
/// (stream id for unary calls, `RECV` for streamed items).
#[derive(Debug, Default)]
pub struct CallHistogram {
    calls: Mutex<BTreeMap<String, CallStats>>,
}

impl CallHistogram {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, method: &str, suffix: Option<&str>, error: bool) {
        let name = match suffix {
            Some(s) => format!("{} {}", method, s),
            None => method.to_string(),
        };
        if let Ok(mut calls) = self.calls.lock() {
            let entry = calls.entry(name).or_default();
            entry.interval += 1;
            entry.total += 1;
            if error {
                entry.error += 1;
            }
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, CallStats> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Log the totals and reset interval counters. Returns the summed
    /// `(interval, total, error)` when anything happened since the last flush.
    pub fn flush(&self, transport_id: u64) -> Option<(u64, u64, u64)> {
        let mut calls = self.calls.lock().ok()?;
        let (interval, total, error) = calls
            .values()
            .fold((0, 0, 0), |(i, t, e), s| (i + s.interval, t + s.total, e + s.error));
        if interval == 0 {
            return None;
        }
        tracing::debug!(
            transport_id,
            interval,
            total,
            error,
            interval_ms = HISTOGRAM_INTERVAL.as_millis() as u64,
            calls = ?*calls,
            "RPC stats"
        );
        for stats in calls.values_mut() {
            stats.interval = 0;
        }
        Some((interval, total, error))
    }

    /// Flush every [`HISTOGRAM_INTERVAL`] until `cancel` fires.
    pub fn spawn_reporter(self: &Arc<Self>, transport_id: u64, cancel: CancellationToken) -> JoinHandle<()> {
        let histogram = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HISTOGRAM_INTERVAL);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        histogram.flush(transport_id);
                    }
                }
            }
        })
    }
}
