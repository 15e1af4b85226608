//! Backward pagination of stream history.
//!
//! At most one fetch per stream is in flight: concurrent `scrollback`
//! calls for the same stream share one future. A fetched page is applied
//! only if the view's loaded range did not move while it was in flight.

use crate::error::SyncError;
use crate::reader::StreamReader;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use river_kernel::{StreamHandle, StreamTimelineEvent};
use river_model::StreamId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Upper bound on pages fetched by one `scrollback_to_date`.
pub const SCROLLBACK_MAX_ROUNDS: usize = 20;

/// Growth of the fetch window relative to the last snapshot span.
pub const SCROLLBACK_MULTIPLIER: i64 = 4;

#[derive(Debug, Clone, Default)]
pub struct ScrollbackResult {
    pub terminus: bool,
    /// Oldest event loaded after this round.
    pub first_event: Option<StreamTimelineEvent>,
}

type SharedScrollback = Shared<BoxFuture<'static, Result<ScrollbackResult, Arc<SyncError>>>>;

/// `from_inclusive` for a page ending at `to_exclusive`: the snapshot span
/// times [`SCROLLBACK_MULTIPLIER`], clamped at block 0.
pub fn scrollback_window(to_exclusive: i64, prev_snapshot_miniblock_num: i64) -> i64 {
    let span = to_exclusive - prev_snapshot_miniblock_num;
    (to_exclusive - span * SCROLLBACK_MULTIPLIER).max(0)
}

pub struct ScrollbackCoordinator {
    reader: Arc<StreamReader>,
    pending: Arc<Mutex<HashMap<StreamId, SharedScrollback>>>,
}

impl std::fmt::Debug for ScrollbackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollbackCoordinator").finish_non_exhaustive()
    }
}

impl ScrollbackCoordinator {
    pub fn new(reader: Arc<StreamReader>) -> Self {
        Self { reader, pending: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Number of streams with a fetch in flight.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Load one page older than what `handle` holds.
    pub async fn scrollback(&self, handle: &StreamHandle) -> Result<ScrollbackResult, SyncError> {
        let stream_id = *handle.stream_id();
        let request = {
            let mut pending = self.pending.lock().await;
            match pending.get(&stream_id) {
                Some(request) => {
                    tracing::debug!(stream_id = %stream_id, "joining in-flight scrollback");
                    request.clone()
                }
                None => {
                    let reader = Arc::clone(&self.reader);
                    let handle = handle.clone();
                    let pending_map = Arc::clone(&self.pending);
                    let request = async move {
                        let result = scrollback_once(&reader, &handle).await.map_err(Arc::new);
                        pending_map.lock().await.remove(&stream_id);
                        result
                    }
                    .boxed()
                    .shared();
                    pending.insert(stream_id, request.clone());
                    request
                }
            }
        };
        request.await.map_err(SyncError::Shared)
    }

    /// Page backwards until the stream's start, until the oldest loaded
    /// event is not newer than `to_date_ms`, or for at most
    /// [`SCROLLBACK_MAX_ROUNDS`] pages.
    #[tracing::instrument(skip(self, handle), fields(stream_id = %handle.stream_id()))]
    pub async fn scrollback_to_date(&self, handle: &StreamHandle, to_date_ms: i64) -> Result<(), SyncError> {
        for round in 0..SCROLLBACK_MAX_ROUNDS {
            let result = self.scrollback(handle).await?;
            if result.terminus {
                tracing::debug!(round, "terminus reached");
                break;
            }
            let oldest = result.first_event.as_ref().map(|e| e.created_at_epoch_ms);
            tracing::debug!(round, ?oldest, to_date_ms, "scrollback round");
            if matches!(oldest, Some(ms) if ms <= to_date_ms) {
                break;
            }
        }
        Ok(())
    }
}

#[tracing::instrument(skip(reader, handle), fields(stream_id = %handle.stream_id()))]
async fn scrollback_once(reader: &StreamReader, handle: &StreamHandle) -> Result<ScrollbackResult, SyncError> {
    let stream_id = *handle.stream_id();
    let (info, prev_snapshot, first_event) = handle
        .read(|v| (v.miniblock_info().copied(), v.prev_snapshot_miniblock_num(), v.timeline().first().cloned()))
        .await?;
    let info = info.ok_or(SyncError::NotInitialized(stream_id))?;

    if info.terminus_reached {
        tracing::debug!("terminus reached");
        return Ok(ScrollbackResult { terminus: true, first_event });
    }
    if info.min < prev_snapshot {
        return Err(SyncError::BadRange { stream_id, min: info.min, prev_snapshot });
    }

    let to_exclusive = info.min;
    let from_inclusive = scrollback_window(to_exclusive, prev_snapshot);
    tracing::debug!(min = info.min, max = info.max, prev_snapshot, from_inclusive, to_exclusive, "scrollback");
    let page = reader.get_miniblocks(&stream_id, from_inclusive, to_exclusive).await?;

    // The view may have been reinitialized while the page was in flight.
    let applied = handle.prepend_if_min_unchanged(to_exclusive, page.miniblocks, page.terminus).await?;
    let first_event = handle.read(|v| v.timeline().first().cloned()).await?;
    Ok(ScrollbackResult { terminus: applied && page.terminus, first_event })
}
