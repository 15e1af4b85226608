use river_kernel::{RiverError, StreamError};
use river_model::StreamId;
use river_rpc::RpcError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    River(#[from] RiverError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("stream {0} not found")]
    StreamNotFound(StreamId),

    #[error("stream {0} not initialized")]
    NotInitialized(StreamId),

    #[error("stream {stream_id}: loaded range starts at {min}, before snapshot {prev_snapshot}")]
    BadRange { stream_id: StreamId, min: i64, prev_snapshot: i64 },

    /// Failure of a scrollback shared between concurrent callers.
    #[error(transparent)]
    Shared(Arc<SyncError>),
}
