//! Where stream history comes from.

use crate::error::SyncError;
use async_trait::async_trait;
use river_model::StreamId;
use river_proto::{GetMiniblocksResponse, StreamAndCookie};
use river_rpc::StreamRpcClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Read access to a node's stored stream history.
///
/// Implemented for the RPC client; tests use in-memory chains.
#[async_trait]
pub trait MiniblockSource: Send + Sync {
    /// Latest snapshot onwards plus the minipool.
    async fn get_stream(&self, stream_id: &StreamId) -> Result<StreamAndCookie, SyncError>;

    /// Sealed blocks in `[from_inclusive, to_exclusive)`.
    async fn get_miniblocks(
        &self,
        stream_id: &StreamId,
        from_inclusive: i64,
        to_exclusive: i64,
    ) -> Result<GetMiniblocksResponse, SyncError>;
}

/// [`MiniblockSource`] backed by a node, sharing one cancellation token
/// across all calls.
#[derive(Debug, Clone)]
pub struct RpcMiniblockSource {
    client: Arc<StreamRpcClient>,
    cancel: CancellationToken,
}

impl RpcMiniblockSource {
    pub fn new(client: Arc<StreamRpcClient>, cancel: CancellationToken) -> Self {
        Self { client, cancel }
    }
}

#[async_trait]
impl MiniblockSource for RpcMiniblockSource {
    async fn get_stream(&self, stream_id: &StreamId) -> Result<StreamAndCookie, SyncError> {
        let response = self.client.get_stream(stream_id.to_vec(), false, &self.cancel).await?;
        response.stream.ok_or(SyncError::StreamNotFound(*stream_id))
    }

    async fn get_miniblocks(
        &self,
        stream_id: &StreamId,
        from_inclusive: i64,
        to_exclusive: i64,
    ) -> Result<GetMiniblocksResponse, SyncError> {
        Ok(self
            .client
            .get_miniblocks(stream_id.to_vec(), from_inclusive, to_exclusive, &self.cancel)
            .await?)
    }
}
