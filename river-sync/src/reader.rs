//! Stream bootstrap and history pages.

use crate::boundary::{spawn_decryption_worker, GroupDecryptor};
use crate::error::SyncError;
use crate::source::MiniblockSource;
use river_kernel::codec::{unpack_miniblock, unpack_stream, UnpackOpts};
use river_kernel::{InitOptions, Notifier, ParsedMiniblock, StreamHandle, StreamStateView};
use river_model::StreamId;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const NOTIFY_CAPACITY: usize = 1024;

/// One page of older history.
#[derive(Debug, Default)]
pub struct MiniblocksPage {
    pub miniblocks: Vec<ParsedMiniblock>,
    /// Nothing older exists.
    pub terminus: bool,
}

/// Loads streams from a [`MiniblockSource`] into actor-owned views.
pub struct StreamReader {
    source: Arc<dyn MiniblockSource>,
    user_id: String,
    decryptor: Option<Arc<dyn GroupDecryptor>>,
    shutdown_token: CancellationToken,
}

impl std::fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader").field("user_id", &self.user_id).finish_non_exhaustive()
    }
}

impl StreamReader {
    pub fn new(source: Arc<dyn MiniblockSource>, user_id: impl Into<String>) -> Self {
        Self {
            source,
            user_id: user_id.into(),
            decryptor: None,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Decrypt content of every stream this reader loads.
    pub fn with_decryptor(mut self, decryptor: Arc<dyn GroupDecryptor>) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    pub fn source(&self) -> &Arc<dyn MiniblockSource> {
        &self.source
    }

    /// Fetch the stream, verify it and start an actor holding its view.
    #[tracing::instrument(skip(self, stream_id), fields(stream_id = %stream_id))]
    pub async fn get_stream(&self, stream_id: &StreamId) -> Result<StreamHandle, SyncError> {
        let stream = self.source.get_stream(stream_id).await?;
        let parsed = unpack_stream(Some(&stream), &UnpackOpts::default())?;

        let view = StreamStateView::new(self.user_id.clone(), *stream_id, Notifier::new(NOTIFY_CAPACITY));
        let handle = StreamHandle::spawn(view);
        if let Some(decryptor) = &self.decryptor {
            spawn_decryption_worker(
                handle.clone(),
                handle.subscribe_encryption(),
                Arc::clone(decryptor),
                self.shutdown_token.child_token(),
            );
        }

        if let Err(e) = handle.initialize(parsed, InitOptions::default()).await {
            handle.shutdown();
            return Err(e.into());
        }
        tracing::debug!(blocks = stream.miniblocks.len(), minipool = stream.events.len(), "stream loaded");
        Ok(handle)
    }

    /// Sealed blocks in `[from_inclusive, to_exclusive)`. Server-sealed
    /// history is unpacked without signature checks.
    #[tracing::instrument(skip(self, stream_id), fields(stream_id = %stream_id))]
    pub async fn get_miniblocks(
        &self,
        stream_id: &StreamId,
        from_inclusive: i64,
        to_exclusive: i64,
    ) -> Result<MiniblocksPage, SyncError> {
        if from_inclusive == to_exclusive {
            return Ok(MiniblocksPage { miniblocks: Vec::new(), terminus: to_exclusive == 0 });
        }

        let response = self.source.get_miniblocks(stream_id, from_inclusive, to_exclusive).await?;
        let opts = UnpackOpts::unchecked();
        let miniblocks = response
            .miniblocks
            .iter()
            .map(|mb| unpack_miniblock(mb, &opts))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MiniblocksPage { miniblocks, terminus: response.terminus })
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}
