//! StreamHandle - cloneable handle to a stream actor

use crate::actor::{StreamActor, StreamCmd};
use crate::codec::{ParsedEvent, ParsedMiniblock, ParsedStreamResponse};
use crate::error::StreamError;
use crate::notify::{EncryptionEvent, StreamStateEvent};
use crate::timeline::{DecryptedContent, DecryptionSessionError, LocalEventStatus};
use crate::view::{InitOptions, MiniblockInfo, StreamStateView};
use river_model::StreamId;
use river_proto::{ChannelMessage, SyncCookie};
use std::collections::BTreeSet;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Handle to one stream's actor. All mutations are serialized by the actor.
#[derive(Clone)]
pub struct StreamHandle {
    stream_id: StreamId,
    tx: mpsc::Sender<StreamCmd>,
    state_tx: broadcast::Sender<StreamStateEvent>,
    encryption_tx: broadcast::Sender<EncryptionEvent>,
    shutdown_token: CancellationToken,
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("stream_id", &self.stream_id)
            .finish_non_exhaustive()
    }
}

/// Runner for the stream actor. Must be spawned as a tokio task.
pub struct ActorRunner {
    actor: StreamActor,
    shutdown_token: CancellationToken,
}

impl ActorRunner {
    pub async fn run(self) {
        self.actor.run(self.shutdown_token).await;
    }
}

impl StreamHandle {
    /// Wrap `view` in an actor. The caller must run the returned runner.
    pub fn new(view: StreamStateView) -> (Self, ActorRunner) {
        let (tx, rx) = mpsc::channel(32);
        let shutdown_token = CancellationToken::new();
        let handle = Self {
            stream_id: *view.stream_id(),
            tx,
            state_tx: view.notifier().state_sender(),
            encryption_tx: view.notifier().encryption_sender(),
            shutdown_token: shutdown_token.clone(),
        };
        let runner = ActorRunner { actor: StreamActor::new(view, rx), shutdown_token };
        (handle, runner)
    }

    /// Wrap `view` and spawn its actor on the current runtime.
    pub fn spawn(view: StreamStateView) -> Self {
        let (handle, runner) = Self::new(view);
        tokio::spawn(runner.run());
        handle
    }

    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    pub fn subscribe_state(&self) -> broadcast::Receiver<StreamStateEvent> {
        self.state_tx.subscribe()
    }

    pub fn subscribe_encryption(&self) -> broadcast::Receiver<EncryptionEvent> {
        self.encryption_tx.subscribe()
    }

    /// Request actor shutdown (non-blocking).
    ///
    /// Queues a `Shutdown` command; if the queue is full the cancellation
    /// token stops the actor immediately.
    pub fn shutdown(&self) {
        use tokio::sync::mpsc::error::TrySendError;

        match self.tx.try_send(StreamCmd::Shutdown) {
            Ok(_) => {}
            Err(TrySendError::Full(_)) => {
                self.shutdown_token.cancel();
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Shut down and wait for the actor to exit.
    pub async fn close(&self) {
        self.shutdown();
        self.tx.closed().await;
    }

    async fn request<T>(&self, cmd: StreamCmd, rx: oneshot::Receiver<T>) -> Result<T, StreamError> {
        self.tx.send(cmd).await.map_err(|_| StreamError::ChannelClosed)?;
        rx.await.map_err(|_| StreamError::ChannelClosed)
    }

    pub async fn initialize(&self, response: ParsedStreamResponse, opts: InitOptions) -> Result<(), StreamError> {
        let (resp, rx) = oneshot::channel();
        let cmd = StreamCmd::Initialize { response: Box::new(response), opts, resp };
        Ok(self.request(cmd, rx).await??)
    }

    pub async fn append_events(&self, events: Vec<ParsedEvent>, next_sync_cookie: SyncCookie) -> Result<(), StreamError> {
        let (resp, rx) = oneshot::channel();
        Ok(self.request(StreamCmd::AppendEvents { events, next_sync_cookie, resp }, rx).await??)
    }

    pub async fn prepend_events(&self, miniblocks: Vec<ParsedMiniblock>, terminus: bool) -> Result<(), StreamError> {
        let (resp, rx) = oneshot::channel();
        Ok(self.request(StreamCmd::PrependEvents { miniblocks, terminus, resp }, rx).await??)
    }

    /// Prepend only if nothing moved the loaded range since `expected_min`
    /// was read. Returns false when the batch was discarded.
    pub async fn prepend_if_min_unchanged(
        &self,
        expected_min: i64,
        miniblocks: Vec<ParsedMiniblock>,
        terminus: bool,
    ) -> Result<bool, StreamError> {
        let (resp, rx) = oneshot::channel();
        let cmd = StreamCmd::PrependIfMinUnchanged { expected_min, miniblocks, terminus, resp };
        Ok(self.request(cmd, rx).await??)
    }

    pub async fn update_decrypted_content(&self, event_id: String, content: DecryptedContent) -> Result<(), StreamError> {
        self.tx
            .send(StreamCmd::UpdateDecryptedContent { event_id, content })
            .await
            .map_err(|_| StreamError::ChannelClosed)
    }

    pub async fn update_decrypted_content_error(
        &self,
        event_id: String,
        error: DecryptionSessionError,
    ) -> Result<(), StreamError> {
        self.tx
            .send(StreamCmd::UpdateDecryptedContentError { event_id, error })
            .await
            .map_err(|_| StreamError::ChannelClosed)
    }

    pub async fn append_local_event(
        &self,
        channel_message: ChannelMessage,
        status: LocalEventStatus,
    ) -> Result<String, StreamError> {
        let (resp, rx) = oneshot::channel();
        self.request(StreamCmd::AppendLocalEvent { channel_message, status, resp }, rx).await
    }

    pub async fn update_local_event(
        &self,
        local_id: String,
        hash_str: String,
        status: LocalEventStatus,
    ) -> Result<(), StreamError> {
        let (resp, rx) = oneshot::channel();
        Ok(self.request(StreamCmd::UpdateLocalEvent { local_id, hash_str, status, resp }, rx).await??)
    }

    pub async fn miniblock_info(&self) -> Result<Option<MiniblockInfo>, StreamError> {
        let (resp, rx) = oneshot::channel();
        self.request(StreamCmd::MiniblockInfo { resp }, rx).await
    }

    pub async fn users_entitled_to_key_exchange(&self) -> Result<BTreeSet<String>, StreamError> {
        let (resp, rx) = oneshot::channel();
        self.request(StreamCmd::UsersEntitledToKeyExchange { resp }, rx).await
    }

    /// Run `f` against the view on the actor task and return its result.
    pub async fn read<T, F>(&self, f: F) -> Result<T, StreamError>
    where
        T: Send + 'static,
        F: FnOnce(&StreamStateView) -> T + Send + 'static,
    {
        let (resp, rx) = oneshot::channel();
        let f = Box::new(move |view: &StreamStateView| {
            let _ = resp.send(f(view));
        });
        self.request(StreamCmd::Read { f }, rx).await
    }
}
