//! StreamActor - task that owns one StreamStateView and applies commands in order

use crate::codec::{ParsedEvent, ParsedMiniblock, ParsedStreamResponse};
use crate::error::RiverError;
use crate::timeline::{DecryptedContent, DecryptionSessionError, LocalEventStatus};
use crate::view::{InitOptions, MiniblockInfo, StreamStateView};
use river_proto::{ChannelMessage, SyncCookie};
use std::collections::BTreeSet;
use tokio::sync::{mpsc, oneshot};

/// Read-only access to the view, run on the actor task.
pub type ReadFn = Box<dyn FnOnce(&StreamStateView) + Send>;

/// Commands sent to the StreamActor
pub enum StreamCmd {
    /// Build state from a bootstrap response
    Initialize {
        response: Box<ParsedStreamResponse>,
        opts: InitOptions,
        resp: oneshot::Sender<Result<(), RiverError>>,
    },
    /// Apply live events and advance the sync cookie
    AppendEvents {
        events: Vec<ParsedEvent>,
        next_sync_cookie: SyncCookie,
        resp: oneshot::Sender<Result<(), RiverError>>,
    },
    /// Insert older miniblocks
    PrependEvents {
        miniblocks: Vec<ParsedMiniblock>,
        terminus: bool,
        resp: oneshot::Sender<Result<(), RiverError>>,
    },
    /// Insert older miniblocks only if `miniblock_info.min` is still `expected_min`.
    /// Answers whether the batch was applied.
    PrependIfMinUnchanged {
        expected_min: i64,
        miniblocks: Vec<ParsedMiniblock>,
        terminus: bool,
        resp: oneshot::Sender<Result<bool, RiverError>>,
    },
    UpdateDecryptedContent {
        event_id: String,
        content: DecryptedContent,
    },
    UpdateDecryptedContentError {
        event_id: String,
        error: DecryptionSessionError,
    },
    AppendLocalEvent {
        channel_message: ChannelMessage,
        status: LocalEventStatus,
        resp: oneshot::Sender<String>,
    },
    UpdateLocalEvent {
        local_id: String,
        hash_str: String,
        status: LocalEventStatus,
        resp: oneshot::Sender<Result<(), RiverError>>,
    },
    MiniblockInfo {
        resp: oneshot::Sender<Option<MiniblockInfo>>,
    },
    UsersEntitledToKeyExchange {
        resp: oneshot::Sender<BTreeSet<String>>,
    },
    Read {
        f: ReadFn,
    },
    /// Shutdown the actor
    Shutdown,
}

/// StreamActor - owns exactly one StreamStateView
pub struct StreamActor {
    view: StreamStateView,
    rx: mpsc::Receiver<StreamCmd>,
}

impl StreamActor {
    pub fn new(view: StreamStateView, rx: mpsc::Receiver<StreamCmd>) -> Self {
        Self { view, rx }
    }

    /// Run the actor loop - processes commands until Shutdown, cancellation, or channel closed
    pub async fn run(mut self, shutdown_token: tokio_util::sync::CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    break;
                }

                msg = self.rx.recv() => {
                    match msg {
                        Some(StreamCmd::Shutdown) => {
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            break;
                        }
                    }
                }
            }
        }
        tracing::debug!(stream_id = %self.view.stream_id(), "stream actor stopped");
    }

    fn handle_command(&mut self, cmd: StreamCmd) {
        match cmd {
            StreamCmd::Initialize { response, opts, resp } => {
                let _ = resp.send(self.view.initialize(*response, opts));
            }
            StreamCmd::AppendEvents { events, next_sync_cookie, resp } => {
                let _ = resp.send(self.view.append_events(events, next_sync_cookie));
            }
            StreamCmd::PrependEvents { miniblocks, terminus, resp } => {
                let _ = resp.send(self.view.prepend_events(miniblocks, terminus));
            }
            StreamCmd::PrependIfMinUnchanged { expected_min, miniblocks, terminus, resp } => {
                let current_min = self.view.miniblock_info().map(|i| i.min);
                if current_min != Some(expected_min) {
                    tracing::info!(
                        stream_id = %self.view.stream_id(),
                        expected_min,
                        ?current_min,
                        "miniblock range moved during fetch, discarding batch"
                    );
                    let _ = resp.send(Ok(false));
                    return;
                }
                let _ = resp.send(self.view.prepend_events(miniblocks, terminus).map(|()| true));
            }
            StreamCmd::UpdateDecryptedContent { event_id, content } => {
                self.view.update_decrypted_content(&event_id, content);
            }
            StreamCmd::UpdateDecryptedContentError { event_id, error } => {
                self.view.update_decrypted_content_error(&event_id, error);
            }
            StreamCmd::AppendLocalEvent { channel_message, status, resp } => {
                let _ = resp.send(self.view.append_local_event(channel_message, status));
            }
            StreamCmd::UpdateLocalEvent { local_id, hash_str, status, resp } => {
                let _ = resp.send(self.view.update_local_event(&local_id, &hash_str, status));
            }
            StreamCmd::MiniblockInfo { resp } => {
                let _ = resp.send(self.view.miniblock_info().copied());
            }
            StreamCmd::UsersEntitledToKeyExchange { resp } => {
                let _ = resp.send(self.view.get_users_entitled_to_key_exchange());
            }
            StreamCmd::Read { f } => f(&self.view),
            StreamCmd::Shutdown => {}
        }
    }
}
