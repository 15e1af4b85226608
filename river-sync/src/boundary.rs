//! External collaborators: the entitlement layer and the group-encryption
//! subsystem. Only their interfaces live here.

use crate::error::SyncError;
use async_trait::async_trait;
use river_kernel::notify::EncryptedContentKind;
use river_kernel::{DecryptedContent, DecryptionSessionError, EncryptionEvent, StreamHandle};
use river_model::{StreamId, StreamKind};
use river_proto::EncryptedData;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Read,
    Write,
    React,
    Redact,
    Ban,
}

#[async_trait]
pub trait EntitlementChecker: Send + Sync {
    async fn is_entitled(
        &self,
        space_id: Option<&StreamId>,
        channel_id: Option<&StreamId>,
        user_id: &str,
        permission: Permission,
    ) -> bool;
}

/// Opaque decrypt boundary. A missing group session comes back as a
/// structured error, not a failure of the call.
#[async_trait]
pub trait GroupDecryptor: Send + Sync {
    async fn decrypt(
        &self,
        stream_id: &StreamId,
        kind: EncryptedContentKind,
        content: &EncryptedData,
    ) -> Result<DecryptedContent, DecryptionSessionError>;
}

/// Users who may receive keys for this stream: the view's candidate set
/// filtered through the entitlement layer with `Read` permission.
pub async fn entitled_key_exchange_users(
    handle: &StreamHandle,
    checker: &dyn EntitlementChecker,
) -> Result<BTreeSet<String>, SyncError> {
    let stream_id = *handle.stream_id();
    let candidates = handle.users_entitled_to_key_exchange().await?;
    let (space_id, channel_id) = match stream_id.kind() {
        StreamKind::Space => (Some(stream_id), None),
        StreamKind::Channel => {
            let space_id = handle
                .read(|v| v.get_content().as_channel().and_then(|c| c.space_id))
                .await?;
            (space_id, Some(stream_id))
        }
        _ => (None, Some(stream_id)),
    };

    let mut entitled = BTreeSet::new();
    for user_id in candidates {
        if checker
            .is_entitled(space_id.as_ref(), channel_id.as_ref(), &user_id, Permission::Read)
            .await
        {
            entitled.insert(user_id);
        } else {
            tracing::debug!(stream_id = %stream_id, user_id = %user_id, "not entitled to key exchange");
        }
    }
    Ok(entitled)
}

/// Feed every encrypted item announced by `handle` through `decryptor` and
/// write the outcome back to the view. Stops on cancel or when the stream
/// actor goes away.
///
/// Subscribe before initializing the stream so replayed history is seen.
pub fn spawn_decryption_worker(
    handle: StreamHandle,
    mut events: broadcast::Receiver<EncryptionEvent>,
    decryptor: Arc<dyn GroupDecryptor>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };
            let (stream_id, event_id, kind, content) = match event {
                Ok(EncryptionEvent::NewEncryptedContent { stream_id, event_id, kind, content }) => {
                    (stream_id, event_id, kind, content)
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(stream_id = %handle.stream_id(), skipped, "decryption worker lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let result = match decryptor.decrypt(&stream_id, kind, &content).await {
                Ok(plaintext) => handle.update_decrypted_content(event_id, plaintext).await,
                Err(error) => handle.update_decrypted_content_error(event_id, error).await,
            };
            if result.is_err() {
                break;
            }
        }
    })
}
