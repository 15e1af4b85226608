use super::{stream_id_of, unexpected_payload, unexpected_snapshot, ContentProjection};
use crate::error::RiverError;
use crate::notify::{EncryptedContentKind, EncryptionEvent, Notifier, StreamStateEvent};
use crate::timeline::{DecryptedContent, StreamTimelineEvent};
use river_model::{StreamId, StreamKind};
use river_proto::{channel_message, channel_payload, snapshot, stream_event, EncryptedData, Snapshot};

#[derive(Debug, Clone)]
pub struct ChannelContent {
    pub stream_id: StreamId,
    pub space_id: Option<StreamId>,
    pub last_event_created_at_epoch_ms: i64,
}

impl ChannelContent {
    pub fn new(stream_id: StreamId) -> Self {
        Self { stream_id, space_id: None, last_event_created_at_epoch_ms: 0 }
    }

    fn apply(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::ChannelPayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::Channel, event));
        };
        match &payload.content {
            Some(channel_payload::Content::Inception(inception)) => {
                self.space_id = Some(stream_id_of(&inception.space_id)?);
            }
            Some(channel_payload::Content::Message(data)) => {
                request_message_decryption(&self.stream_id, event, data, notifier);
            }
            Some(channel_payload::Content::Redaction(redaction)) => {
                notifier.state(StreamStateEvent::ChannelMessageRedacted {
                    stream_id: self.stream_id,
                    ref_event_id: hex::encode(&redaction.event_id),
                });
            }
            None => {}
        }
        Ok(())
    }
}

pub(super) fn request_message_decryption(
    stream_id: &StreamId,
    event: &StreamTimelineEvent,
    data: &EncryptedData,
    notifier: &Notifier,
) {
    notifier.encryption(EncryptionEvent::NewEncryptedContent {
        stream_id: *stream_id,
        event_id: event.hash_str.clone(),
        kind: EncryptedContentKind::ChannelMessage,
        content: data.clone(),
    });
}

/// A decrypted redaction retracts the message it points at.
pub(super) fn notify_client_redaction(stream_id: &StreamId, content: &DecryptedContent, notifier: &Notifier) {
    if let DecryptedContent::ChannelMessage(message) = content {
        if let Some(channel_message::Payload::Redaction(redaction)) = &message.payload {
            notifier.state(StreamStateEvent::ChannelMessageRedacted {
                stream_id: *stream_id,
                ref_event_id: redaction.ref_event_id.clone(),
            });
        }
    }
}

impl ContentProjection for ChannelContent {
    fn apply_snapshot(&mut self, _event_id: &str, snapshot: &Snapshot, _notifier: &Notifier) -> Result<(), RiverError> {
        let Some(snapshot::Content::ChannelContent(content)) = &snapshot.content else {
            return Err(unexpected_snapshot(StreamKind::Channel));
        };
        if let Some(inception) = &content.inception {
            self.space_id = Some(stream_id_of(&inception.space_id)?);
        }
        Ok(())
    }

    fn append_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        self.last_event_created_at_epoch_ms = self.last_event_created_at_epoch_ms.max(event.created_at_epoch_ms);
        self.apply(event, notifier)
    }

    fn prepend_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        self.apply(event, notifier)
    }

    fn on_decrypted_content(&mut self, _event_id: &str, content: &DecryptedContent, notifier: &Notifier) {
        notify_client_redaction(&self.stream_id, content, notifier);
    }
}
