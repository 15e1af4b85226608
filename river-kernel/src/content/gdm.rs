use super::channel::{notify_client_redaction, request_message_decryption};
use super::{unexpected_payload, unexpected_snapshot, ContentProjection};
use crate::error::RiverError;
use crate::notify::{EncryptedContentKind, EncryptionEvent, Notifier, StreamStateEvent};
use crate::timeline::{DecryptedContent, StreamTimelineEvent};
use river_model::{StreamId, StreamKind};
use river_proto::{gdm_channel_payload, snapshot, stream_event, ChannelProperties, EncryptedData, Snapshot};

/// Group DM: encrypted messages plus encrypted name/topic.
#[derive(Debug, Clone)]
pub struct GdmContent {
    pub stream_id: StreamId,
    pub channel_properties: Option<ChannelProperties>,
    /// Event whose properties are the latest known; older decryptions are ignored.
    pub channel_properties_event_id: Option<String>,
    pub last_event_created_at_epoch_ms: i64,
}

impl GdmContent {
    pub fn new(stream_id: StreamId) -> Self {
        Self {
            stream_id,
            channel_properties: None,
            channel_properties_event_id: None,
            last_event_created_at_epoch_ms: 0,
        }
    }

    fn request_properties(&mut self, event_id: String, data: &EncryptedData, notifier: &Notifier) {
        self.channel_properties_event_id = Some(event_id.clone());
        notifier.encryption(EncryptionEvent::NewEncryptedContent {
            stream_id: self.stream_id,
            event_id,
            kind: EncryptedContentKind::ChannelProperties,
            content: data.clone(),
        });
    }

    fn apply(&mut self, event: &StreamTimelineEvent, latest: bool, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::GdmChannelPayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::Gdm, event));
        };
        match &payload.content {
            Some(gdm_channel_payload::Content::Message(data)) => {
                request_message_decryption(&self.stream_id, event, data, notifier);
            }
            Some(gdm_channel_payload::Content::ChannelProperties(data)) => {
                if latest || self.channel_properties_event_id.is_none() {
                    self.request_properties(event.hash_str.clone(), data, notifier);
                }
            }
            Some(gdm_channel_payload::Content::Inception(inception)) => {
                if let (Some(data), None) = (&inception.channel_properties, &self.channel_properties_event_id) {
                    self.request_properties(event.hash_str.clone(), data, notifier);
                }
            }
            None => {}
        }
        Ok(())
    }
}

impl ContentProjection for GdmContent {
    fn apply_snapshot(&mut self, _event_id: &str, snapshot: &Snapshot, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(snapshot::Content::GdmChannelContent(content)) = &snapshot.content else {
            return Err(unexpected_snapshot(StreamKind::Gdm));
        };
        if let Some(wrapped) = &content.channel_properties {
            if let Some(data) = &wrapped.data {
                self.request_properties(hex::encode(&wrapped.event_hash), data, notifier);
            }
        }
        Ok(())
    }

    fn append_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        self.last_event_created_at_epoch_ms = self.last_event_created_at_epoch_ms.max(event.created_at_epoch_ms);
        self.apply(event, true, notifier)
    }

    fn prepend_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        self.apply(event, false, notifier)
    }

    fn on_decrypted_content(&mut self, event_id: &str, content: &DecryptedContent, notifier: &Notifier) {
        match content {
            DecryptedContent::ChannelProperties(props) => {
                if self.channel_properties_event_id.as_deref() == Some(event_id) {
                    self.channel_properties = Some(props.clone());
                    notifier.state(StreamStateEvent::ChannelPropertiesUpdated { stream_id: self.stream_id });
                }
            }
            other => notify_client_redaction(&self.stream_id, other, notifier),
        }
    }
}
