use super::channel::{notify_client_redaction, request_message_decryption};
use super::{unexpected_payload, unexpected_snapshot, ContentProjection};
use crate::error::RiverError;
use crate::notify::Notifier;
use crate::timeline::{DecryptedContent, StreamTimelineEvent};
use river_model::crypto::user_id_from_address;
use river_model::{Address, StreamId, StreamKind};
use river_proto::{dm_channel_payload, snapshot, stream_event, ErrCode, Snapshot};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct DmContent {
    pub stream_id: StreamId,
    pub first_party_id: Option<String>,
    pub second_party_id: Option<String>,
    pub last_event_created_at_epoch_ms: i64,
}

impl DmContent {
    pub fn new(stream_id: StreamId) -> Self {
        Self { stream_id, first_party_id: None, second_party_id: None, last_event_created_at_epoch_ms: 0 }
    }

    /// Both parties, whatever their membership.
    pub fn participants(&self) -> BTreeSet<String> {
        self.first_party_id.iter().chain(self.second_party_id.iter()).cloned().collect()
    }

    fn apply_inception(&mut self, inception: &dm_channel_payload::Inception) -> Result<(), RiverError> {
        self.first_party_id = Some(party(&inception.first_party_address)?);
        self.second_party_id = Some(party(&inception.second_party_address)?);
        Ok(())
    }

    fn apply(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::DmChannelPayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::Dm, event));
        };
        match &payload.content {
            Some(dm_channel_payload::Content::Inception(inception)) => self.apply_inception(inception)?,
            Some(dm_channel_payload::Content::Message(data)) => {
                request_message_decryption(&self.stream_id, event, data, notifier);
            }
            None => {}
        }
        Ok(())
    }
}

fn party(address: &[u8]) -> Result<String, RiverError> {
    let addr = Address::try_from(address)
        .map_err(|_| RiverError::new(ErrCode::BadAddress, format!("bad dm party address length {}", address.len())))?;
    Ok(user_id_from_address(&addr))
}

impl ContentProjection for DmContent {
    fn apply_snapshot(&mut self, _event_id: &str, snapshot: &Snapshot, _notifier: &Notifier) -> Result<(), RiverError> {
        let Some(snapshot::Content::DmChannelContent(content)) = &snapshot.content else {
            return Err(unexpected_snapshot(StreamKind::Dm));
        };
        if let Some(inception) = &content.inception {
            self.apply_inception(inception)?;
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
