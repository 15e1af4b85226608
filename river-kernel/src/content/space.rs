use super::{stream_id_of, unexpected_payload, unexpected_snapshot, ContentProjection};
use crate::error::RiverError;
use crate::notify::{Notifier, StreamStateEvent};
use crate::timeline::StreamTimelineEvent;
use river_model::{StreamId, StreamKind};
use river_proto::space_payload::{self, ChannelUpdate};
use river_proto::{snapshot, stream_event, ChannelOp, ErrCode, Snapshot};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceChannelMetadata {
    pub is_default: bool,
    pub updated_at_event_num: i64,
}

#[derive(Debug, Clone)]
pub struct SpaceContent {
    pub stream_id: StreamId,
    pub space_channels_metadata: HashMap<StreamId, SpaceChannelMetadata>,
}

impl SpaceContent {
    pub fn new(stream_id: StreamId) -> Self {
        Self { stream_id, space_channels_metadata: HashMap::new() }
    }

    pub fn channel_ids(&self) -> impl Iterator<Item = &StreamId> {
        self.space_channels_metadata.keys()
    }

    fn apply_channel(&mut self, op: ChannelOp, channel_id: StreamId, event_num: i64, notifier: &Notifier) -> Result<(), RiverError> {
        let stream_id = self.stream_id;
        match op {
            ChannelOp::CoCreated => {
                self.space_channels_metadata.insert(
                    channel_id,
                    SpaceChannelMetadata { is_default: channel_id.is_default_channel(), updated_at_event_num: event_num },
                );
                notifier.state(StreamStateEvent::SpaceChannelCreated { stream_id, channel_id });
            }
            ChannelOp::CoUpdated => {
                let meta = self.space_channels_metadata.get_mut(&channel_id).ok_or_else(|| {
                    RiverError::new(ErrCode::StreamBadEvent, format!("update of unknown channel {}", channel_id))
                })?;
                meta.updated_at_event_num = event_num;
                notifier.state(StreamStateEvent::SpaceChannelUpdated { stream_id, channel_id, updated_at_event_num: event_num });
            }
            ChannelOp::CoDeleted => {
                self.space_channels_metadata.remove(&channel_id);
                notifier.state(StreamStateEvent::SpaceChannelDeleted { stream_id, channel_id });
            }
            ChannelOp::CoUnspecified => {
                return Err(RiverError::new(ErrCode::BadPayload, "unspecified channel op"));
            }
        }
        Ok(())
    }

    fn apply_update(&mut self, update: &ChannelUpdate, event_num: i64, notifier: &Notifier) -> Result<(), RiverError> {
        let op = ChannelOp::try_from(update.op).unwrap_or(ChannelOp::CoUnspecified);
        self.apply_channel(op, stream_id_of(&update.channel_id)?, event_num, notifier)
    }
}

impl ContentProjection for SpaceContent {
    fn apply_snapshot(&mut self, _event_id: &str, snapshot: &Snapshot, _notifier: &Notifier) -> Result<(), RiverError> {
        let Some(snapshot::Content::SpaceContent(content)) = &snapshot.content else {
            return Err(unexpected_snapshot(StreamKind::Space));
        };
        for channel in &content.channels {
            let channel_id = stream_id_of(&channel.channel_id)?;
            self.space_channels_metadata.insert(
                channel_id,
                SpaceChannelMetadata {
                    is_default: channel_id.is_default_channel(),
                    updated_at_event_num: channel.updated_at_event_num,
                },
            );
        }
        Ok(())
    }

    fn append_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::SpacePayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::Space, event));
        };
        match &payload.content {
            Some(space_payload::Content::Channel(update)) => self.apply_update(update, event.event_num, notifier),
            Some(space_payload::Content::Inception(_)) | None => Ok(()),
        }
    }

    fn prepend_event(&mut self, event: &StreamTimelineEvent, _notifier: &Notifier) -> Result<(), RiverError> {
        match event.payload() {
            Some(stream_event::Payload::SpacePayload(_)) => Ok(()),
            _ => Err(unexpected_payload(StreamKind::Space, event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_lifecycle() {
        let space = StreamId::random(StreamKind::Space);
        let channel = StreamId::unique_channel(&space);
        let notifier = Notifier::new(16);
        let mut content = SpaceContent::new(space);

        content.apply_channel(ChannelOp::CoCreated, channel, 3, &notifier).unwrap();
        assert_eq!(content.space_channels_metadata[&channel].updated_at_event_num, 3);

        content.apply_channel(ChannelOp::CoUpdated, channel, 9, &notifier).unwrap();
        assert_eq!(content.space_channels_metadata[&channel].updated_at_event_num, 9);

        content.apply_channel(ChannelOp::CoDeleted, channel, 10, &notifier).unwrap();
        assert!(content.space_channels_metadata.is_empty());
    }

    #[test]
    fn test_update_unknown_channel_fails() {
        let space = StreamId::random(StreamKind::Space);
        let notifier = Notifier::new(16);
        let mut content = SpaceContent::new(space);
        let err = content
            .apply_channel(ChannelOp::CoUpdated, StreamId::unique_channel(&space), 1, &notifier)
            .unwrap_err();
        assert_eq!(err.code, ErrCode::StreamBadEvent);
    }
}
