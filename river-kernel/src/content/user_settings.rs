use super::{stream_id_of, unexpected_payload, unexpected_snapshot, ContentProjection};
use crate::error::RiverError;
use crate::notify::{Notifier, StreamStateEvent};
use crate::timeline::StreamTimelineEvent;
use river_model::crypto::user_id_from_address;
use river_model::{Address, StreamId, StreamKind};
use river_proto::user_settings_payload::{self, FullyReadMarkers, UserBlock};
use river_proto::{snapshot, stream_event, ErrCode, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read position within a channel or thread, stored as JSON in settings events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FullyReadMarker {
    pub channel_id: String,
    pub thread_parent_id: Option<String>,
    pub event_id: String,
    pub event_num: i64,
    pub begin_unread_window: i64,
    pub end_unread_window: i64,
    pub is_unread: bool,
    pub marked_read_at_ts: i64,
    pub mentions: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEntry {
    pub is_blocked: bool,
    pub event_num: i64,
}

#[derive(Debug, Clone)]
pub struct UserSettingsContent {
    pub stream_id: StreamId,
    /// Markers per channel, keyed by channel or thread id.
    pub fully_read_markers: HashMap<StreamId, HashMap<String, FullyReadMarker>>,
    /// Block history per user, oldest first.
    pub user_blocks: HashMap<String, Vec<BlockEntry>>,
}

impl UserSettingsContent {
    pub fn new(stream_id: StreamId) -> Self {
        Self { stream_id, fully_read_markers: HashMap::new(), user_blocks: HashMap::new() }
    }

    pub fn is_user_blocked(&self, user_id: &str) -> bool {
        self.user_blocks
            .get(user_id)
            .and_then(|blocks| blocks.last())
            .is_some_and(|b| b.is_blocked)
    }

    fn apply_markers(&mut self, markers: &FullyReadMarkers, notifier: &Notifier) -> Result<(), RiverError> {
        let channel_id = stream_id_of(&markers.stream_id)?;
        let json = markers.content.as_ref().map(|c| c.data.as_str()).unwrap_or("{}");
        let parsed: HashMap<String, FullyReadMarker> = serde_json::from_str(json)
            .map_err(|e| RiverError::new(ErrCode::BadPayload, format!("bad fully read markers: {}", e)))?;
        self.fully_read_markers.insert(channel_id, parsed);
        notifier.state(StreamStateEvent::FullyReadMarkersUpdated { stream_id: self.stream_id, channel_id });
        Ok(())
    }

    fn apply_block(&mut self, block: &UserBlock, notifier: &Notifier) -> Result<(), RiverError> {
        let user_id = blocked_user_id(&block.user_id)?;
        self.user_blocks
            .entry(user_id.clone())
            .or_default()
            .push(BlockEntry { is_blocked: block.is_blocked, event_num: block.event_num });
        notifier.state(StreamStateEvent::UserBlockUpdated {
            stream_id: self.stream_id,
            user_id,
            is_blocked: block.is_blocked,
        });
        Ok(())
    }
}

fn blocked_user_id(address: &[u8]) -> Result<String, RiverError> {
    let addr = Address::try_from(address)
        .map_err(|_| RiverError::new(ErrCode::BadAddress, format!("bad blocked user address length {}", address.len())))?;
    Ok(user_id_from_address(&addr))
}

impl ContentProjection for UserSettingsContent {
    fn apply_snapshot(&mut self, _event_id: &str, snapshot: &Snapshot, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(snapshot::Content::UserSettingsContent(content)) = &snapshot.content else {
            return Err(unexpected_snapshot(StreamKind::UserSettings));
        };
        for markers in &content.fully_read_markers {
            self.apply_markers(markers, notifier)?;
        }
        for list in &content.user_blocks_list {
            let user_id = blocked_user_id(&list.user_id)?;
            let entries = list
                .blocks
                .iter()
                .map(|b| BlockEntry { is_blocked: b.is_blocked, event_num: b.event_num })
                .collect();
            self.user_blocks.insert(user_id, entries);
        }
        Ok(())
    }

    fn append_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::UserSettingsPayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::UserSettings, event));
        };
        match &payload.content {
            Some(user_settings_payload::Content::FullyReadMarkers(markers)) => self.apply_markers(markers, notifier),
            Some(user_settings_payload::Content::UserBlock(block)) => self.apply_block(block, notifier),
            Some(user_settings_payload::Content::Inception(_)) | None => Ok(()),
        }
    }

    fn prepend_event(&mut self, event: &StreamTimelineEvent, _notifier: &Notifier) -> Result<(), RiverError> {
        match event.payload() {
            Some(stream_event::Payload::UserSettingsPayload(_)) => Ok(()),
            _ => Err(unexpected_payload(StreamKind::UserSettings, event)),
        }
    }
}
