use super::{unexpected_payload, unexpected_snapshot, ContentProjection};
use crate::error::RiverError;
use crate::notify::{EncryptionEvent, Notifier, StreamStateEvent};
use crate::timeline::StreamTimelineEvent;
use river_model::{StreamId, StreamKind};
use river_proto::user_inbox_payload::{self, snapshot::DeviceSummary, Ack, GroupEncryptionSessions};
use river_proto::{snapshot, stream_event, Snapshot};
use std::collections::HashMap;

/// Per-device inbox: key material addressed to this user's devices.
#[derive(Debug, Clone)]
pub struct UserInboxContent {
    pub stream_id: StreamId,
    /// Miniblock range per device key that still holds undelivered sessions.
    pub device_summary: HashMap<String, DeviceSummary>,
}

impl UserInboxContent {
    pub fn new(stream_id: StreamId) -> Self {
        Self { stream_id, device_summary: HashMap::new() }
    }

    fn forward_sessions(&self, event: &StreamTimelineEvent, sessions: &GroupEncryptionSessions, notifier: &Notifier) {
        notifier.encryption(EncryptionEvent::NewGroupSessions {
            stream_id: self.stream_id,
            sender_user_id: event.creator_user_id.clone(),
            sessions: sessions.clone(),
        });
    }

    /// Each recipient device now has pending material up to `miniblock_num`.
    fn extend_summaries(&mut self, sessions: &GroupEncryptionSessions, miniblock_num: i64, notifier: &Notifier) {
        let mut keys: Vec<&String> = sessions.ciphertexts.keys().collect();
        keys.sort();
        for device_key in keys {
            let summary = self
                .device_summary
                .entry(device_key.clone())
                .or_insert(DeviceSummary { lower_bound: miniblock_num, upper_bound: miniblock_num });
            summary.upper_bound = miniblock_num;
            notifier.state(StreamStateEvent::DeviceSummaryUpdated {
                stream_id: self.stream_id,
                device_key: device_key.clone(),
            });
        }
    }

    /// Drop everything the device acknowledged.
    fn apply_ack(&mut self, ack: &Ack, notifier: &Notifier) {
        let Some(summary) = self.device_summary.get_mut(&ack.device_key) else {
            return;
        };
        if summary.upper_bound <= ack.miniblock_num {
            self.device_summary.remove(&ack.device_key);
        } else {
            summary.lower_bound = ack.miniblock_num + 1;
        }
        notifier.state(StreamStateEvent::DeviceSummaryUpdated {
            stream_id: self.stream_id,
            device_key: ack.device_key.clone(),
        });
    }
}

impl ContentProjection for UserInboxContent {
    fn apply_snapshot(&mut self, _event_id: &str, snapshot: &Snapshot, _notifier: &Notifier) -> Result<(), RiverError> {
        let Some(snapshot::Content::UserInboxContent(content)) = &snapshot.content else {
            return Err(unexpected_snapshot(StreamKind::UserInbox));
        };
        self.device_summary = content.device_summary.clone();
        Ok(())
    }

    fn append_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::UserInboxPayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::UserInbox, event));
        };
        match &payload.content {
            Some(user_inbox_payload::Content::GroupEncryptionSessions(sessions)) => {
                self.forward_sessions(event, sessions, notifier);
            }
            Some(user_inbox_payload::Content::Ack(ack)) => self.apply_ack(ack, notifier),
            Some(user_inbox_payload::Content::Inception(_)) | None => {}
        }
        Ok(())
    }

    fn prepend_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::UserInboxPayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::UserInbox, event));
        };
        if let Some(user_inbox_payload::Content::GroupEncryptionSessions(sessions)) = &payload.content {
            self.forward_sessions(event, sessions, notifier);
        }
        Ok(())
    }

    fn on_confirmed_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) {
        let (Some(stream_event::Payload::UserInboxPayload(payload)), Some(miniblock_num)) =
            (event.payload(), event.miniblock_num())
        else {
            return;
        };
        if let Some(user_inbox_payload::Content::GroupEncryptionSessions(sessions)) = &payload.content {
            self.extend_summaries(sessions, miniblock_num, notifier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions_for(devices: &[&str]) -> GroupEncryptionSessions {
        GroupEncryptionSessions {
            ciphertexts: devices.iter().map(|d| (d.to_string(), "ct".to_string())).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_extends_then_trims() {
        let notifier = Notifier::new(16);
        let mut inbox = UserInboxContent::new(StreamId::random(StreamKind::UserInbox));

        inbox.extend_summaries(&sessions_for(&["d1", "d2"]), 4, &notifier);
        inbox.extend_summaries(&sessions_for(&["d1"]), 9, &notifier);
        assert_eq!(inbox.device_summary["d1"], DeviceSummary { lower_bound: 4, upper_bound: 9 });

        inbox.apply_ack(&Ack { device_key: "d1".into(), miniblock_num: 5 }, &notifier);
        assert_eq!(inbox.device_summary["d1"].lower_bound, 6);

        inbox.apply_ack(&Ack { device_key: "d2".into(), miniblock_num: 4 }, &notifier);
        assert!(!inbox.device_summary.contains_key("d2"));

        inbox.apply_ack(&Ack { device_key: "unknown".into(), miniblock_num: 1 }, &notifier);
        assert_eq!(inbox.device_summary.len(), 1);
    }
}
