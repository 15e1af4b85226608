//! Stream notifications
//!
//! Two categories, each on its own tokio broadcast channel: state changes
//! for UI-facing consumers and encryption hand-offs for the group-encryption
//! subsystem. Sends are synchronous and never block the state machine.

use crate::members::KeySolicitationContent;
use crate::timeline::StreamTimelineEvent;
use river_model::StreamId;
use river_proto::{
    user_device_key_payload::EncryptionDevice, user_inbox_payload::GroupEncryptionSessions,
    EncryptedData, MembershipOp,
};
use tokio::sync::broadcast;

/// Hash-string ids touched by one timeline mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineChange {
    pub prepended: Vec<String>,
    pub appended: Vec<String>,
    pub updated: Vec<String>,
    pub confirmed: Vec<String>,
}

impl TimelineChange {
    pub fn is_empty(&self) -> bool {
        self.prepended.is_empty() && self.appended.is_empty() && self.updated.is_empty() && self.confirmed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamStateEvent {
    Initialized { stream_id: StreamId },
    Updated { stream_id: StreamId, change: TimelineChange },
    LocalEventUpdated { stream_id: StreamId, previous_id: String, event: Box<StreamTimelineEvent> },
    EventDecrypted { stream_id: StreamId, event_id: String },

    // membership
    NewUserJoined { stream_id: StreamId, user_id: String },
    NewUserInvited { stream_id: StreamId, user_id: String },
    UserLeft { stream_id: StreamId, user_id: String },
    MembershipUpdated { stream_id: StreamId, user_id: String },
    PendingMembershipUpdated { stream_id: StreamId, user_id: String },

    // member metadata
    UsernameUpdated { stream_id: StreamId, user_id: String },
    DisplayNameUpdated { stream_id: StreamId, user_id: String },
    EnsAddressUpdated { stream_id: StreamId, user_id: String },
    NftUpdated { stream_id: StreamId, user_id: String },

    // space
    SpaceChannelCreated { stream_id: StreamId, channel_id: StreamId },
    SpaceChannelUpdated { stream_id: StreamId, channel_id: StreamId, updated_at_event_num: i64 },
    SpaceChannelDeleted { stream_id: StreamId, channel_id: StreamId },

    // channels and group DMs
    ChannelMessageRedacted { stream_id: StreamId, ref_event_id: String },
    ChannelPropertiesUpdated { stream_id: StreamId },

    // media
    MediaChunkReceived { stream_id: StreamId, chunk_index: i32 },

    // user streams
    UserStreamMembershipChanged { stream_id: StreamId, target_stream_id: StreamId, op: MembershipOp },
    UserInvitedToStream { stream_id: StreamId, target_stream_id: StreamId },
    UserJoinedStream { stream_id: StreamId, target_stream_id: StreamId },
    UserLeftStream { stream_id: StreamId, target_stream_id: StreamId },
    FullyReadMarkersUpdated { stream_id: StreamId, channel_id: StreamId },
    UserBlockUpdated { stream_id: StreamId, user_id: String, is_blocked: bool },
    DeviceSummaryUpdated { stream_id: StreamId, device_key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptedContentKind {
    ChannelMessage,
    ChannelProperties,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncryptionEvent {
    NewEncryptedContent {
        stream_id: StreamId,
        event_id: String,
        kind: EncryptedContentKind,
        content: EncryptedData,
    },
    InitKeySolicitations {
        stream_id: StreamId,
        members: Vec<(String, Vec<KeySolicitationContent>)>,
    },
    NewKeySolicitation {
        stream_id: StreamId,
        from_user_id: String,
        solicitation: KeySolicitationContent,
    },
    UpdatedKeySolicitation {
        stream_id: StreamId,
        from_user_id: String,
        solicitation: KeySolicitationContent,
    },
    NewGroupSessions {
        stream_id: StreamId,
        sender_user_id: String,
        sessions: GroupEncryptionSessions,
    },
    UserDeviceKeysUpdated {
        stream_id: StreamId,
        user_id: String,
        devices: Vec<EncryptionDevice>,
    },
}

/// Fan-out for both notification categories.
///
/// State notifications can be muted while a view replays its initial
/// history; encryption hand-offs always go out.
#[derive(Debug, Clone)]
pub struct Notifier {
    state_tx: broadcast::Sender<StreamStateEvent>,
    encryption_tx: broadcast::Sender<EncryptionEvent>,
    state_muted: bool,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (state_tx, _) = broadcast::channel(capacity);
        let (encryption_tx, _) = broadcast::channel(capacity);
        Self { state_tx, encryption_tx, state_muted: false }
    }

    pub fn from_senders(
        state_tx: broadcast::Sender<StreamStateEvent>,
        encryption_tx: broadcast::Sender<EncryptionEvent>,
    ) -> Self {
        Self { state_tx, encryption_tx, state_muted: false }
    }

    pub fn subscribe_state(&self) -> broadcast::Receiver<StreamStateEvent> {
        self.state_tx.subscribe()
    }

    pub fn subscribe_encryption(&self) -> broadcast::Receiver<EncryptionEvent> {
        self.encryption_tx.subscribe()
    }

    pub fn state_sender(&self) -> broadcast::Sender<StreamStateEvent> {
        self.state_tx.clone()
    }

    pub fn encryption_sender(&self) -> broadcast::Sender<EncryptionEvent> {
        self.encryption_tx.clone()
    }

    pub(crate) fn set_state_muted(&mut self, muted: bool) {
        self.state_muted = muted;
    }

    pub fn state(&self, event: StreamStateEvent) {
        if self.state_muted {
            return;
        }
        // No receivers is fine
        let _ = self.state_tx.send(event);
    }

    /// Emit regardless of muting (stream initialized).
    pub(crate) fn state_always(&self, event: StreamStateEvent) {
        let _ = self.state_tx.send(event);
    }

    pub fn encryption(&self, event: EncryptionEvent) {
        let _ = self.encryption_tx.send(event);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use river_model::StreamKind;

    #[test]
    fn test_muted_state_still_sends_encryption() {
        let mut notifier = Notifier::new(8);
        let mut state_rx = notifier.subscribe_state();
        let mut enc_rx = notifier.subscribe_encryption();
        let stream_id = StreamId::random(StreamKind::Channel);

        notifier.set_state_muted(true);
        notifier.state(StreamStateEvent::Initialized { stream_id });
        notifier.encryption(EncryptionEvent::InitKeySolicitations { stream_id, members: vec![] });
        assert!(state_rx.try_recv().is_err());
        assert!(enc_rx.try_recv().is_ok());

        notifier.state_always(StreamStateEvent::Initialized { stream_id });
        assert_eq!(state_rx.try_recv().unwrap(), StreamStateEvent::Initialized { stream_id });
    }
}
