//! Per-kind content projections
//!
//! Each stream kind folds its own payload case into kind-specific state.
//! [`ContentView`] is the closed set, chosen once from the stream id.

mod channel;
mod dm;
mod gdm;
mod media;
mod space;
mod user;
mod user_device_keys;
mod user_inbox;
mod user_settings;

pub use channel::ChannelContent;
pub use dm::DmContent;
pub use gdm::GdmContent;
pub use media::MediaContent;
pub use space::{SpaceChannelMetadata, SpaceContent};
pub use user::UserContent;
pub use user_device_keys::UserDeviceKeysContent;
pub use user_inbox::UserInboxContent;
pub use user_settings::{FullyReadMarker, UserSettingsContent};

use crate::error::RiverError;
use crate::notify::Notifier;
use crate::timeline::{DecryptedContent, StreamTimelineEvent};
use river_model::{StreamId, StreamKind};
use river_proto::{ErrCode, Snapshot};

/// Capability surface shared by every content kind.
///
/// Snapshot, append and prepend are required. The hooks default to no-ops.
pub trait ContentProjection {
    fn apply_snapshot(&mut self, event_id: &str, snapshot: &Snapshot, notifier: &Notifier) -> Result<(), RiverError>;

    fn append_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError>;

    /// Older history. Most state is already in the snapshot.
    fn prepend_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError>;

    fn on_confirmed_event(&mut self, _event: &StreamTimelineEvent, _notifier: &Notifier) {}

    fn on_decrypted_content(&mut self, _event_id: &str, _content: &DecryptedContent, _notifier: &Notifier) {}

    fn on_append_local_event(&mut self, _event: &StreamTimelineEvent, _notifier: &Notifier) {}
}

/// Content state for one stream, one variant per [`StreamKind`].
#[derive(Debug, Clone)]
pub enum ContentView {
    Space(SpaceContent),
    Channel(ChannelContent),
    Dm(DmContent),
    Gdm(GdmContent),
    Media(MediaContent),
    User(UserContent),
    UserSettings(UserSettingsContent),
    UserDeviceKeys(UserDeviceKeysContent),
    UserInbox(UserInboxContent),
}

impl ContentView {
    pub fn new(stream_id: StreamId) -> Self {
        match stream_id.kind() {
            StreamKind::Space => ContentView::Space(SpaceContent::new(stream_id)),
            StreamKind::Channel => ContentView::Channel(ChannelContent::new(stream_id)),
            StreamKind::Dm => ContentView::Dm(DmContent::new(stream_id)),
            StreamKind::Gdm => ContentView::Gdm(GdmContent::new(stream_id)),
            StreamKind::Media => ContentView::Media(MediaContent::new(stream_id)),
            StreamKind::User => ContentView::User(UserContent::new(stream_id)),
            StreamKind::UserSettings => ContentView::UserSettings(UserSettingsContent::new(stream_id)),
            StreamKind::UserDeviceKeys => ContentView::UserDeviceKeys(UserDeviceKeysContent::new(stream_id)),
            StreamKind::UserInbox => ContentView::UserInbox(UserInboxContent::new(stream_id)),
        }
    }

    pub fn kind(&self) -> StreamKind {
        match self {
            ContentView::Space(_) => StreamKind::Space,
            ContentView::Channel(_) => StreamKind::Channel,
            ContentView::Dm(_) => StreamKind::Dm,
            ContentView::Gdm(_) => StreamKind::Gdm,
            ContentView::Media(_) => StreamKind::Media,
            ContentView::User(_) => StreamKind::User,
            ContentView::UserSettings(_) => StreamKind::UserSettings,
            ContentView::UserDeviceKeys(_) => StreamKind::UserDeviceKeys,
            ContentView::UserInbox(_) => StreamKind::UserInbox,
        }
    }

    pub(crate) fn projection_mut(&mut self) -> &mut dyn ContentProjection {
        match self {
            ContentView::Space(c) => c,
            ContentView::Channel(c) => c,
            ContentView::Dm(c) => c,
            ContentView::Gdm(c) => c,
            ContentView::Media(c) => c,
            ContentView::User(c) => c,
            ContentView::UserSettings(c) => c,
            ContentView::UserDeviceKeys(c) => c,
            ContentView::UserInbox(c) => c,
        }
    }

    pub fn as_space(&self) -> Option<&SpaceContent> {
        match self {
            ContentView::Space(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&ChannelContent> {
        match self {
            ContentView::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_dm(&self) -> Option<&DmContent> {
        match self {
            ContentView::Dm(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_gdm(&self) -> Option<&GdmContent> {
        match self {
            ContentView::Gdm(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_media(&self) -> Option<&MediaContent> {
        match self {
            ContentView::Media(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserContent> {
        match self {
            ContentView::User(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_user_settings(&self) -> Option<&UserSettingsContent> {
        match self {
            ContentView::UserSettings(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_user_device_keys(&self) -> Option<&UserDeviceKeysContent> {
        match self {
            ContentView::UserDeviceKeys(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_user_inbox(&self) -> Option<&UserInboxContent> {
        match self {
            ContentView::UserInbox(c) => Some(c),
            _ => None,
        }
    }
}

pub(crate) fn unexpected_payload(kind: StreamKind, event: &StreamTimelineEvent) -> RiverError {
    let case = event.payload().map(|p| p.case_name()).unwrap_or("none");
    RiverError::new(
        ErrCode::StreamBadEvent,
        format!("unexpected {} payload in {} stream (event {})", case, kind, event.hash_str),
    )
}

pub(crate) fn unexpected_snapshot(kind: StreamKind) -> RiverError {
    RiverError::new(ErrCode::StreamBadEvent, format!("snapshot content does not match {} stream", kind))
}

pub(crate) fn stream_id_of(bytes: &[u8]) -> Result<StreamId, RiverError> {
    Ok(StreamId::from_bytes(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_per_kind() {
        for kind in StreamKind::ALL {
            let view = ContentView::new(StreamId::random(kind));
            assert_eq!(view.kind(), kind);
        }
    }
}
