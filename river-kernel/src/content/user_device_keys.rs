use super::{unexpected_payload, unexpected_snapshot, ContentProjection};
use crate::error::RiverError;
use crate::notify::{EncryptionEvent, Notifier};
use crate::timeline::StreamTimelineEvent;
use river_model::crypto::user_id_from_address;
use river_model::{StreamId, StreamKind};
use river_proto::user_device_key_payload::{self, EncryptionDevice};
use river_proto::{snapshot, stream_event, Snapshot};

/// Published encryption devices of one user, newest last.
#[derive(Debug, Clone)]
pub struct UserDeviceKeysContent {
    pub stream_id: StreamId,
    pub devices: Vec<EncryptionDevice>,
}

impl UserDeviceKeysContent {
    pub fn new(stream_id: StreamId) -> Self {
        Self { stream_id, devices: Vec::new() }
    }

    fn user_id(&self) -> String {
        self.stream_id.user_address().map(|a| user_id_from_address(&a)).unwrap_or_default()
    }

    fn add_device(&mut self, device: &EncryptionDevice) {
        self.devices.retain(|d| d.device_key != device.device_key);
        self.devices.push(device.clone());
    }

    fn notify(&self, notifier: &Notifier) {
        notifier.encryption(EncryptionEvent::UserDeviceKeysUpdated {
            stream_id: self.stream_id,
            user_id: self.user_id(),
            devices: self.devices.clone(),
        });
    }
}

impl ContentProjection for UserDeviceKeysContent {
    fn apply_snapshot(&mut self, _event_id: &str, snapshot: &Snapshot, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(snapshot::Content::UserDeviceKeyContent(content)) = &snapshot.content else {
            return Err(unexpected_snapshot(StreamKind::UserDeviceKeys));
        };
        for device in &content.encryption_devices {
            self.add_device(device);
        }
        self.notify(notifier);
        Ok(())
    }

    fn append_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::UserDeviceKeyPayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::UserDeviceKeys, event));
        };
        if let Some(user_device_key_payload::Content::EncryptionDevice(device)) = &payload.content {
            self.add_device(device);
            self.notify(notifier);
        }
        Ok(())
    }

    fn prepend_event(&mut self, event: &StreamTimelineEvent, _notifier: &Notifier) -> Result<(), RiverError> {
        match event.payload() {
            Some(stream_event::Payload::UserDeviceKeyPayload(_)) => Ok(()),
            _ => Err(unexpected_payload(StreamKind::UserDeviceKeys, event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(key: &str, fallback: &str) -> EncryptionDevice {
        EncryptionDevice { device_key: key.into(), fallback_key: fallback.into() }
    }

    #[test]
    fn test_republished_device_moves_last() {
        let mut keys = UserDeviceKeysContent::new(StreamId::random(StreamKind::UserDeviceKeys));
        keys.add_device(&device("a", "1"));
        keys.add_device(&device("b", "1"));
        keys.add_device(&device("a", "2"));
        let order: Vec<&str> = keys.devices.iter().map(|d| d.device_key.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(keys.devices[1].fallback_key, "2");
    }
}
