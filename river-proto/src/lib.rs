//! Protobuf definitions for the River stream protocol

pub mod err;
pub mod protocol;

pub use err::ErrCode;
pub use protocol::*;

impl stream_event::Payload {
    /// Oneof case name, as used in logs and error messages.
    pub fn case_name(&self) -> &'static str {
        match self {
            stream_event::Payload::MiniblockHeader(_) => "miniblockHeader",
            stream_event::Payload::MemberPayload(_) => "memberPayload",
            stream_event::Payload::SpacePayload(_) => "spacePayload",
            stream_event::Payload::ChannelPayload(_) => "channelPayload",
            stream_event::Payload::UserPayload(_) => "userPayload",
            stream_event::Payload::UserSettingsPayload(_) => "userSettingsPayload",
            stream_event::Payload::UserDeviceKeyPayload(_) => "userDeviceKeyPayload",
            stream_event::Payload::UserInboxPayload(_) => "userInboxPayload",
            stream_event::Payload::MediaPayload(_) => "mediaPayload",
            stream_event::Payload::DmChannelPayload(_) => "dmChannelPayload",
            stream_event::Payload::GdmChannelPayload(_) => "gdmChannelPayload",
        }
    }
}

impl StreamEvent {
    pub fn payload_case(&self) -> &'static str {
        self.payload.as_ref().map_or("none", |p| p.case_name())
    }

    pub fn miniblock_header(&self) -> Option<&MiniblockHeader> {
        match &self.payload {
            Some(stream_event::Payload::MiniblockHeader(h)) => Some(h),
            _ => None,
        }
    }

    pub fn member_content(&self) -> Option<&member_payload::Content> {
        match &self.payload {
            Some(stream_event::Payload::MemberPayload(m)) => m.content.as_ref(),
            _ => None,
        }
    }
}

impl Timestamp {
    pub fn from_millis(ms: i64) -> Self {
        Self {
            seconds: ms.div_euclid(1000),
            nanos: (ms.rem_euclid(1000) * 1_000_000) as i32,
        }
    }

    pub fn as_millis(&self) -> i64 {
        self.seconds * 1000 + i64::from(self.nanos) / 1_000_000
    }
}

impl MemberPayload {
    pub fn membership(
        op: MembershipOp,
        user_address: impl Into<Vec<u8>>,
        initiator_address: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            content: Some(member_payload::Content::Membership(member_payload::Membership {
                op: op as i32,
                user_address: user_address.into(),
                initiator_address: initiator_address.into(),
                stream_parent_id: None,
            })),
        }
    }

    pub fn key_solicitation(solicitation: member_payload::KeySolicitation) -> Self {
        Self { content: Some(member_payload::Content::KeySolicitation(solicitation)) }
    }

    pub fn key_fulfillment(fulfillment: member_payload::KeyFulfillment) -> Self {
        Self { content: Some(member_payload::Content::KeyFulfillment(fulfillment)) }
    }
}

impl From<MemberPayload> for stream_event::Payload {
    fn from(p: MemberPayload) -> Self {
        stream_event::Payload::MemberPayload(p)
    }
}

impl From<ChannelPayload> for stream_event::Payload {
    fn from(p: ChannelPayload) -> Self {
        stream_event::Payload::ChannelPayload(p)
    }
}

impl From<SpacePayload> for stream_event::Payload {
    fn from(p: SpacePayload) -> Self {
        stream_event::Payload::SpacePayload(p)
    }
}

impl From<UserPayload> for stream_event::Payload {
    fn from(p: UserPayload) -> Self {
        stream_event::Payload::UserPayload(p)
    }
}

impl From<UserInboxPayload> for stream_event::Payload {
    fn from(p: UserInboxPayload) -> Self {
        stream_event::Payload::UserInboxPayload(p)
    }
}

impl From<MiniblockHeader> for stream_event::Payload {
    fn from(h: MiniblockHeader) -> Self {
        stream_event::Payload::MiniblockHeader(h)
    }
}

impl ChannelPayload {
    pub fn message(data: EncryptedData) -> Self {
        Self { content: Some(channel_payload::Content::Message(data)) }
    }
}

impl ChannelMessage {
    /// A plain text post.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            payload: Some(channel_message::Payload::Post(channel_message::Post {
                content: Some(channel_message::post::Content::Text(
                    channel_message::post::Text { body: body.into() },
                )),
                ..Default::default()
            })),
        }
    }

    /// Event id this message refers to (reactions, edits, redactions, replies).
    pub fn ref_event_id(&self) -> Option<&str> {
        match self.payload.as_ref()? {
            channel_message::Payload::Post(p) => p.reply_id.as_deref(),
            channel_message::Payload::Reaction(r) => Some(&r.ref_event_id),
            channel_message::Payload::Edit(e) => Some(&e.ref_event_id),
            channel_message::Payload::Redaction(r) => Some(&r.ref_event_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_stream_event_payload_tags() {
        let event = StreamEvent {
            creator_address: vec![1; 20],
            payload: Some(MemberPayload::membership(MembershipOp::SoJoin, vec![1; 20], vec![1; 20]).into()),
            ..Default::default()
        };
        let decoded = StreamEvent::decode(event.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.payload_case(), "memberPayload");
        assert!(decoded.miniblock_header().is_none());
    }

    #[test]
    fn test_timestamp_millis() {
        let ts = Timestamp::from_millis(1_700_000_000_123);
        assert_eq!(ts.seconds, 1_700_000_000);
        assert_eq!(ts.nanos, 123_000_000);
        assert_eq!(ts.as_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_json_uses_snake_case_oneofs() {
        let msg = ChannelMessage::text("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"post\""));
        assert!(json.contains("\"text\""));
        let back: ChannelMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
