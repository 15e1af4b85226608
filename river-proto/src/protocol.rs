// Wire types for package `river`, laid out the way prost-build emits them.
// Field tags follow protocol.proto; serde derives back the JSON debug wire.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Well-known types
// ---------------------------------------------------------------------------

/// Wire-compatible with `google.protobuf.Empty`.
#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Empty {}

/// Wire-compatible with `google.protobuf.Timestamp`.
#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

// ---------------------------------------------------------------------------
// Envelopes, events and miniblocks
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Miniblock {
    #[prost(message, repeated, tag = "1")]
    pub events: ::prost::alloc::vec::Vec<Envelope>,
    #[prost(message, optional, tag = "2")]
    pub header: ::core::option::Option<Envelope>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    #[prost(bytes = "vec", tag = "1")]
    pub hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub event: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamEvent {
    #[prost(bytes = "vec", tag = "1")]
    pub creator_address: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub delegate_sig: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub salt: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub prev_miniblock_hash: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(int64, tag = "5")]
    pub created_at_epoch_ms: i64,
    #[prost(int64, tag = "6")]
    pub delegate_expiry_epoch_ms: i64,
    #[prost(
        oneof = "stream_event::Payload",
        tags = "100, 101, 102, 103, 104, 105, 106, 107, 108, 109, 110"
    )]
    pub payload: ::core::option::Option<stream_event::Payload>,
}

pub mod stream_event {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Payload {
        #[prost(message, tag = "100")]
        MiniblockHeader(super::MiniblockHeader),
        #[prost(message, tag = "101")]
        MemberPayload(super::MemberPayload),
        #[prost(message, tag = "102")]
        SpacePayload(super::SpacePayload),
        #[prost(message, tag = "103")]
        ChannelPayload(super::ChannelPayload),
        #[prost(message, tag = "104")]
        UserPayload(super::UserPayload),
        #[prost(message, tag = "105")]
        UserSettingsPayload(super::UserSettingsPayload),
        #[prost(message, tag = "106")]
        UserDeviceKeyPayload(super::UserDeviceKeyPayload),
        #[prost(message, tag = "107")]
        UserInboxPayload(super::UserInboxPayload),
        #[prost(message, tag = "108")]
        MediaPayload(super::MediaPayload),
        #[prost(message, tag = "109")]
        DmChannelPayload(super::DmChannelPayload),
        #[prost(message, tag = "110")]
        GdmChannelPayload(super::GdmChannelPayload),
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniblockHeader {
    #[prost(int64, tag = "1")]
    pub miniblock_num: i64,
    #[prost(bytes = "vec", tag = "2")]
    pub prev_miniblock_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub timestamp: ::core::option::Option<Timestamp>,
    #[prost(bytes = "vec", repeated, tag = "4")]
    pub event_hashes: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(message, optional, tag = "5")]
    pub snapshot: ::core::option::Option<Snapshot>,
    #[prost(int64, tag = "6")]
    pub event_num_offset: i64,
    #[prost(int64, tag = "7")]
    pub prev_snapshot_miniblock_num: i64,
    #[prost(oneof = "miniblock_header::Content", tags = "100")]
    pub content: ::core::option::Option<miniblock_header::Content>,
}

pub mod miniblock_header {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "100")]
        None(super::Empty),
    }
}

// ---------------------------------------------------------------------------
// Member payload (shared by every stream kind)
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberPayload {
    #[prost(oneof = "member_payload::Content", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub content: ::core::option::Option<member_payload::Content>,
}

pub mod member_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, repeated, tag = "1")]
        pub joined: ::prost::alloc::vec::Vec<snapshot::Member>,
    }

    pub mod snapshot {
        use serde::{Deserialize, Serialize};

        #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
        #[serde(default)]
        pub struct Member {
            #[prost(bytes = "vec", tag = "1")]
            pub user_address: ::prost::alloc::vec::Vec<u8>,
            #[prost(int64, tag = "2")]
            pub miniblock_num: i64,
            #[prost(int64, tag = "3")]
            pub event_num: i64,
            #[prost(message, repeated, tag = "4")]
            pub solicitations: ::prost::alloc::vec::Vec<super::KeySolicitation>,
            #[prost(message, optional, tag = "5")]
            pub username: ::core::option::Option<super::super::WrappedEncryptedData>,
            #[prost(message, optional, tag = "6")]
            pub display_name: ::core::option::Option<super::super::WrappedEncryptedData>,
            #[prost(bytes = "vec", tag = "7")]
            pub ens_address: ::prost::alloc::vec::Vec<u8>,
            #[prost(message, optional, tag = "8")]
            pub nft: ::core::option::Option<super::Nft>,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Membership {
        #[prost(enumeration = "super::MembershipOp", tag = "1")]
        pub op: i32,
        #[prost(bytes = "vec", tag = "2")]
        pub user_address: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", tag = "3")]
        pub initiator_address: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", optional, tag = "4")]
        pub stream_parent_id: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct KeySolicitation {
        #[prost(string, tag = "1")]
        pub device_key: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub fallback_key: ::prost::alloc::string::String,
        #[prost(bool, tag = "3")]
        pub is_new_device: bool,
        #[prost(string, repeated, tag = "4")]
        pub session_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct KeyFulfillment {
        #[prost(bytes = "vec", tag = "1")]
        pub user_address: ::prost::alloc::vec::Vec<u8>,
        #[prost(string, tag = "2")]
        pub device_key: ::prost::alloc::string::String,
        #[prost(string, repeated, tag = "3")]
        pub session_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Nft {
        #[prost(int32, tag = "1")]
        pub chain_id: i32,
        #[prost(bytes = "vec", tag = "2")]
        pub contract_address: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", tag = "3")]
        pub token_id: ::prost::alloc::vec::Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Membership(Membership),
        #[prost(message, tag = "2")]
        KeySolicitation(KeySolicitation),
        #[prost(message, tag = "3")]
        KeyFulfillment(KeyFulfillment),
        #[prost(message, tag = "4")]
        Username(super::EncryptedData),
        #[prost(message, tag = "5")]
        DisplayName(super::EncryptedData),
        #[prost(bytes, tag = "6")]
        EnsAddress(::prost::alloc::vec::Vec<u8>),
        #[prost(message, tag = "7")]
        Nft(Nft),
    }
}

// ---------------------------------------------------------------------------
// Space
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacePayload {
    #[prost(oneof = "space_payload::Content", tags = "1, 2")]
    pub content: ::core::option::Option<space_payload::Content>,
}

pub mod space_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub inception: ::core::option::Option<Inception>,
        #[prost(message, repeated, tag = "2")]
        pub channels: ::prost::alloc::vec::Vec<ChannelMetadata>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Inception {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "2")]
        pub settings: ::core::option::Option<super::StreamSettings>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ChannelMetadata {
        #[prost(enumeration = "super::ChannelOp", tag = "1")]
        pub op: i32,
        #[prost(bytes = "vec", tag = "2")]
        pub channel_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "3")]
        pub origin_event: ::core::option::Option<super::EventRef>,
        #[prost(int64, tag = "6")]
        pub updated_at_event_num: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ChannelUpdate {
        #[prost(enumeration = "super::ChannelOp", tag = "1")]
        pub op: i32,
        #[prost(bytes = "vec", tag = "2")]
        pub channel_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "3")]
        pub origin_event: ::core::option::Option<super::EventRef>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Inception(Inception),
        #[prost(message, tag = "2")]
        Channel(ChannelUpdate),
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelPayload {
    #[prost(oneof = "channel_payload::Content", tags = "1, 2, 3")]
    pub content: ::core::option::Option<channel_payload::Content>,
}

pub mod channel_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub inception: ::core::option::Option<Inception>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Inception {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", tag = "3")]
        pub space_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "5")]
        pub settings: ::core::option::Option<super::StreamSettings>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Redaction {
        #[prost(bytes = "vec", tag = "1")]
        pub event_id: ::prost::alloc::vec::Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Inception(Inception),
        #[prost(message, tag = "2")]
        Message(super::EncryptedData),
        #[prost(message, tag = "3")]
        Redaction(Redaction),
    }
}

// ---------------------------------------------------------------------------
// DM / group DM
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct DmChannelPayload {
    #[prost(oneof = "dm_channel_payload::Content", tags = "1, 3")]
    pub content: ::core::option::Option<dm_channel_payload::Content>,
}

pub mod dm_channel_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub inception: ::core::option::Option<Inception>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Inception {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        pub first_party_address: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", tag = "3")]
        pub second_party_address: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "4")]
        pub settings: ::core::option::Option<super::StreamSettings>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Inception(Inception),
        #[prost(message, tag = "3")]
        Message(super::EncryptedData),
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GdmChannelPayload {
    #[prost(oneof = "gdm_channel_payload::Content", tags = "1, 2, 3")]
    pub content: ::core::option::Option<gdm_channel_payload::Content>,
}

pub mod gdm_channel_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub inception: ::core::option::Option<Inception>,
        #[prost(message, optional, tag = "2")]
        pub channel_properties: ::core::option::Option<super::WrappedEncryptedData>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Inception {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "2")]
        pub channel_properties: ::core::option::Option<super::EncryptedData>,
        #[prost(message, optional, tag = "3")]
        pub settings: ::core::option::Option<super::StreamSettings>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Inception(Inception),
        #[prost(message, tag = "2")]
        Message(super::EncryptedData),
        #[prost(message, tag = "3")]
        ChannelProperties(super::EncryptedData),
    }
}

// ---------------------------------------------------------------------------
// User streams
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPayload {
    #[prost(oneof = "user_payload::Content", tags = "1, 2, 3")]
    pub content: ::core::option::Option<user_payload::Content>,
}

pub mod user_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub inception: ::core::option::Option<Inception>,
        #[prost(message, repeated, tag = "2")]
        pub memberships: ::prost::alloc::vec::Vec<UserMembership>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Inception {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "2")]
        pub settings: ::core::option::Option<super::StreamSettings>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct UserMembership {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(enumeration = "super::MembershipOp", tag = "2")]
        pub op: i32,
        #[prost(bytes = "vec", optional, tag = "3")]
        pub inviter: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
        #[prost(bytes = "vec", optional, tag = "4")]
        pub stream_parent_id: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct UserMembershipAction {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        pub user_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(enumeration = "super::MembershipOp", tag = "3")]
        pub op: i32,
        #[prost(bytes = "vec", optional, tag = "4")]
        pub stream_parent_id: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Inception(Inception),
        #[prost(message, tag = "2")]
        UserMembership(UserMembership),
        #[prost(message, tag = "3")]
        UserMembershipAction(UserMembershipAction),
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInboxPayload {
    #[prost(oneof = "user_inbox_payload::Content", tags = "1, 2, 3")]
    pub content: ::core::option::Option<user_inbox_payload::Content>,
}

pub mod user_inbox_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub inception: ::core::option::Option<Inception>,
        #[prost(map = "string, message", tag = "2")]
        pub device_summary:
            ::std::collections::HashMap<::prost::alloc::string::String, snapshot::DeviceSummary>,
    }

    pub mod snapshot {
        use serde::{Deserialize, Serialize};

        #[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
        #[serde(default)]
        pub struct DeviceSummary {
            #[prost(int64, tag = "1")]
            pub lower_bound: i64,
            #[prost(int64, tag = "2")]
            pub upper_bound: i64,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Inception {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "2")]
        pub settings: ::core::option::Option<super::StreamSettings>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct GroupEncryptionSessions {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(string, tag = "2")]
        pub sender_key: ::prost::alloc::string::String,
        #[prost(string, repeated, tag = "3")]
        pub session_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
        #[prost(map = "string, string", tag = "4")]
        pub ciphertexts: ::std::collections::HashMap<
            ::prost::alloc::string::String,
            ::prost::alloc::string::String,
        >,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Ack {
        #[prost(string, tag = "1")]
        pub device_key: ::prost::alloc::string::String,
        #[prost(int64, tag = "2")]
        pub miniblock_num: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Inception(Inception),
        #[prost(message, tag = "2")]
        Ack(Ack),
        #[prost(message, tag = "3")]
        GroupEncryptionSessions(GroupEncryptionSessions),
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettingsPayload {
    #[prost(oneof = "user_settings_payload::Content", tags = "1, 2, 3")]
    pub content: ::core::option::Option<user_settings_payload::Content>,
}

pub mod user_settings_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub inception: ::core::option::Option<Inception>,
        #[prost(message, repeated, tag = "2")]
        pub fully_read_markers: ::prost::alloc::vec::Vec<FullyReadMarkers>,
        #[prost(message, repeated, tag = "3")]
        pub user_blocks_list: ::prost::alloc::vec::Vec<snapshot::UserBlocks>,
    }

    pub mod snapshot {
        use serde::{Deserialize, Serialize};

        #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
        #[serde(default)]
        pub struct UserBlocks {
            #[prost(bytes = "vec", tag = "1")]
            pub user_id: ::prost::alloc::vec::Vec<u8>,
            #[prost(message, repeated, tag = "2")]
            pub blocks: ::prost::alloc::vec::Vec<user_blocks::Block>,
        }

        pub mod user_blocks {
            use serde::{Deserialize, Serialize};

            #[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
            #[serde(default)]
            pub struct Block {
                #[prost(bool, tag = "1")]
                pub is_blocked: bool,
                #[prost(int64, tag = "2")]
                pub event_num: i64,
            }
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Inception {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "2")]
        pub settings: ::core::option::Option<super::StreamSettings>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct MarkerContent {
        #[prost(string, tag = "1")]
        pub data: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct FullyReadMarkers {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "2")]
        pub content: ::core::option::Option<MarkerContent>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct UserBlock {
        #[prost(bytes = "vec", tag = "1")]
        pub user_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(bool, tag = "2")]
        pub is_blocked: bool,
        #[prost(int64, tag = "3")]
        pub event_num: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Inception(Inception),
        #[prost(message, tag = "2")]
        FullyReadMarkers(FullyReadMarkers),
        #[prost(message, tag = "3")]
        UserBlock(UserBlock),
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDeviceKeyPayload {
    #[prost(oneof = "user_device_key_payload::Content", tags = "1, 2")]
    pub content: ::core::option::Option<user_device_key_payload::Content>,
}

pub mod user_device_key_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub inception: ::core::option::Option<Inception>,
        #[prost(message, repeated, tag = "2")]
        pub encryption_devices: ::prost::alloc::vec::Vec<EncryptionDevice>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Inception {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "2")]
        pub settings: ::core::option::Option<super::StreamSettings>,
    }

    #[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct EncryptionDevice {
        #[prost(string, tag = "1")]
        pub device_key: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub fallback_key: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Inception(Inception),
        #[prost(message, tag = "2")]
        EncryptionDevice(EncryptionDevice),
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaPayload {
    #[prost(oneof = "media_payload::Content", tags = "1, 2")]
    pub content: ::core::option::Option<media_payload::Content>,
}

pub mod media_payload {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub inception: ::core::option::Option<Inception>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Inception {
        #[prost(bytes = "vec", tag = "1")]
        pub stream_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        pub channel_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(int32, tag = "3")]
        pub chunk_count: i32,
        #[prost(message, optional, tag = "4")]
        pub settings: ::core::option::Option<super::StreamSettings>,
        #[prost(bytes = "vec", optional, tag = "5")]
        pub space_id: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Chunk {
        #[prost(bytes = "vec", tag = "1")]
        pub data: ::prost::alloc::vec::Vec<u8>,
        #[prost(int32, tag = "2")]
        pub chunk_index: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "1")]
        Inception(Inception),
        #[prost(message, tag = "2")]
        Chunk(Chunk),
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[prost(message, optional, tag = "1")]
    pub members: ::core::option::Option<member_payload::Snapshot>,
    #[prost(int32, tag = "2")]
    pub snapshot_version: i32,
    #[prost(
        oneof = "snapshot::Content",
        tags = "101, 102, 103, 104, 105, 106, 107, 108, 109"
    )]
    pub content: ::core::option::Option<snapshot::Content>,
}

pub mod snapshot {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Content {
        #[prost(message, tag = "101")]
        SpaceContent(super::space_payload::Snapshot),
        #[prost(message, tag = "102")]
        ChannelContent(super::channel_payload::Snapshot),
        #[prost(message, tag = "103")]
        UserContent(super::user_payload::Snapshot),
        #[prost(message, tag = "104")]
        UserSettingsContent(super::user_settings_payload::Snapshot),
        #[prost(message, tag = "105")]
        UserDeviceKeyContent(super::user_device_key_payload::Snapshot),
        #[prost(message, tag = "106")]
        MediaContent(super::media_payload::Snapshot),
        #[prost(message, tag = "107")]
        DmChannelContent(super::dm_channel_payload::Snapshot),
        #[prost(message, tag = "108")]
        GdmChannelContent(super::gdm_channel_payload::Snapshot),
        #[prost(message, tag = "109")]
        UserInboxContent(super::user_inbox_payload::Snapshot),
    }
}

// ---------------------------------------------------------------------------
// Shared messages
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRef {
    #[prost(bytes = "vec", tag = "1")]
    pub stream_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub signature: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    #[prost(bool, tag = "1")]
    pub disable_miniblock_creation: bool,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptedData {
    #[prost(string, tag = "1")]
    pub ciphertext: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub algorithm: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub sender_key: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub session_id: ::prost::alloc::string::String,
    #[prost(string, optional, tag = "5")]
    pub checksum: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "6")]
    pub ref_event_id: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct WrappedEncryptedData {
    #[prost(message, optional, tag = "1")]
    pub data: ::core::option::Option<EncryptedData>,
    #[prost(int64, tag = "2")]
    pub event_num: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub event_hash: ::prost::alloc::vec::Vec<u8>,
}

// ---------------------------------------------------------------------------
// StreamService messages
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncCookie {
    #[prost(bytes = "vec", tag = "1")]
    pub node_address: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub stream_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag = "3")]
    pub minipool_gen: i64,
    #[prost(int64, tag = "4")]
    pub minipool_slot: i64,
    #[prost(bytes = "vec", tag = "5")]
    pub prev_miniblock_hash: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamAndCookie {
    #[prost(message, repeated, tag = "1")]
    pub events: ::prost::alloc::vec::Vec<Envelope>,
    #[prost(message, optional, tag = "2")]
    pub next_sync_cookie: ::core::option::Option<SyncCookie>,
    #[prost(message, repeated, tag = "3")]
    pub miniblocks: ::prost::alloc::vec::Vec<Miniblock>,
    #[prost(bool, tag = "4")]
    pub sync_reset: bool,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetStreamRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub stream_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(bool, tag = "2")]
    pub optional: bool,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetStreamResponse {
    #[prost(message, optional, tag = "1")]
    pub stream: ::core::option::Option<StreamAndCookie>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetMiniblocksRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub stream_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag = "2")]
    #[serde(rename = "fromInclusive")]
    pub from_inclusive: i64,
    #[prost(int64, tag = "3")]
    #[serde(rename = "toExclusive")]
    pub to_exclusive: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetMiniblocksResponse {
    #[prost(message, repeated, tag = "1")]
    pub miniblocks: ::prost::alloc::vec::Vec<Miniblock>,
    #[prost(bool, tag = "2")]
    pub terminus: bool,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetLastMiniblockHashRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub stream_id: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetLastMiniblockHashResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag = "2")]
    pub miniblock_num: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct AddEventRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub stream_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub event: ::core::option::Option<Envelope>,
    #[prost(bool, tag = "3")]
    pub optional: bool,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct AddEventResponse {
    #[prost(message, optional, tag = "1")]
    pub error: ::core::option::Option<add_event_response::Error>,
}

pub mod add_event_response {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Error {
        #[prost(enumeration = "crate::err::ErrCode", tag = "1")]
        pub code: i32,
        #[prost(string, tag = "2")]
        pub msg: ::prost::alloc::string::String,
        #[prost(string, repeated, tag = "3")]
        pub funcs: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncStreamsRequest {
    #[prost(message, repeated, tag = "1")]
    pub sync_pos: ::prost::alloc::vec::Vec<SyncCookie>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncStreamsResponse {
    #[prost(string, tag = "1")]
    pub sync_id: ::prost::alloc::string::String,
    #[prost(enumeration = "SyncOp", tag = "2")]
    pub sync_op: i32,
    #[prost(message, optional, tag = "3")]
    pub stream: ::core::option::Option<StreamAndCookie>,
    #[prost(string, tag = "4")]
    pub pong_nonce: ::prost::alloc::string::String,
}

// ---------------------------------------------------------------------------
// Decrypted content (never sent in the clear; lives inside EncryptedData)
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMessage {
    #[prost(oneof = "channel_message::Payload", tags = "1, 2, 3, 4")]
    pub payload: ::core::option::Option<channel_message::Payload>,
}

pub mod channel_message {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Reaction {
        #[prost(string, tag = "1")]
        pub ref_event_id: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub reaction: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Edit {
        #[prost(string, tag = "1")]
        pub ref_event_id: ::prost::alloc::string::String,
        #[prost(message, optional, tag = "2")]
        pub post: ::core::option::Option<Post>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Redaction {
        #[prost(string, tag = "1")]
        pub ref_event_id: ::prost::alloc::string::String,
        #[prost(string, optional, tag = "2")]
        pub reason: ::core::option::Option<::prost::alloc::string::String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Post {
        #[prost(string, optional, tag = "1")]
        pub thread_id: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(string, optional, tag = "2")]
        pub thread_preview: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(string, optional, tag = "3")]
        pub reply_id: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(string, optional, tag = "4")]
        pub reply_preview: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(oneof = "post::Content", tags = "101, 103")]
        pub content: ::core::option::Option<post::Content>,
    }

    pub mod post {
        use serde::{Deserialize, Serialize};

        #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
        #[serde(default)]
        pub struct Text {
            #[prost(string, tag = "1")]
            pub body: ::prost::alloc::string::String,
        }

        #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
        #[serde(default)]
        pub struct Gm {
            #[prost(string, tag = "1")]
            pub type_url: ::prost::alloc::string::String,
            #[prost(bytes = "vec", optional, tag = "2")]
            pub value: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
        }

        #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Content {
            #[prost(message, tag = "101")]
            Text(Text),
            #[prost(message, tag = "103")]
            Gm(Gm),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Payload {
        #[prost(message, tag = "1")]
        Post(Post),
        #[prost(message, tag = "2")]
        Reaction(Reaction),
        #[prost(message, tag = "3")]
        Edit(Edit),
        #[prost(message, tag = "4")]
        Redaction(Redaction),
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelProperties {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub topic: ::prost::alloc::string::String,
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SyncOp {
    SyncUnspecified = 0,
    SyncNew = 1,
    SyncClose = 2,
    SyncUpdate = 3,
    SyncPong = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum MembershipOp {
    SoUnspecified = 0,
    SoInvite = 1,
    SoJoin = 2,
    SoLeave = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ChannelOp {
    CoUnspecified = 0,
    CoCreated = 1,
    CoDeleted = 2,
    CoUpdated = 4,
}
