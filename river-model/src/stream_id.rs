//! Stream identifiers
//!
//! A stream id is 32 bytes. The first byte selects the stream kind; the
//! rest is an identity (a 20-byte address for user-scoped and space streams,
//! 31 bytes otherwise) padded with zeros.

use crate::crypto::{keccak256, user_id_from_address};
use crate::types::Address;
use std::fmt;
use thiserror::Error;

pub const STREAM_ID_LEN: usize = 32;

/// Closed set of stream kinds, keyed by the id's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKind {
    Space,
    Channel,
    Media,
    Dm,
    Gdm,
    User,
    UserDeviceKeys,
    UserInbox,
    UserSettings,
}

impl StreamKind {
    pub const ALL: [StreamKind; 9] = [
        StreamKind::Space,
        StreamKind::Channel,
        StreamKind::Media,
        StreamKind::Dm,
        StreamKind::Gdm,
        StreamKind::User,
        StreamKind::UserDeviceKeys,
        StreamKind::UserInbox,
        StreamKind::UserSettings,
    ];

    pub const fn prefix(self) -> u8 {
        match self {
            StreamKind::Space => 0x10,
            StreamKind::Channel => 0x20,
            StreamKind::Media => 0xff,
            StreamKind::Dm => 0x88,
            StreamKind::Gdm => 0x77,
            StreamKind::User => 0xa8,
            StreamKind::UserDeviceKeys => 0xad,
            StreamKind::UserInbox => 0xa1,
            StreamKind::UserSettings => 0xa5,
        }
    }

    pub fn from_prefix(prefix: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.prefix() == prefix)
    }

    /// Number of meaningful identity bytes after the prefix; the rest must be zero.
    pub const fn identity_len(self) -> usize {
        match self {
            StreamKind::Space
            | StreamKind::User
            | StreamKind::UserDeviceKeys
            | StreamKind::UserInbox
            | StreamKind::UserSettings => 20,
            StreamKind::Channel | StreamKind::Media | StreamKind::Dm | StreamKind::Gdm => 31,
        }
    }

    pub const fn is_user_scoped(self) -> bool {
        matches!(
            self,
            StreamKind::User
                | StreamKind::UserDeviceKeys
                | StreamKind::UserInbox
                | StreamKind::UserSettings
        )
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamKind::Space => "space",
            StreamKind::Channel => "channel",
            StreamKind::Media => "media",
            StreamKind::Dm => "dm",
            StreamKind::Gdm => "gdm",
            StreamKind::User => "user",
            StreamKind::UserDeviceKeys => "user_device_keys",
            StreamKind::UserInbox => "user_inbox",
            StreamKind::UserSettings => "user_settings",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamIdError {
    #[error("invalid stream id length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("unknown stream id prefix: {0:02x}")]
    UnknownPrefix(u8),

    #[error("stream id padding is not zero")]
    BadPadding,

    #[error("invalid hex: {0}")]
    Hex(String),

    #[error("stream {0} is not a {1} stream")]
    WrongKind(String, StreamKind),
}

/// Validated 32-byte stream id. Construction rejects unknown prefixes, so
/// `kind()` is total.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId {
    bytes: [u8; STREAM_ID_LEN],
    kind: StreamKind,
}

impl StreamId {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StreamIdError> {
        let arr: [u8; STREAM_ID_LEN] = bytes
            .try_into()
            .map_err(|_| StreamIdError::InvalidLength(bytes.len()))?;
        let kind = StreamKind::from_prefix(arr[0]).ok_or(StreamIdError::UnknownPrefix(arr[0]))?;
        if arr[1 + kind.identity_len()..].iter().any(|b| *b != 0) {
            return Err(StreamIdError::BadPadding);
        }
        Ok(Self { bytes: arr, kind })
    }

    pub fn from_hex(s: &str) -> Result<Self, StreamIdError> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| StreamIdError::Hex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Build an id from a kind and identity; the identity is truncated or
    /// zero-padded to the kind's identity length.
    pub fn new(kind: StreamKind, identity: &[u8]) -> Self {
        let mut arr = [0u8; STREAM_ID_LEN];
        arr[0] = kind.prefix();
        let n = identity.len().min(kind.identity_len());
        arr[1..1 + n].copy_from_slice(&identity[..n]);
        Self { bytes: arr, kind }
    }

    pub fn for_user(kind: StreamKind, address: &Address) -> Result<Self, StreamIdError> {
        if !kind.is_user_scoped() {
            return Err(StreamIdError::WrongKind(user_id_from_address(address), kind));
        }
        Ok(Self::new(kind, address.as_bytes()))
    }

    pub fn random(kind: StreamKind) -> Self {
        use rand::RngCore;
        let mut identity = [0u8; 31];
        rand::rngs::OsRng.fill_bytes(&mut identity);
        Self::new(kind, &identity)
    }

    pub fn space(contract_address: &Address) -> Self {
        Self::new(StreamKind::Space, contract_address.as_bytes())
    }

    /// A channel under `space` with a random 11-byte suffix.
    pub fn unique_channel(space: &StreamId) -> Self {
        use rand::RngCore;
        let mut identity = [0u8; 31];
        identity[..20].copy_from_slice(&space.bytes[1..21]);
        rand::rngs::OsRng.fill_bytes(&mut identity[20..]);
        Self::new(StreamKind::Channel, &identity)
    }

    /// The space's default channel: same identity with the channel prefix.
    pub fn default_channel(space: &StreamId) -> Result<Self, StreamIdError> {
        if space.kind() != StreamKind::Space {
            return Err(StreamIdError::WrongKind(space.to_string(), StreamKind::Space));
        }
        Ok(Self::new(StreamKind::Channel, &space.bytes[1..]))
    }

    pub fn is_default_channel(&self) -> bool {
        self.kind == StreamKind::Channel && self.bytes[21..].iter().all(|b| *b == 0)
    }

    pub fn space_of_channel(&self) -> Result<Self, StreamIdError> {
        if self.kind() != StreamKind::Channel {
            return Err(StreamIdError::WrongKind(self.to_string(), StreamKind::Channel));
        }
        Ok(Self::new(StreamKind::Space, &self.bytes[1..21]))
    }

    /// DM stream id: hash of the two lowercase user ids, sorted and joined by `-`.
    pub fn dm(user_a: &str, user_b: &str) -> Self {
        let mut ids = [user_a.to_lowercase(), user_b.to_lowercase()];
        ids.sort();
        let digest = keccak256(ids.join("-").as_bytes());
        Self::new(StreamKind::Dm, &digest[..31])
    }

    /// Address embedded in a user-scoped stream id.
    pub fn user_address(&self) -> Option<Address> {
        if !self.kind().is_user_scoped() {
            return None;
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.bytes[1..21]);
        Some(Address(out))
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8; STREAM_ID_LEN] {
        &self.bytes
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

impl TryFrom<&[u8]> for StreamId {
    type Error = StreamIdError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl std::str::FromStr for StreamId {
    type Err = StreamIdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_round_trip() {
        for kind in StreamKind::ALL {
            let id = StreamId::random(kind);
            assert_eq!(id.kind(), kind);
            assert_eq!(StreamId::from_hex(&id.to_string()).unwrap(), id);
        }
    }

    #[test]
    fn test_unknown_prefix_is_rejected() {
        let mut raw = [0u8; 32];
        raw[0] = 0x42;
        assert_eq!(StreamId::from_bytes(&raw), Err(StreamIdError::UnknownPrefix(0x42)));
        assert_eq!(StreamId::from_bytes(&raw[..10]), Err(StreamIdError::InvalidLength(10)));
    }

    #[test]
    fn test_user_stream_padding() {
        let addr = Address([0x11; 20]);
        let id = StreamId::for_user(StreamKind::UserInbox, &addr).unwrap();
        assert!(id.to_string().starts_with("a1"));
        assert!(id.to_string().ends_with(&"0".repeat(22)));
        assert_eq!(id.user_address(), Some(addr));

        let mut raw = id.to_vec();
        raw[31] = 1;
        assert_eq!(StreamId::from_bytes(&raw), Err(StreamIdError::BadPadding));
    }

    #[test]
    fn test_default_channel() {
        let space = StreamId::space(&Address([0x22; 20]));
        let channel = StreamId::default_channel(&space).unwrap();
        assert_eq!(channel.kind(), StreamKind::Channel);
        assert!(channel.is_default_channel());
        assert_eq!(channel.space_of_channel().unwrap(), space);
        assert!(!StreamId::unique_channel(&space).is_default_channel());
    }

    #[test]
    fn test_dm_id_is_symmetric() {
        let a = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let b = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
        assert_eq!(StreamId::dm(a, b), StreamId::dm(b, a));
        assert_eq!(StreamId::dm(a, b).kind(), StreamKind::Dm);
    }
}
