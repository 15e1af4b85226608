//! Protocol error codes.
//!
//! Nodes render a code as `<num>:<NAME>` inside error text; clients match on
//! that substring to classify failures.

macro_rules! define_err_codes {
    ($($variant:ident = $num:literal => $name:literal,)*) => {
        /// Wire enum `river.Err`.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum ErrCode {
            $($variant = $num,)*
        }

        impl ErrCode {
            /// Name as it appears in the protobuf definition.
            pub fn as_str_name(&self) -> &'static str {
                match self {
                    $(ErrCode::$variant => $name,)*
                }
            }

            pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
                match value {
                    $($name => ::core::option::Option::Some(ErrCode::$variant),)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };
}

define_err_codes! {
    Unspecified = 0 => "ERR_UNSPECIFIED",
    Canceled = 1 => "CANCELED",
    Unknown = 2 => "UNKNOWN",
    InvalidArgument = 3 => "INVALID_ARGUMENT",
    DeadlineExceeded = 4 => "DEADLINE_EXCEEDED",
    NotFound = 5 => "NOT_FOUND",
    AlreadyExists = 6 => "ALREADY_EXISTS",
    PermissionDenied = 7 => "PERMISSION_DENIED",
    ResourceExhausted = 8 => "RESOURCE_EXHAUSTED",
    FailedPrecondition = 9 => "FAILED_PRECONDITION",
    Aborted = 10 => "ABORTED",
    OutOfRange = 11 => "OUT_OF_RANGE",
    Unimplemented = 12 => "UNIMPLEMENTED",
    Internal = 13 => "INTERNAL",
    Unavailable = 14 => "UNAVAILABLE",
    DataLoss = 15 => "DATA_LOSS",
    Unauthenticated = 16 => "UNAUTHENTICATED",
    DebugError = 17 => "DEBUG_ERROR",
    BadStreamId = 18 => "BAD_STREAM_ID",
    BadStreamCreationParams = 19 => "BAD_STREAM_CREATION_PARAMS",
    InternalErrorSwitch = 20 => "INTERNAL_ERROR_SWITCH",
    BadEventId = 21 => "BAD_EVENT_ID",
    BadEventSignature = 22 => "BAD_EVENT_SIGNATURE",
    BadHashFormat = 23 => "BAD_HASH_FORMAT",
    BadPrevMiniblockHash = 24 => "BAD_PREV_MINIBLOCK_HASH",
    NoEventSpecified = 25 => "NO_EVENT_SPECIFIED",
    BadEvent = 26 => "BAD_EVENT",
    UserCantPost = 27 => "USER_CANT_POST",
    StreamBadHashes = 28 => "STREAM_BAD_HASHES",
    StreamEmpty = 29 => "STREAM_EMPTY",
    StreamBadEvent = 30 => "STREAM_BAD_EVENT",
    BadDelegateSig = 31 => "BAD_DELEGATE_SIG",
    BadPublicKey = 32 => "BAD_PUBLIC_KEY",
    BadPayload = 33 => "BAD_PAYLOAD",
    BadHexString = 34 => "BAD_HEX_STRING",
    BadEventHash = 35 => "BAD_EVENT_HASH",
    BadSyncCookie = 36 => "BAD_SYNC_COOKIE",
    DuplicateEvent = 37 => "DUPLICATE_EVENT",
    BadBlock = 38 => "BAD_BLOCK",
    StreamNoInceptionEvent = 39 => "STREAM_NO_INCEPTION_EVENT",
    BadBlockNumber = 40 => "BAD_BLOCK_NUMBER",
    BadMinipoolSlot = 41 => "BAD_MINIPOOL_SLOT",
    BadCreatorAddress = 42 => "BAD_CREATOR_ADDRESS",
    StaleDelegate = 43 => "STALE_DELEGATE",
    BadLinkWalletBadSignature = 44 => "BAD_LINK_WALLET_BAD_SIGNATURE",
    BadRootKeyId = 45 => "BAD_ROOT_KEY_ID",
    UnknownNode = 46 => "UNKNOWN_NODE",
    DbOperationFailure = 47 => "DB_OPERATION_FAILURE",
    MiniblocksStorageFailure = 48 => "MINIBLOCKS_STORAGE_FAILURE",
    BadAddress = 49 => "BAD_ADDRESS",
    BufferFull = 50 => "BUFFER_FULL",
    BadConfig = 51 => "BAD_CONFIG",
    BadContract = 52 => "BAD_CONTRACT",
    CannotConnect = 53 => "CANNOT_CONNECT",
    CannotGetLinkedWallets = 54 => "CANNOT_GET_LINKED_WALLETS",
    CannotCheckEntitlements = 55 => "CANNOT_CHECK_ENTITLEMENTS",
    CannotCallContract = 56 => "CANNOT_CALL_CONTRACT",
    SpaceDisabled = 57 => "SPACE_DISABLED",
    ChannelDisabled = 58 => "CHANNEL_DISABLED",
    WrongStreamType = 59 => "WRONG_STREAM_TYPE",
    MinipoolMissingEvents = 60 => "MINIPOOL_MISSING_EVENTS",
    StreamLastBlockMismatch = 61 => "STREAM_LAST_BLOCK_MISMATCH",
    DownstreamNetworkError = 62 => "DOWNSTREAM_NETWORK_ERROR",
}

impl ErrCode {
    /// `<num>:<NAME>`, the form embedded in error messages.
    pub fn tag(&self) -> String {
        format!("{}:{}", *self as i32, self.as_str_name())
    }
}

impl std::fmt::Display for ErrCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_format() {
        assert_eq!(ErrCode::ResourceExhausted.tag(), "8:RESOURCE_EXHAUSTED");
        assert_eq!(ErrCode::DbOperationFailure.to_string(), "47:DB_OPERATION_FAILURE");
    }

    #[test]
    fn test_name_round_trip() {
        assert_eq!(ErrCode::from_str_name("BAD_DELEGATE_SIG"), Some(ErrCode::BadDelegateSig));
        assert_eq!(ErrCode::from_str_name("NOPE"), None);
        assert_eq!(ErrCode::try_from(62).ok(), Some(ErrCode::DownstreamNetworkError));
    }
}
