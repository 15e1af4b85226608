use river_model::{CryptoError, StreamIdError};
use river_proto::ErrCode;
use thiserror::Error;

/// Protocol-coded failure. Renders as `<num>:<NAME> <message>`, the same
/// shape nodes use, so one substring classifier covers local and remote errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} {message}", code.tag())]
pub struct RiverError {
    pub code: ErrCode,
    pub message: String,
}

impl RiverError {
    pub fn new(code: ErrCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// True when the error text carries `code`'s `<num>:<NAME>` tag.
    pub fn contains(err: &dyn std::error::Error, code: ErrCode) -> bool {
        err.to_string().contains(&code.tag())
    }
}

impl From<prost::DecodeError> for RiverError {
    fn from(e: prost::DecodeError) -> Self {
        RiverError::new(ErrCode::BadEvent, format!("decode failed: {}", e))
    }
}

impl From<StreamIdError> for RiverError {
    fn from(e: StreamIdError) -> Self {
        RiverError::new(ErrCode::BadStreamId, e.to_string())
    }
}

impl From<CryptoError> for RiverError {
    fn from(e: CryptoError) -> Self {
        let code = match e {
            CryptoError::InvalidHashLength(_) => ErrCode::BadHashFormat,
            CryptoError::InvalidPublicKey(_) => ErrCode::BadPublicKey,
            CryptoError::InvalidAddress(_) => ErrCode::BadAddress,
            CryptoError::DelegateMismatch | CryptoError::DelegateExpired { .. } => {
                ErrCode::BadDelegateSig
            }
            CryptoError::InvalidSignatureLength(_)
            | CryptoError::InvalidSignature
            | CryptoError::InvalidExpiry(_) => ErrCode::BadEventSignature,
        };
        RiverError::new(code, e.to_string())
    }
}

/// Shorthand for `Err(RiverError)` when `cond` does not hold.
pub(crate) fn check(cond: bool, code: ErrCode, msg: impl FnOnce() -> String) -> Result<(), RiverError> {
    if cond {
        Ok(())
    } else {
        Err(RiverError::new(code, msg()))
    }
}

/// Errors from a stream actor handle.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Channel closed")]
    ChannelClosed,

    #[error(transparent)]
    River(#[from] RiverError),
}

impl StreamError {
    pub fn code(&self) -> Option<ErrCode> {
        match self {
            StreamError::River(e) => Some(e.code),
            StreamError::ChannelClosed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code_tag() {
        let err = RiverError::new(ErrCode::BadEventId, "hash mismatch");
        assert_eq!(err.to_string(), "21:BAD_EVENT_ID hash mismatch");
        assert!(RiverError::contains(&err, ErrCode::BadEventId));
        assert!(!RiverError::contains(&err, ErrCode::BadEvent));
    }

    #[test]
    fn test_delegate_expiry_maps_to_delegate_code() {
        let err: RiverError = CryptoError::DelegateExpired { expiry_epoch_ms: 1, now_ms: 2 }.into();
        assert_eq!(err.code, ErrCode::BadDelegateSig);
        assert!(err.to_string().contains("event delegate has expired"));
    }
}
